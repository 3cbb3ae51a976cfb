//! Submits the address search form and returns the resulting schedule page.

use reqwest::{Client, Error as ReqwestError};
use tracing::debug;

use crate::address::AddressMatch;
use crate::browser_request;
use crate::session::{FORM_SESSION_FIELD, NONCE_FIELD, PAGE_SESSION_FIELD, SessionTokens};

/// Form fields for the address search step of the bin checker workflow.
#[must_use]
pub fn form_fields(
    tokens: &SessionTokens,
    address: &AddressMatch,
    postcode: &str,
) -> Vec<(&'static str, String)> {
    vec![
        (PAGE_SESSION_FIELD, tokens.page_session_id.clone()),
        (FORM_SESSION_FIELD, tokens.form_session_id.clone()),
        (NONCE_FIELD, tokens.nonce.clone()),
        // base64 of "{}"
        ("BINCOLLECTIONCHECKER_VARIABLES", "e30=".to_owned()),
        ("BINCOLLECTIONCHECKER_PAGENAME", "ADDRESSSEARCH".to_owned()),
        ("BINCOLLECTIONCHECKER_PAGEINSTANCE", "0".to_owned()),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_ASSISTOFF", "false".to_owned()),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_ASSISTON", "true".to_owned()),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_STAFFLAYOUT", "false".to_owned()),
        (
            "BINCOLLECTIONCHECKER_ADDRESSSEARCH_ADDRESSLOOKUPPOSTCODE",
            postcode.to_owned(),
        ),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_ADDRESSLOOKUPADDRESS", String::new()),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_FIELD125", "false".to_owned()),
        ("BINCOLLECTIONCHECKER_ADDRESSSEARCH_UPRN", address.udprn.clone()),
        (
            "BINCOLLECTIONCHECKER_ADDRESSSEARCH_ADDRESSTEXT",
            address.address_text.clone(),
        ),
        (
            "BINCOLLECTIONCHECKER_FORMACTION_NEXT",
            "BINCOLLECTIONCHECKER_ADDRESSSEARCH_NEXTBUTTON".to_owned(),
        ),
    ]
}

/// Post the address search form and return the schedule HTML.
pub(crate) async fn retrieve(
    client: &Client,
    url: &str,
    tokens: &SessionTokens,
    address: &AddressMatch,
    postcode: &str,
    house_identifier: Option<&str>,
) -> Result<String, ReqwestError> {
    debug!(
        udprn = %address.udprn,
        postcode,
        house = house_identifier.unwrap_or_default(),
        "submitting address search form"
    );

    let html = browser_request(client.post(url).query(&[
        ("pageSessionId", tokens.page_session_id.as_str()),
        ("fsid", tokens.form_session_id.as_str()),
        ("fsn", tokens.nonce.as_str()),
    ]))
    .form(&form_fields(tokens, address, postcode))
    .send()
    .await?
    .error_for_status()?
    .text()
    .await?;

    debug!(bytes = html.len(), "schedule page loaded");
    Ok(html)
}
