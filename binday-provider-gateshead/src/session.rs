//! Scrapes the anti-CSRF tokens the bin checker form needs from its landing page.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::browser_request;
use crate::error::SessionError;

/// Hidden input carrying the page session id.
pub const PAGE_SESSION_FIELD: &str = "BINCOLLECTIONCHECKER_PAGESESSIONID";
/// Hidden input carrying the form session id.
pub const FORM_SESSION_FIELD: &str = "BINCOLLECTIONCHECKER_SESSIONID";
/// Hidden input carrying the form nonce.
pub const NONCE_FIELD: &str = "BINCOLLECTIONCHECKER_NONCE";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Tokens scraped from the landing page, valid for a single fetch.
pub struct SessionTokens {
    /// Page session id.
    pub page_session_id: String,
    /// Form session id.
    pub form_session_id: String,
    /// Form nonce.
    pub nonce: String,
}

/// Fetch the landing page and extract the session tokens from it.
pub(crate) async fn negotiate(client: &Client, url: &str) -> Result<SessionTokens, SessionError> {
    let html = browser_request(client.get(url))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = html.len(), "landing page loaded");

    extract_tokens(&html)
}

/// Pull the three hidden session fields out of the landing page HTML.
///
/// # Errors
///
/// Returns [`SessionError::MissingToken`] naming the first field that is absent or has no value.
pub fn extract_tokens(html: &str) -> Result<SessionTokens, SessionError> {
    let document = Html::parse_document(html);

    Ok(SessionTokens {
        page_session_id: hidden_value(&document, PAGE_SESSION_FIELD)?,
        form_session_id: hidden_value(&document, FORM_SESSION_FIELD)?,
        nonce: hidden_value(&document, NONCE_FIELD)?,
    })
}

fn hidden_value(document: &Html, field: &'static str) -> Result<String, SessionError> {
    let selector = Selector::parse(&format!(r#"input[name="{field}"]"#))
        .map_err(|err| SessionError::Selector(err.to_string()))?;

    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_owned)
        .ok_or(SessionError::MissingToken(field))
}
