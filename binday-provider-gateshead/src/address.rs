//! Postcode lookup: JSONP unwrapping and address selection.

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::browser_request;
use crate::error::AddressLookupError;

/// Name of the callback the lookup endpoint wraps its JSON in.
pub const JSONP_CALLBACK: &str = "getAddresses";
const JSONP_PREFIX: &str = "getAddresses(";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Address chosen for a fetch.
pub struct AddressMatch {
    /// Unique property reference used by the schedule form.
    pub udprn: String,
    /// Human-readable address, e.g. "1 Test Street, AB1 2CD".
    pub address_text: String,
}

/// Single address object from the lookup `result` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressCandidate {
    /// First address line, usually carrying the house number or name.
    #[serde(default)]
    pub line1: Option<String>,
    /// Second address line, usually the street.
    #[serde(default)]
    pub line2: Option<String>,
    /// Postcode of the address.
    #[serde(default)]
    pub postcode: Option<String>,
    /// Property reference; the service sends it as a string but numbers are accepted too.
    #[serde(default)]
    pub udprn: Option<Value>,
}

impl AddressCandidate {
    /// Assemble `"{line1} {line2}, {postcode}"`, tidying up gaps left by empty lines.
    #[must_use]
    pub fn address_text(&self) -> String {
        let line1 = self.line1.as_deref().unwrap_or_default();
        let line2 = self.line2.as_deref().unwrap_or_default();
        let postcode = self.postcode.as_deref().unwrap_or_default();

        format!("{line1} {line2}, {postcode}")
            .trim()
            .replace(" ,", ",")
            .trim_start_matches(',')
            .trim()
            .to_owned()
    }

    fn identifier(&self) -> Option<String> {
        match self.udprn.as_ref()? {
            Value::String(udprn) if !udprn.trim().is_empty() => Some(udprn.trim().to_owned()),
            Value::Number(udprn) => Some(udprn.to_string()),
            _ => None,
        }
    }

    fn first_line_contains(&self, needle_lower: &str) -> bool {
        self.line1
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .contains(needle_lower)
    }
}

/// Query the postcode lookup endpoint and decode its candidate list.
pub(crate) async fn lookup(
    client: &Client,
    url: &str,
    postcode: &str,
) -> Result<Vec<AddressCandidate>, AddressLookupError> {
    let rpc = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "postcodeSearch",
        "params": {
            "provider": "EndPoint",
            "postcode": quote_postcode(postcode),
        },
    });

    let raw = browser_request(client.get(url).query(&[
        ("jsonrpc", rpc.to_string()),
        ("callback", JSONP_CALLBACK.to_owned()),
    ]))
    .send()
    .await?
    .error_for_status()?
    .text()
    .await?;

    let candidates = unwrap_jsonp(&raw)?;
    debug!(postcode, candidates = candidates.len(), "postcode lookup decoded");
    Ok(candidates)
}

/// The service expects the postcode inside the RPC document to be percent-quoted already.
fn quote_postcode(postcode: &str) -> String {
    postcode.trim().replace(' ', "%20")
}

/// Strip the `getAddresses(...)` wrapper and decode the `result` array.
///
/// # Errors
///
/// Returns [`AddressLookupError::EnvelopeMismatch`] when the callback wrapper is missing,
/// [`AddressLookupError::Decode`] when the payload is not valid JSON, and
/// [`AddressLookupError::MissingResult`] when there is no `result` array.
pub fn unwrap_jsonp(raw: &str) -> Result<Vec<AddressCandidate>, AddressLookupError> {
    let payload = raw
        .strip_prefix(JSONP_PREFIX)
        .ok_or(AddressLookupError::EnvelopeMismatch)?
        .trim_end()
        .trim_end_matches(';')
        .strip_suffix(')')
        .ok_or(AddressLookupError::EnvelopeMismatch)?;

    let document: Value = serde_json::from_str(payload)?;
    let result = document
        .get("result")
        .and_then(Value::as_array)
        .ok_or(AddressLookupError::MissingResult)?;

    result
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect::<Result<Vec<AddressCandidate>, _>>()
        .map_err(AddressLookupError::from)
}

/// Pick the address to fetch a schedule for.
///
/// With a house identifier, the first candidate whose first line contains it
/// (ignoring case) wins. Without one, a candidate is drawn from `rng`. A blank
/// identifier counts as absent.
///
/// # Errors
///
/// Returns [`AddressLookupError::NoMatch`] or [`AddressLookupError::NoCandidates`] when
/// nothing can be chosen, and [`AddressLookupError::MissingIdentifier`] when the chosen
/// candidate has no property reference.
pub fn select_address<R: Rng + ?Sized>(
    candidates: &[AddressCandidate],
    house_identifier: Option<&str>,
    rng: &mut R,
) -> Result<AddressMatch, AddressLookupError> {
    let house = house_identifier
        .map(str::trim)
        .filter(|house| !house.is_empty());

    let chosen = match house {
        Some(house) => {
            let needle = house.to_lowercase();
            candidates
                .iter()
                .find(|candidate| candidate.first_line_contains(&needle))
                .ok_or_else(|| AddressLookupError::NoMatch {
                    house: house.to_owned(),
                })?
        }
        None => candidates
            .choose(rng)
            .ok_or(AddressLookupError::NoCandidates)?,
    };

    let udprn = chosen
        .identifier()
        .ok_or(AddressLookupError::MissingIdentifier)?;

    Ok(AddressMatch {
        udprn,
        address_text: chosen.address_text(),
    })
}
