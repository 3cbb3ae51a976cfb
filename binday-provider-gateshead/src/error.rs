//! Stage-level failures of the Gateshead fetch pipeline.
//!
//! These never leave the crate through [`binday_core::BinDataPort`]; the fetcher logs
//! them and reports an opaque [`PortError::FetchFailed`] instead. Selector
//! compilation failures are bugs in this crate, not in the address, and surface
//! as [`PortError::Internal`].

use binday_core::PortError;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

#[derive(thiserror::Error, Debug)]
/// Why the landing page did not yield session tokens.
pub enum SessionError {
    /// Landing page unreachable or returned a non-success status.
    #[error("landing page request failed: {0}")]
    Network(#[from] ReqwestError),
    /// A hidden form field was absent.
    #[error("hidden field `{0}` missing from landing page")]
    MissingToken(&'static str),
    /// A CSS selector failed to compile.
    #[error("invalid selector: {0}")]
    Selector(String),
}

#[derive(thiserror::Error, Debug)]
/// Why the postcode lookup did not yield an address.
pub enum AddressLookupError {
    /// Lookup endpoint unreachable or returned a non-success status.
    #[error("postcode lookup request failed: {0}")]
    Network(#[from] ReqwestError),
    /// Body is not wrapped in the expected callback.
    #[error("response is not wrapped in the expected JSONP callback")]
    EnvelopeMismatch,
    /// Body inside the callback is not valid JSON.
    #[error("could not decode JSONP payload: {0}")]
    Decode(#[from] JsonError),
    /// Decoded document has no `result` array.
    #[error("lookup response has no `result` array")]
    MissingResult,
    /// No candidate's first line contains the house identifier.
    #[error("no address matched house identifier '{house}'")]
    NoMatch {
        /// Identifier that was searched for.
        house: String,
    },
    /// The postcode has no addresses to choose from.
    #[error("no addresses found for postcode")]
    NoCandidates,
    /// The chosen candidate carries no property reference.
    #[error("selected address has no property reference")]
    MissingIdentifier,
}

#[derive(thiserror::Error, Debug)]
/// Why the schedule HTML could not be turned into records.
pub enum ScheduleParseError {
    /// A CSS selector failed to compile.
    #[error("invalid selector: {0}")]
    Selector(String),
    /// Neither the schedule table nor the empty-state message is present.
    #[error("page has neither a schedule table nor an empty-state message")]
    Unrecognised,
}

#[derive(thiserror::Error, Debug)]
/// Failure of one stage of the fetch pipeline.
pub enum GatesheadError {
    /// Session tokens could not be obtained.
    #[error("session negotiation failed: {0}")]
    SessionNegotiationFailed(#[from] SessionError),
    /// The address could not be resolved.
    #[error("address lookup failed: {0}")]
    AddressLookupFailed(#[from] AddressLookupError),
    /// The form submission failed.
    #[error("schedule retrieval failed: {0}")]
    ScheduleRetrievalFailed(#[source] ReqwestError),
    /// The returned page could not be parsed.
    #[error("schedule parse failed: {0}")]
    ScheduleParseFailed(#[from] ScheduleParseError),
}

impl GatesheadError {
    /// Short name of the failing stage, used as a structured log field.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            GatesheadError::SessionNegotiationFailed(_) => "session",
            GatesheadError::AddressLookupFailed(_) => "address",
            GatesheadError::ScheduleRetrievalFailed(_) => "retrieval",
            GatesheadError::ScheduleParseFailed(_) => "parse",
        }
    }

    /// Collapse into the error reported through the port.
    #[must_use]
    pub fn into_port_error(self, postcode: &str, house_identifier: Option<&str>) -> PortError {
        match self {
            GatesheadError::SessionNegotiationFailed(SessionError::Selector(_))
            | GatesheadError::ScheduleParseFailed(ScheduleParseError::Selector(_)) => {
                PortError::Internal(self.to_string())
            }
            _ => PortError::fetch_failed(postcode, house_identifier),
        }
    }
}
