//! Traits describing source capabilities and shared error types.

use async_trait::async_trait;

use crate::model::{FetchResult, SourceMeta};

/// Placeholder shown in logs and errors when no house identifier was supplied.
pub const RANDOM_HOUSE_LABEL: &str = "random";

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to source backends.
pub enum PortError {
    /// The schedule could not be fetched for this address.
    ///
    /// Deliberately opaque: the failing stage is logged by the source, not exposed.
    #[error("Failed to fetch schedule for postcode '{postcode}' ({house_identifier})")]
    FetchFailed {
        /// Postcode that was looked up.
        postcode: String,
        /// House identifier that was requested, or [`RANDOM_HOUSE_LABEL`].
        house_identifier: String,
    },
    /// The source has no registered plugin.
    #[error("Unknown data source: {0}")]
    UnsupportedSource(String),
    /// The source itself is broken (e.g. a scraping selector that does not compile),
    /// independent of the address asked for.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortError {
    /// Build the opaque fetch failure for a postcode / house pair.
    #[must_use]
    pub fn fetch_failed(postcode: &str, house_identifier: Option<&str>) -> Self {
        PortError::FetchFailed {
            postcode: postcode.to_owned(),
            house_identifier: house_identifier.unwrap_or(RANDOM_HOUSE_LABEL).to_owned(),
        }
    }
}

#[async_trait]
/// Trait for anything able to produce a collection schedule for an address.
pub trait BinDataPort: Send + Sync {
    /// Metadata describing the source handled by this port.
    fn source(&self) -> &SourceMeta;

    /// Fetch the upcoming collections for a postcode.
    ///
    /// When `house_identifier` is `None` the source picks an address for the postcode itself.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::FetchFailed`] when any stage of the fetch fails.
    async fn fetch(
        &self,
        postcode: &str,
        house_identifier: Option<&str>,
    ) -> Result<FetchResult, PortError>;
}
