//! Source implementation for Gateshead Council's bin collection day checker.
//!
//! A fetch runs four strictly sequential steps against the council website:
//! scrape session tokens from the checker page, resolve the postcode to a
//! property reference through the JSONP lookup service, submit the address
//! search form, and parse the returned schedule table.

/// Postcode lookup and address selection.
pub mod address;
/// Stage-level error types.
pub mod error;
/// Waste label and colour normalization tables.
pub mod normalize;
/// Address search form submission.
pub mod retrieve;
/// Schedule page parsing.
pub mod schedule;
/// Landing page session token negotiation.
pub mod session;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use tracing::{info, warn};

use binday_core::{
    model::{FetchResult, SourceId, SourceMeta, Sources},
    plugin::SourcePlugin,
    ports::{BinDataPort, PortError, RANDOM_HOUSE_LABEL},
};

pub use address::{AddressCandidate, AddressMatch};
pub use error::{AddressLookupError, GatesheadError, ScheduleParseError, SessionError};
pub use session::SessionTokens;

/// Public site origin; also the base for detail links in the schedule.
pub const BASE_URL: &str = "https://www.gateshead.gov.uk";
const BIN_CHECKER_PATH: &str = "/article/3150/Bin-collection-day-checker";
const ADDRESS_LOOKUP_PATH: &str = "/apiserver/postcode";
const PROCESS_SUBMISSION_PATH: &str = "/apiserver/formsservice/http/processsubmission";

/// Upper bound for every individual request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

// The checker rejects requests that do not look like they come from a browser.
pub(crate) fn browser_request(req: RequestBuilder) -> RequestBuilder {
    req.header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT, BROWSER_ACCEPT)
        .header(ACCEPT_LANGUAGE, BROWSER_ACCEPT_LANGUAGE)
        .timeout(REQUEST_TIMEOUT)
}

/// Fetches schedules from the Gateshead bin checker.
pub struct GatesheadFetcher {
    client: Client,
    base_url: String,
    rng: Mutex<StdRng>,
    meta: SourceMeta,
}

impl GatesheadFetcher {
    /// Create a fetcher against the live council website.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Create a fetcher against another origin serving the same endpoints.
    #[must_use]
    pub fn with_base_url<S: Into<String>>(client: Client, base_url: S) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            rng: Mutex::new(StdRng::from_entropy()),
            meta: source_meta(),
        }
    }

    /// Seed the generator used to pick an address when no house identifier is given.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Run the whole pipeline, reporting which stage failed.
    ///
    /// # Errors
    ///
    /// Returns the [`GatesheadError`] of the first stage that fails; later stages are not run.
    pub async fn fetch_schedule(
        &self,
        postcode: &str,
        house_identifier: Option<&str>,
    ) -> Result<FetchResult, GatesheadError> {
        let tokens =
            session::negotiate(&self.client, &self.url(BIN_CHECKER_PATH)).await?;

        let candidates =
            address::lookup(&self.client, &self.url(ADDRESS_LOOKUP_PATH), postcode).await?;
        let address = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            address::select_address(&candidates, house_identifier, &mut *rng)?
        };
        info!(udprn = %address.udprn, address = %address.address_text, "address resolved");

        let html = retrieve::retrieve(
            &self.client,
            &self.url(PROCESS_SUBMISSION_PATH),
            &tokens,
            &address,
            postcode,
            house_identifier,
        )
        .await
        .map_err(GatesheadError::ScheduleRetrievalFailed)?;

        let collections = schedule::parse_schedule(&html, &self.base_url)?;
        info!(collections = collections.len(), "schedule parsed");

        Ok(FetchResult {
            address_text: address.address_text,
            collections,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl BinDataPort for GatesheadFetcher {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn fetch(
        &self,
        postcode: &str,
        house_identifier: Option<&str>,
    ) -> Result<FetchResult, PortError> {
        let house_label = house_identifier.unwrap_or(RANDOM_HOUSE_LABEL);
        info!(postcode, house = house_label, "fetching schedule");

        self.fetch_schedule(postcode, house_identifier)
            .await
            .map_err(|err| {
                warn!(
                    postcode,
                    house = house_label,
                    stage = err.stage(),
                    error = %err,
                    "fetch failed"
                );
                err.into_port_error(postcode, house_identifier)
            })
    }
}

/// Build the plugin bundle for the Gateshead source.
#[must_use]
pub fn plugin(client: Client) -> SourcePlugin {
    SourcePlugin {
        meta: source_meta(),
        port: Arc::new(GatesheadFetcher::new(client)),
    }
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        id: SourceId::from(Sources::Gateshead),
        name: String::from("Gateshead Council"),
    }
}
