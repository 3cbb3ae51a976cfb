//! High-level service facade combining all sources.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CachedFetcher, FileCache};
use crate::model::{FetchResult, SourceId, SourceMeta};
use crate::plugin::SourceRegistry;
use crate::ports::{BinDataPort, PortError};

/// Public entry point for fetching collection schedules.
pub struct BinDayService {
    registry: Arc<SourceRegistry>,
    cache: Option<FileCache>,
}

impl BinDayService {
    /// Create a new service bound to the provided registry, with caching disabled.
    #[must_use]
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Serve fetches through `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// List all available sources.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceMeta> {
        self.registry.sources()
    }

    /// Resolve the fetcher for a source, wrapped in the cache layer when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedSource`] if no plugin is registered for `source`.
    pub fn fetcher(&self, source: &SourceId) -> Result<Arc<dyn BinDataPort>, PortError> {
        let plugin = self.registry.plugin(source)?;
        let port = Arc::clone(&plugin.port);

        Ok(match &self.cache {
            Some(cache) => {
                info!(source = %plugin.meta.id, cache_dir = %cache.dir().display(), "cache enabled");
                Arc::new(CachedFetcher::new(port, cache.clone()))
            }
            None => {
                info!(source = %plugin.meta.id, "cache disabled");
                port
            }
        })
    }

    /// Fetch the schedule for an address from the given source.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the source is unsupported or the fetch fails.
    pub async fn fetch(
        &self,
        source: &SourceId,
        postcode: &str,
        house_identifier: Option<&str>,
    ) -> Result<FetchResult, PortError> {
        self.fetcher(source)?.fetch(postcode, house_identifier).await
    }
}
