//! On-disk schedule cache keyed by postcode and house identifier.
//!
//! The cache stores one JSON document per key with the shape
//! `{"address_text": "...", "schedule": [...]}`. Reads happen before a fetch and
//! writes only after a successful one; any cache problem degrades to a miss.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::model::{FetchResult, SourceMeta};
use crate::ports::{BinDataPort, PortError, RANDOM_HOUSE_LABEL};

/// File name component used when no house identifier was supplied.
///
/// Keeps random-address results apart from any specific-house entry.
pub const RANDOM_HOUSE_PLACEHOLDER: &str = "__random__";

#[derive(thiserror::Error, Debug)]
/// Errors raised while writing a cache entry.
pub enum CacheError {
    /// Filesystem access failed.
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The entry could not be encoded as JSON.
    #[error("Cache encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Build the cache file name for a postcode / house identifier pair.
#[must_use]
pub fn cache_file_name(postcode: &str, house_identifier: Option<&str>) -> String {
    let safe_postcode = postcode.replace(' ', "_").to_uppercase();
    let safe_house = match house_identifier {
        Some(house) => house.replace(['/', '\\'], "_"),
        None => RANDOM_HOUSE_PLACEHOLDER.to_owned(),
    };
    format!("{safe_postcode}_{safe_house}.json")
}

/// Directory of cached schedules, one JSON file per address key.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the entry for this key.
    #[must_use]
    pub fn path_for(&self, postcode: &str, house_identifier: Option<&str>) -> PathBuf {
        self.dir.join(cache_file_name(postcode, house_identifier))
    }

    /// Read a cached schedule.
    ///
    /// Missing, unreadable, or malformed entries all count as a miss.
    pub async fn load(&self, postcode: &str, house_identifier: Option<&str>) -> Option<FetchResult> {
        let path = self.path_for(postcode, house_identifier);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "cache miss");
                return None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str::<FetchResult>(&raw) {
            Ok(result) => {
                info!(path = %path.display(), "cache hit");
                Some(result)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "invalid cache entry, ignoring");
                None
            }
        }
    }

    /// Write a schedule to the cache, replacing any previous entry for the key.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the directory or file cannot be written.
    pub async fn save(
        &self,
        postcode: &str,
        house_identifier: Option<&str>,
        result: &FetchResult,
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(postcode, house_identifier);
        let body = serde_json::to_string_pretty(result)?;
        fs::write(&path, body).await?;
        info!(path = %path.display(), "schedule saved to cache");
        Ok(path)
    }
}

/// Caching layer in front of another [`BinDataPort`].
pub struct CachedFetcher {
    inner: Arc<dyn BinDataPort>,
    cache: FileCache,
}

impl CachedFetcher {
    /// Wrap `inner` so successful fetches are served from and stored in `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn BinDataPort>, cache: FileCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl BinDataPort for CachedFetcher {
    fn source(&self) -> &SourceMeta {
        self.inner.source()
    }

    async fn fetch(
        &self,
        postcode: &str,
        house_identifier: Option<&str>,
    ) -> Result<FetchResult, PortError> {
        let house_label = house_identifier.unwrap_or(RANDOM_HOUSE_LABEL);

        if let Some(cached) = self.cache.load(postcode, house_identifier).await {
            return Ok(cached);
        }

        debug!(postcode, house = house_label, "calling underlying fetcher");
        match self.inner.fetch(postcode, house_identifier).await {
            Ok(result) => {
                if let Err(err) = self.cache.save(postcode, house_identifier, &result).await {
                    warn!(postcode, house = house_label, error = %err, "could not save cache entry");
                }
                Ok(result)
            }
            Err(err) => {
                warn!(postcode, house = house_label, "underlying fetcher failed, result not cached");
                Err(err)
            }
        }
    }
}
