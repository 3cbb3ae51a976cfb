//! Registry for all source plugins and their ports.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{SourceId, SourceMeta};
use crate::ports::{BinDataPort, PortError};

/// A fetch port together with the metadata of the source it serves.
pub struct SourcePlugin {
    /// Static metadata describing the source.
    pub meta: SourceMeta,
    /// Implementation for fetching schedules.
    pub port: Arc<dyn BinDataPort>,
}

/// Registry that resolves plugins by source identifier.
pub struct SourceRegistry {
    plugins: HashMap<SourceId, SourcePlugin>,
}

impl SourceRegistry {
    /// Build a registry from the provided plugin list.
    #[must_use]
    pub fn new(plugins: Vec<SourcePlugin>) -> Self {
        let plugins_map = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.id.clone(), plugin))
            .collect();
        Self {
            plugins: plugins_map,
        }
    }

    /// Return metadata for all registered sources.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceMeta> {
        self.plugins
            .values()
            .map(|plugin| plugin.meta.clone())
            .collect()
    }

    /// Look up a plugin for the given source. Matching ignores case.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedSource`] when no plugin is registered.
    pub fn plugin(&self, source: &SourceId) -> Result<&SourcePlugin, PortError> {
        self.plugins
            .get(&SourceId::new(&source.0))
            .ok_or_else(|| PortError::UnsupportedSource(source.0.clone()))
    }
}
