//! Per-invocation catalog cache
//!
//! Holds the configured source adapters for one command invocation and
//! memoizes metadata responses so the resolver and the lifecycle manager
//! never fetch the same plugin twice. Nothing here is persisted; the
//! cache dies with the invocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;
use semver::Version;
use tracing::{debug, warn};

use quarry_core::{Error, PluginKey, Result};
use quarry_sources::{
    HangarSource, ModrinthSource, PluginMetadata, PluginSummary, SourceAdapter, SpigotSource,
};

use crate::resolver::MetadataProvider;

pub struct Catalog {
    sources: HashMap<String, Arc<dyn SourceAdapter>>,
    memo: Mutex<HashMap<PluginKey, Arc<PluginMetadata>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Catalog over the built-in sources
    pub fn with_default_sources() -> Self {
        Self::new()
            .with_source(Arc::new(ModrinthSource::new()))
            .with_source(Arc::new(HangarSource::new()))
            .with_source(Arc::new(SpigotSource::new()))
    }

    pub fn with_source(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.sources.insert(adapter.name().to_string(), adapter);
        self
    }

    fn source(&self, name: &str) -> Result<&Arc<dyn SourceAdapter>> {
        self.sources
            .get(name)
            .ok_or_else(|| Error::source_not_found(name))
    }

    /// Search one source, or fan out across all of them. Per-source
    /// failures during fan-out degrade to a warning so one unreachable
    /// catalog does not hide the others' results.
    pub async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        source: Option<&str>,
    ) -> Result<Vec<PluginSummary>> {
        if let Some(name) = source {
            return self.source(name)?.search(query, category).await;
        }

        let adapters: Vec<&Arc<dyn SourceAdapter>> = self.sources.values().collect();
        let searches = join_all(adapters.iter().map(|a| a.search(query, category))).await;

        let mut results = Vec::new();
        for (adapter, outcome) in adapters.iter().zip(searches) {
            match outcome {
                Ok(mut summaries) => results.append(&mut summaries),
                Err(e) => warn!("Search on {} failed: {}", adapter.name(), e),
            }
        }
        results.sort_by(|a, b| b.downloads.cmp(&a.downloads));
        Ok(results)
    }

    /// Download one plugin version's artifact bytes
    pub async fn download(&self, key: &PluginKey, version: &Version) -> Result<Vec<u8>> {
        self.source(&key.source)?.download(&key.id, version).await
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for Catalog {
    async fn metadata(&self, key: &PluginKey) -> Result<Arc<PluginMetadata>> {
        if let Some(cached) = self.memo.lock().expect("catalog memo poisoned").get(key) {
            return Ok(cached.clone());
        }

        debug!("Fetching metadata for {}", key);
        let fetched = Arc::new(self.source(&key.source)?.metadata(&key.id).await?);
        self.memo
            .lock()
            .expect("catalog memo poisoned")
            .insert(key.clone(), fetched.clone());
        Ok(fetched)
    }
}
