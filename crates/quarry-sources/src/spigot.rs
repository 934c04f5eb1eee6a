//! SpigotMC catalog adapter (api.spiget.org/v2)
//!
//! Spiget exposes search and resource metadata but serves no artifact
//! downloads, so installs from this source fail with a clear error while
//! search, listing, and dependency checks keep working. Resources carry a
//! single current version rather than a release history.

use std::time::Duration;

use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use tracing::debug;

use quarry_core::{Error, Result};

use crate::adapter::{
    collect_versions, status_error, transport_error, PluginMetadata, PluginSummary, SourceAdapter,
    RemoteDependency, REQUEST_TIMEOUT_SECS,
};

const BASE_URL: &str = "https://api.spiget.org/v2";
const SOURCE: &str = "spigot";
const SEARCH_LIMIT: &str = "20";

pub struct SpigotSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: u64,
    name: String,
    /// Spiget's short description field
    #[serde(default)]
    tag: String,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: Vec<RemoteDependency>,
}

impl SpigotSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

impl Default for SpigotSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for SpigotSource {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<PluginSummary>> {
        let url = format!("{}/resources/search", self.base_url);
        debug!("Searching Spigot: {}", query);

        let mut params = vec![
            ("query", query.to_string()),
            ("size", SEARCH_LIMIT.to_string()),
            ("sort", "downloads".to_string()),
        ];
        if let Some(cat) = category {
            params.push(("category", cat.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(Error::source_unavailable(
                SOURCE,
                format!("HTTP {}", response.status()),
            ));
        }

        let data: Vec<Resource> = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        Ok(data
            .into_iter()
            .map(|res| PluginSummary {
                id: res.id.to_string(),
                name: res.name,
                description: res.tag,
                source: SOURCE.to_string(),
                downloads: res.downloads,
            })
            .collect())
    }

    async fn metadata(&self, id: &str) -> Result<PluginMetadata> {
        let url = format!("{}/resources/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(status_error(SOURCE, id, response.status()));
        }
        let resource: Resource = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        let dependencies = resource
            .dependencies
            .into_iter()
            .filter_map(|d| d.into_constraint(SOURCE))
            .collect();

        Ok(PluginMetadata {
            id: resource.id.to_string(),
            name: resource.name,
            versions: collect_versions(resource.version.into_iter()),
            dependencies,
        })
    }

    async fn download(&self, id: &str, _version: &Version) -> Result<Vec<u8>> {
        // SpigotMC artifacts sit behind Cloudflare; Spiget has no usable
        // download endpoint for them.
        Err(Error::source_unavailable(
            SOURCE,
            format!(
                "SpigotMC does not serve downloads through its API; fetch resource {} manually from spigotmc.org",
                id
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::version::parse_lenient;

    #[tokio::test]
    async fn test_download_is_refused() {
        let source = SpigotSource::new();
        let err = source
            .download("28140", &parse_lenient("5.7").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(err.to_string().contains("28140"));
    }
}
