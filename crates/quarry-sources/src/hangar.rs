//! Hangar catalog adapter (hangar.papermc.io/api/v1)
//!
//! Hangar identifies projects as `owner:name`; that compound string is the
//! source-native id carried in plugin keys.

use std::time::Duration;

use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use tracing::debug;

use quarry_core::version::parse_lenient;
use quarry_core::{Error, Result};

use crate::adapter::{
    collect_versions, status_error, transport_error, PluginMetadata, PluginSummary, SourceAdapter,
    RemoteDependency, REQUEST_TIMEOUT_SECS,
};

const BASE_URL: &str = "https://hangar.papermc.io/api/v1";
const SOURCE: &str = "hangar";
const PLATFORM: &str = "paper";
const SEARCH_LIMIT: &str = "20";

pub struct HangarSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    #[serde(default)]
    result: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    name: String,
    owner: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    stats: ProjectStats,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectStats {
    #[serde(default)]
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct Project {
    name: String,
    #[serde(default)]
    dependencies: Vec<RemoteDependency>,
}

#[derive(Debug, Deserialize)]
struct VersionList {
    #[serde(default)]
    result: Vec<ProjectVersion>,
}

#[derive(Debug, Deserialize)]
struct ProjectVersion {
    name: String,
}

/// Split a `owner:name` id
fn split_id(id: &str) -> Result<(&str, &str)> {
    id.split_once(':')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
        .ok_or_else(|| Error::plugin_not_found(format!("{}:{} (expected owner:name id)", SOURCE, id)))
}

impl HangarSource {
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

    async fn fetch_versions(&self, id: &str) -> Result<Vec<ProjectVersion>> {
        let (owner, name) = split_id(id)?;
        let url = format!("{}/projects/{}/{}/versions", self.base_url, owner, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(status_error(SOURCE, id, response.status()));
        }
        let list: VersionList = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        Ok(list.result)
    }
}

impl Default for HangarSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for HangarSource {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<PluginSummary>> {
        let url = format!("{}/projects", self.base_url);
        debug!("Searching Hangar: {}", query);

        let mut params = vec![
            ("q", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
            ("platforms", PLATFORM.to_string()),
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

        let data: ProjectList = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        Ok(data
            .result
            .into_iter()
            .map(|entry| PluginSummary {
                id: format!("{}:{}", entry.owner, entry.name),
                name: entry.name,
                description: entry.description,
                source: SOURCE.to_string(),
                downloads: entry.stats.downloads,
            })
            .collect())
    }

    async fn metadata(&self, id: &str) -> Result<PluginMetadata> {
        let (owner, name) = split_id(id)?;
        let url = format!("{}/projects/{}/{}", self.base_url, owner, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(status_error(SOURCE, id, response.status()));
        }
        let project: Project = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        let versions = self.fetch_versions(id).await?;
        let dependencies = project
            .dependencies
            .into_iter()
            .filter_map(|d| d.into_constraint(SOURCE))
            .collect();

        Ok(PluginMetadata {
            id: id.to_string(),
            name: project.name,
            versions: collect_versions(versions.into_iter().map(|v| v.name)),
            dependencies,
        })
    }

    async fn download(&self, id: &str, version: &Version) -> Result<Vec<u8>> {
        let (owner, name) = split_id(id)?;
        let versions = self.fetch_versions(id).await?;

        // The download URL wants the catalog's exact version string, which
        // lenient parsing may have normalized away.
        let target = versions
            .iter()
            .find(|v| parse_lenient(&v.name).is_ok_and(|parsed| parsed == *version))
            .ok_or_else(|| {
                Error::version_not_found(format!("{}:{}", SOURCE, id), format!("={}", version))
            })?;

        let url = format!(
            "{}/projects/{}/{}/versions/{}/{}/download",
            self.base_url, owner, name, target.name, PLATFORM
        );
        debug!("Downloading {} {} from Hangar", id, target.name);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(Error::source_unavailable(
                SOURCE,
                format!("HTTP {} downloading {} {}", response.status(), id, target.name),
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        Ok(bytes.to_vec())
    }
}
