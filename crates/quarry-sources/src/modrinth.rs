//! Modrinth catalog adapter (api.modrinth.com/v2)

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

const BASE_URL: &str = "https://api.modrinth.com/v2";
const SOURCE: &str = "modrinth";
const SEARCH_LIMIT: &str = "20";

pub struct ModrinthSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    project_id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ProjectVersion {
    version_number: String,
    #[serde(default)]
    dependencies: Vec<VersionDependency>,
    #[serde(default)]
    files: Vec<VersionFile>,
}

#[derive(Debug, Deserialize)]
struct VersionDependency {
    project_id: Option<String>,
    #[serde(default)]
    dependency_type: String,
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
}

/// Primary file if marked, else the first `.jar`
fn pick_jar(files: &[VersionFile]) -> Option<&VersionFile> {
    files
        .iter()
        .find(|f| f.primary && f.filename.ends_with(".jar"))
        .or_else(|| files.iter().find(|f| f.filename.ends_with(".jar")))
}

impl ModrinthSource {
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
        let url = format!("{}/project/{}/version", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(status_error(SOURCE, id, response.status()));
        }
        response
            .json::<Vec<ProjectVersion>>()
            .await
            .map_err(|e| transport_error(SOURCE, e))
    }
}

impl Default for ModrinthSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ModrinthSource {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<PluginSummary>> {
        let facets = match category {
            Some(cat) => format!(r#"[["categories:bukkit"],["categories:{}"]]"#, cat),
            None => r#"[["categories:bukkit"]]"#.to_string(),
        };

        let url = format!("{}/search", self.base_url);
        debug!("Searching Modrinth: {}", query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("limit", SEARCH_LIMIT),
                ("index", "downloads"),
                ("facets", facets.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(Error::source_unavailable(
                SOURCE,
                format!("HTTP {}", response.status()),
            ));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        Ok(data
            .hits
            .into_iter()
            .map(|hit| PluginSummary {
                id: hit.project_id,
                name: hit.title,
                description: hit.description,
                source: SOURCE.to_string(),
                downloads: hit.downloads,
            })
            .collect())
    }

    async fn metadata(&self, id: &str) -> Result<PluginMetadata> {
        let url = format!("{}/project/{}", self.base_url, id);
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

        // Dependencies are declared per release; the newest release's
        // required entries are what a fresh install would need.
        let dependencies = versions
            .first()
            .map(|v| {
                v.dependencies
                    .iter()
                    .filter(|d| d.dependency_type == "required")
                    .filter_map(|d| {
                        RemoteDependency {
                            id: d.project_id.clone(),
                            source: None,
                            version: None,
                        }
                        .into_constraint(SOURCE)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(PluginMetadata {
            id: project.id,
            name: project.title,
            versions: collect_versions(versions.into_iter().map(|v| v.version_number)),
            dependencies,
        })
    }

    async fn download(&self, id: &str, version: &Version) -> Result<Vec<u8>> {
        let versions = self.fetch_versions(id).await?;

        let target = versions
            .iter()
            .find(|v| parse_lenient(&v.version_number).is_ok_and(|parsed| parsed == *version))
            .ok_or_else(|| {
                Error::version_not_found(format!("{}:{}", SOURCE, id), format!("={}", version))
            })?;

        let file = pick_jar(&target.files).ok_or_else(|| {
            Error::version_not_found(format!("{}:{}", SOURCE, id), format!("={} (no jar)", version))
        })?;

        debug!("Downloading {} from {}", file.filename, file.url);
        let response = self
            .client
            .get(&file.url)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        if !response.status().is_success() {
            return Err(Error::source_unavailable(
                SOURCE,
                format!("HTTP {} downloading {}", response.status(), file.filename),
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, primary: bool) -> VersionFile {
        VersionFile {
            url: format!("https://cdn.example/{}", name),
            filename: name.to_string(),
            primary,
        }
    }

    #[test]
    fn test_pick_jar_prefers_primary() {
        let files = vec![file("extra.jar", false), file("main.jar", true)];
        assert_eq!(pick_jar(&files).unwrap().filename, "main.jar");
    }

    #[test]
    fn test_pick_jar_falls_back_to_first_jar() {
        let files = vec![file("sources.zip", true), file("plugin.jar", false)];
        assert_eq!(pick_jar(&files).unwrap().filename, "plugin.jar");
    }

    #[test]
    fn test_pick_jar_none_without_jar() {
        let files = vec![file("sources.zip", false)];
        assert!(pick_jar(&files).is_none());
    }
}
