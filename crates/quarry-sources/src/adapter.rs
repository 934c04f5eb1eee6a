//! Source adapter contract
//!
//! Adapters must report "plugin/version does not exist" (`PluginNotFound`,
//! `VersionNotFound`) distinctly from transport failures
//! (`SourceUnavailable`): the former is fatal for the affected plan node,
//! the latter is retryable by the user. Requests carry a client timeout;
//! no adapter retries automatically.

use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;

use quarry_core::version::parse_lenient;
use quarry_core::{DependencyConstraint, Error, PluginKey, Result, VersionConstraint};

/// Timeout applied to every catalog request
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One search hit, normalized across sources
#[derive(Debug, Clone)]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: String,
    pub downloads: u64,
}

/// Catalog metadata for one plugin: available versions plus the
/// dependencies its current release declares
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub id: String,
    pub name: String,
    /// Available versions, newest first
    pub versions: Vec<Version>,
    pub dependencies: Vec<DependencyConstraint>,
}

impl PluginMetadata {
    /// Highest available version satisfying `constraint`
    pub fn best_match(&self, constraint: &VersionConstraint) -> Option<&Version> {
        self.versions.iter().filter(|v| constraint.matches(v)).max()
    }
}

/// A remote plugin catalog
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source name used in plugin keys (e.g. "modrinth")
    fn name(&self) -> &str;

    /// Search the catalog for plugins matching `query`
    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<PluginSummary>>;

    /// Fetch available versions and declared dependencies for a plugin
    async fn metadata(&self, id: &str) -> Result<PluginMetadata>;

    /// Download the artifact bytes for one plugin version
    async fn download(&self, id: &str, version: &Version) -> Result<Vec<u8>>;
}

/// Dependency entry as catalogs publish it
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteDependency {
    pub id: Option<String>,
    pub source: Option<String>,
    pub version: Option<String>,
}

impl RemoteDependency {
    /// Convert to a constraint, defaulting the source to the declaring
    /// catalog and an absent version to `Any`. Entries without an id are
    /// dropped.
    pub fn into_constraint(self, default_source: &str) -> Option<DependencyConstraint> {
        let id = self.id?;
        let source = self.source.unwrap_or_else(|| default_source.to_string());
        let constraint = match self.version.as_deref() {
            Some(raw) => match parse_lenient(raw) {
                Ok(version) => VersionConstraint::Exact { version },
                Err(_) => {
                    tracing::warn!("Ignoring unparseable dependency version '{}'", raw);
                    VersionConstraint::Any
                }
            },
            None => VersionConstraint::Any,
        };
        Some(DependencyConstraint::new(
            PluginKey::new(source, id),
            constraint,
        ))
    }
}

/// Parse raw version strings leniently, dropping unparseable entries,
/// and return them newest first
pub(crate) fn collect_versions(raw: impl IntoIterator<Item = String>) -> Vec<Version> {
    let mut versions: Vec<Version> = raw
        .into_iter()
        .filter_map(|s| match parse_lenient(&s) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::debug!("Skipping unparseable catalog version '{}'", s);
                None
            }
        })
        .collect();
    versions.sort();
    versions.reverse();
    versions
}

/// Map a transport error onto the taxonomy
pub(crate) fn transport_error(source: &str, err: reqwest::Error) -> Error {
    Error::source_unavailable(source, err.to_string())
}

/// Map a non-success HTTP status: 404 is "does not exist", everything
/// else is a source failure
pub(crate) fn status_error(source: &str, id: &str, status: reqwest::StatusCode) -> Error {
    if status == reqwest::StatusCode::NOT_FOUND {
        Error::plugin_not_found(format!("{}:{}", source, id))
    } else {
        Error::source_unavailable(source, format!("HTTP {}", status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_dependency_defaults_source() {
        let dep = RemoteDependency {
            id: Some("abc".to_string()),
            source: None,
            version: None,
        };
        let constraint = dep.into_constraint("modrinth").unwrap();
        assert_eq!(constraint.target, PluginKey::new("modrinth", "abc"));
        assert_eq!(constraint.constraint, VersionConstraint::Any);
    }

    #[test]
    fn test_remote_dependency_exact_version() {
        let dep = RemoteDependency {
            id: Some("abc".to_string()),
            source: Some("hangar".to_string()),
            version: Some("1.2".to_string()),
        };
        let constraint = dep.into_constraint("modrinth").unwrap();
        assert_eq!(constraint.target.source, "hangar");
        assert_eq!(
            constraint.constraint,
            VersionConstraint::Exact {
                version: parse_lenient("1.2").unwrap(),
            }
        );
    }

    #[test]
    fn test_remote_dependency_without_id_is_dropped() {
        let dep = RemoteDependency {
            id: None,
            source: None,
            version: Some("1.0".to_string()),
        };
        assert!(dep.into_constraint("modrinth").is_none());
    }

    #[test]
    fn test_collect_versions_orders_newest_first() {
        let versions = collect_versions(vec![
            "1.0".to_string(),
            "not-a-version".to_string(),
            "2.0-SNAPSHOT".to_string(),
            "2.0".to_string(),
        ]);
        let rendered: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["2.0.0", "2.0.0-SNAPSHOT", "1.0.0"]);
    }
}
