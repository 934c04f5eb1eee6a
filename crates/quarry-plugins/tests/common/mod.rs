//! Shared test fixtures: an in-memory source adapter

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;

use quarry_core::version::parse_lenient;
use quarry_core::{DependencyConstraint, Error, PluginKey, Result, VersionConstraint};
use quarry_plugins::Catalog;
use quarry_sources::{PluginMetadata, PluginSummary, SourceAdapter};

/// Fake artifact payload used unless a test overrides it
pub const FAKE_JAR: &[u8] = b"PK\x03\x04 fake jar payload";

#[derive(Clone)]
struct StaticPlugin {
    name: String,
    versions: Vec<Version>,
    dependencies: Vec<DependencyConstraint>,
}

/// An in-memory catalog source seeded by the test
pub struct StaticSource {
    name: String,
    plugins: HashMap<String, StaticPlugin>,
    artifacts: HashMap<(String, Version), Vec<u8>>,
}

impl StaticSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            plugins: HashMap::new(),
            artifacts: HashMap::new(),
        }
    }

    /// Register a plugin with its versions (any order) and dependencies
    /// declared as `(target_key, constraint)` pairs
    pub fn with_plugin(mut self, id: &str, versions: &[&str], deps: &[(&str, &str)]) -> Self {
        let mut parsed: Vec<Version> = versions.iter().map(|v| parse_lenient(v).unwrap()).collect();
        parsed.sort();
        parsed.reverse();

        let dependencies = deps
            .iter()
            .map(|(target, constraint)| {
                DependencyConstraint::new(target.parse().unwrap(), constraint.parse().unwrap())
            })
            .collect();

        self.plugins.insert(
            id.to_string(),
            StaticPlugin {
                name: id.to_string(),
                versions: parsed,
                dependencies,
            },
        );
        self
    }

    /// Override the artifact bytes for one plugin version
    pub fn with_artifact(mut self, id: &str, version: &str, bytes: &[u8]) -> Self {
        self.artifacts.insert(
            (id.to_string(), parse_lenient(version).unwrap()),
            bytes.to_vec(),
        );
        self
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, _category: Option<&str>) -> Result<Vec<PluginSummary>> {
        Ok(self
            .plugins
            .iter()
            .filter(|(id, _)| id.contains(query))
            .map(|(id, plugin)| PluginSummary {
                id: id.clone(),
                name: plugin.name.clone(),
                description: String::new(),
                source: self.name.clone(),
                downloads: 0,
            })
            .collect())
    }

    async fn metadata(&self, id: &str) -> Result<PluginMetadata> {
        let plugin = self
            .plugins
            .get(id)
            .ok_or_else(|| Error::plugin_not_found(format!("{}:{}", self.name, id)))?;
        Ok(PluginMetadata {
            id: id.to_string(),
            name: plugin.name.clone(),
            versions: plugin.versions.clone(),
            dependencies: plugin.dependencies.clone(),
        })
    }

    async fn download(&self, id: &str, version: &Version) -> Result<Vec<u8>> {
        if !self.plugins.get(id).is_some_and(|p| p.versions.contains(version)) {
            return Err(Error::version_not_found(
                format!("{}:{}", self.name, id),
                format!("={}", version),
            ));
        }
        Ok(self
            .artifacts
            .get(&(id.to_string(), version.clone()))
            .cloned()
            .unwrap_or_else(|| FAKE_JAR.to_vec()))
    }
}

/// Catalog over a single static source
pub fn catalog(source: StaticSource) -> Catalog {
    Catalog::new().with_source(Arc::new(source))
}

pub fn key(s: &str) -> PluginKey {
    s.parse().unwrap()
}

pub fn v(s: &str) -> Version {
    parse_lenient(s).unwrap()
}

pub fn constraint(s: &str) -> VersionConstraint {
    s.parse().unwrap()
}
