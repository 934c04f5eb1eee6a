//! Plugin identity and record types

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::version::VersionConstraint;

/// Stable plugin identity: catalog source plus source-native id
///
/// Serialized as `source:id`. The id portion may itself contain colons
/// (Hangar project ids are `owner:name`), so only the first colon splits.
/// Identity is always per-source; the same project listed on two sources
/// is two independent plugins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginKey {
    pub source: String,
    pub id: String,
}

impl PluginKey {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.id)
    }
}

impl FromStr for PluginKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.split_once(':') {
            Some((source, id)) if !source.is_empty() && !id.is_empty() => {
                Ok(Self::new(source, id))
            }
            _ => Err(Error::InvalidKey { key: s.to_string() }),
        }
    }
}

impl TryFrom<String> for PluginKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Error> {
        s.parse()
    }
}

impl From<PluginKey> for String {
    fn from(key: PluginKey) -> Self {
        key.to_string()
    }
}

/// A dependency edge: target plugin plus the version range it must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConstraint {
    pub target: PluginKey,
    #[serde(default = "default_constraint")]
    pub constraint: VersionConstraint,
}

fn default_constraint() -> VersionConstraint {
    VersionConstraint::Any
}

impl DependencyConstraint {
    pub fn new(target: PluginKey, constraint: VersionConstraint) -> Self {
        Self { target, constraint }
    }

    /// Dependency on any version of the target
    pub fn any(target: PluginKey) -> Self {
        Self::new(target, VersionConstraint::Any)
    }
}

/// Durable record of one installed plugin
///
/// The artifact lives at `plugins/<file>` while enabled and at
/// `plugins/<file>.disabled` while disabled; the record exists exactly
/// as long as some artifact does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub key: PluginKey,
    pub name: String,
    pub version: Version,
    /// Artifact file name under the server's plugins directory
    pub file: String,
    pub enabled: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub dependencies: Vec<DependencyConstraint>,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PluginRecord {
    /// Create a record for a freshly installed plugin
    pub fn new(
        key: PluginKey,
        name: impl Into<String>,
        version: Version,
        file: impl Into<String>,
        dependencies: Vec<DependencyConstraint>,
    ) -> Self {
        let now = Utc::now();
        Self {
            key,
            name: name.into(),
            version,
            file: file.into(),
            enabled: true,
            pinned: false,
            dependencies,
            installed_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key: PluginKey = "modrinth:P7dR8mSH".parse().unwrap();
        assert_eq!(key.source, "modrinth");
        assert_eq!(key.id, "P7dR8mSH");
        assert_eq!(key.to_string(), "modrinth:P7dR8mSH");
    }

    #[test]
    fn test_key_id_may_contain_colons() {
        let key: PluginKey = "hangar:EssentialsX:Essentials".parse().unwrap();
        assert_eq!(key.source, "hangar");
        assert_eq!(key.id, "EssentialsX:Essentials");
    }

    #[test]
    fn test_key_rejects_missing_parts() {
        assert!("".parse::<PluginKey>().is_err());
        assert!("modrinth".parse::<PluginKey>().is_err());
        assert!(":abc".parse::<PluginKey>().is_err());
        assert!("modrinth:".parse::<PluginKey>().is_err());
    }

    #[test]
    fn test_key_serializes_as_string() {
        let key = PluginKey::new("modrinth", "abc");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"modrinth:abc\"");
        let back: PluginKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
