//! Error types for quarry-core

use thiserror::Error;

/// Result type alias using quarry-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Quarry
#[derive(Error, Debug)]
pub enum Error {
    /// Plugin not present in the registry or at any queried source
    #[error("Plugin not found: {key}")]
    PluginNotFound { key: String },

    /// Unknown plugin source name. The field is `name` rather than
    /// `source` because thiserror treats a `source` field as the cause
    /// chain and requires it to implement `std::error::Error`.
    #[error("Unknown source: {name}. Valid sources: modrinth, hangar, spigot")]
    SourceNotFound { name: String },

    /// No version at the source satisfies the constraint
    #[error("No version of {key} satisfies {constraint}")]
    VersionNotFound { key: String, constraint: String },

    /// Irreconcilable version or dependency constraints
    #[error("Dependency conflict:\n{detail}")]
    Conflict { detail: String },

    /// Operation would violate an explicit version pin
    #[error("Plugin {key} is pinned at {version}; unpin it or pass --force")]
    PinViolation { key: String, version: String },

    /// Pin target differs from the installed version
    #[error("Plugin {key} is installed at {installed}, not {requested}; pass --upgrade to install and pin")]
    VersionMismatch {
        key: String,
        installed: String,
        requested: String,
    },

    /// Durable store unreadable or unparseable
    #[error("Corrupt state file {path}: {detail}. Not auto-repaired; restore from the .tmp snapshot beside it or re-sync the plugins directory")]
    CorruptState { path: String, detail: String },

    /// Source transport failure (timeout, connection, non-404 HTTP error)
    #[error("Source {name} unavailable: {detail}")]
    SourceUnavailable { name: String, detail: String },

    /// Downloaded artifact failed basic validation
    #[error("Artifact integrity check failed: {detail}")]
    Integrity { detail: String },

    /// Invalid version string
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Invalid plugin key (expected source:id)
    #[error("Invalid plugin key '{key}': expected source:id")]
    InvalidKey { key: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a plugin not found error
    pub fn plugin_not_found(key: impl Into<String>) -> Self {
        Self::PluginNotFound { key: key.into() }
    }

    /// Create an unknown source error
    pub fn source_not_found(name: impl Into<String>) -> Self {
        Self::SourceNotFound { name: name.into() }
    }

    /// Create a version not found error
    pub fn version_not_found(key: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::VersionNotFound {
            key: key.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a conflict error from per-plugin conflict lines
    pub fn conflict(lines: Vec<String>) -> Self {
        Self::Conflict {
            detail: lines.join("\n"),
        }
    }

    /// Create a pin violation error
    pub fn pin_violation(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self::PinViolation {
            key: key.into(),
            version: version.into(),
        }
    }

    /// Create a corrupt state error
    pub fn corrupt_state(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CorruptState {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(detail: impl Into<String>) -> Self {
        Self::Integrity {
            detail: detail.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// True for failures that abort before any state mutation
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::PluginNotFound { .. }
                | Self::SourceNotFound { .. }
                | Self::VersionNotFound { .. }
                | Self::Conflict { .. }
                | Self::PinViolation { .. }
                | Self::VersionMismatch { .. }
        )
    }
}
