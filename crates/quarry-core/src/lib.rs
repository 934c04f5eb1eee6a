//! Core library for Quarry
//!
//! Provides the plugin identity and record types, version constraint
//! handling, the error taxonomy, and the atomic durable-storage helper
//! shared by the registry and the configuration store.

pub mod error;
pub mod storage;
pub mod types;
pub mod version;

pub use error::{Error, Result};
pub use types::{DependencyConstraint, PluginKey, PluginRecord};
pub use version::{parse_lenient, VersionConstraint};
