//! Plugin lifecycle management for Quarry
//!
//! This crate handles:
//! - The durable plugin registry (installed plugins, versions, state)
//! - Catalog caching across source adapters for one invocation
//! - Dependency resolution with version constraint reconciliation
//! - Plan execution: install/update/delete/enable/disable/pin
//! - Per-plugin configuration storage

pub mod catalog;
pub mod config_store;
pub mod lifecycle;
pub mod registry;
pub mod resolver;

pub use catalog::Catalog;
pub use config_store::ConfigStore;
pub use lifecycle::{ApplyReport, DependencyState, DependencyStatus, PluginManager};
pub use registry::{PluginRegistry, RegistryState};
pub use resolver::{Action, MetadataProvider, ResolutionPlan, ResolveRequest};
