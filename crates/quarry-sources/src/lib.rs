//! Plugin catalog source adapters for Quarry
//!
//! Each remote catalog gets one [`SourceAdapter`] implementation that
//! normalizes its native search/metadata/download API into the common
//! schema consumed by the resolver and lifecycle manager. The core never
//! sees a source's native shape.

pub mod adapter;
pub mod hangar;
pub mod modrinth;
pub mod spigot;

pub use adapter::{PluginMetadata, PluginSummary, SourceAdapter};
pub use hangar::HangarSource;
pub use modrinth::ModrinthSource;
pub use spigot::SpigotSource;
