//! Durable plugin registry
//!
//! The registry is the sole owner of [`PluginRecord`]s: every command
//! re-reads it from disk, mutates the in-memory state, and writes the
//! whole file back atomically. It performs no network or dependency
//! logic; it is a keyed store with no partial-write visibility. Located
//! at `<server_dir>/.quarry/registry.json`.
//!
//! Concurrent invocations against the same server directory are not
//! arbitrated: the atomic rename is the sole commit point, and callers
//! must serialize invocations externally.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use quarry_core::{storage, Error, PluginKey, PluginRecord, Result};

/// Registry file location relative to the server directory
pub const REGISTRY_FILE: &str = ".quarry/registry.json";

const SCHEMA_VERSION: &str = "1";

/// In-memory image of the registry file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    pub schema_version: String,
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginRecord>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            plugins: BTreeMap::new(),
        }
    }
}

impl RegistryState {
    /// Look up an installed plugin
    pub fn find(&self, key: &PluginKey) -> Option<&PluginRecord> {
        self.plugins.get(&key.to_string())
    }

    /// Mutable lookup
    pub fn find_mut(&mut self, key: &PluginKey) -> Option<&mut PluginRecord> {
        self.plugins.get_mut(&key.to_string())
    }

    /// Insert or replace a record, keyed by its plugin identity
    pub fn upsert(&mut self, record: PluginRecord) {
        self.plugins.insert(record.key.to_string(), record);
    }

    /// Remove a record, returning it if present
    pub fn remove(&mut self, key: &PluginKey) -> Option<PluginRecord> {
        self.plugins.remove(&key.to_string())
    }

    /// All records in key order
    pub fn records(&self) -> impl Iterator<Item = &PluginRecord> {
        self.plugins.values()
    }

    /// Count of tracked plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Handle to the registry file of one server directory
pub struct PluginRegistry {
    path: PathBuf,
}

impl PluginRegistry {
    pub fn open(server_dir: &Path) -> Self {
        Self {
            path: server_dir.join(REGISTRY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, returning an empty state when the file does not
    /// exist yet. An unparseable file is `CorruptState` and the caller
    /// must not proceed.
    pub fn load(&self) -> Result<RegistryState> {
        match storage::read(&self.path)? {
            None => {
                debug!("No registry at {:?}, starting empty", self.path);
                Ok(RegistryState::default())
            }
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::corrupt_state(self.path.display().to_string(), e.to_string())
            }),
        }
    }

    /// Persist the whole state atomically (temp-then-rename)
    pub fn save(&self, state: &RegistryState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        storage::atomic_write(&self.path, &bytes)?;
        debug!("Saved registry with {} plugins", state.len());
        Ok(())
    }
}
