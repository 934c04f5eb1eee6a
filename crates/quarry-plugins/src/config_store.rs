//! Per-plugin configuration storage
//!
//! Key/value settings persisted independently of plugin binaries: an
//! entry is created on the first `set`, survives plugin updates and
//! reinstalls, and is deleted only by an explicit plugin delete or key
//! removal. Values are opaque text; validation is the owning plugin's
//! concern. One JSON file per plugin under `<server_dir>/.quarry/config/`,
//! written with the same temp-then-rename discipline as the registry.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use quarry_core::{storage, Error, PluginKey, Result};

/// Config directory relative to the server directory
pub const CONFIG_DIR: &str = ".quarry/config";

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn open(server_dir: &Path) -> Self {
        Self {
            dir: server_dir.join(CONFIG_DIR),
        }
    }

    /// File backing one plugin's entry. Plugin keys contain `:`, which is
    /// not portable in file names.
    fn entry_path(&self, key: &PluginKey) -> PathBuf {
        let name: String = key
            .to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    /// Read a plugin's settings; absent entry is an empty mapping
    pub fn get(&self, key: &PluginKey) -> Result<IndexMap<String, String>> {
        let path = self.entry_path(key);
        match storage::read(&path)? {
            None => Ok(IndexMap::new()),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::corrupt_state(path.display().to_string(), e.to_string())),
        }
    }

    /// Set one value, creating the entry if absent
    pub fn set(&self, key: &PluginKey, name: &str, value: &str) -> Result<()> {
        let mut entry = self.get(key)?;
        entry.insert(name.to_string(), value.to_string());
        self.write(key, &entry)
    }

    /// Remove one value; returns whether it was present
    pub fn unset(&self, key: &PluginKey, name: &str) -> Result<bool> {
        let mut entry = self.get(key)?;
        let removed = entry.shift_remove(name).is_some();
        if removed {
            self.write(key, &entry)?;
        }
        Ok(removed)
    }

    /// Delete the whole entry, tolerating its absence
    pub fn remove(&self, key: &PluginKey) -> Result<()> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed config entry for {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &PluginKey, entry: &IndexMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entry)?;
        storage::atomic_write(&self.entry_path(key), &bytes)
    }
}
