//! Durable atomic storage helper
//!
//! Both the plugin registry and the configuration store persist through
//! this module: a read that distinguishes "absent" from "unreadable", and
//! a write that goes to a temporary file in the destination directory and
//! is renamed into place. A crash mid-write leaves the previous file
//! intact and at worst a stray `.tmp` beside it; the rename is the sole
//! commit point.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Read the full contents of `path`, or `None` if it does not exist
pub fn read(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomically replace `path` with `bytes`
///
/// The temporary file is created in the destination's parent directory so
/// the final rename stays on one filesystem.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::with_suffix_in(".tmp", parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_absent_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read(&dir.path().join("missing.json")).unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        atomic_write(&path, b"{\"a\":1}").unwrap();
        assert_eq!(read(&path).unwrap().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_write_replaces_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        atomic_write(&path, b"first version, longer content").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(read(&path).unwrap().unwrap(), b"second");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/state.json");

        atomic_write(&path, b"x").unwrap();
        assert!(path.exists());
    }
}
