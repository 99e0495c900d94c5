use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sev_fs::{AtomicWriteOptions, atomic_read, atomic_write};

use crate::error::{Error, Result};

/// Name of the provenance sidecar inside an extraction directory.
pub const ARCHIVE_INFO_FILE: &str = ".archive_info.json";

/// Provenance of an extraction directory. Written last, so its presence with
/// the expected `sha1` marks the directory as complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub sha1: String,
    pub filename: String,
}

impl ArchiveInfo {
    pub fn new(sha1: impl Into<String>, source: &Path) -> Self {
        Self {
            sha1: sha1.into(),
            filename: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub fn store(&self, dir: &Path) -> Result<()> {
        let path = dir.join(ARCHIVE_INFO_FILE);
        let content = serde_json::to_vec(self).map_err(|e| Error::InfoRecord {
            path: path.clone(),
            source: e,
        })?;
        atomic_write(&path, &content, AtomicWriteOptions::new())?;
        Ok(())
    }

    /// `Ok(None)` when `dir` holds no sidecar.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(ARCHIVE_INFO_FILE);
        let content = match atomic_read(&path) {
            Ok(content) => content,
            Err(sev_fs::Error::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| Error::InfoRecord { path, source: e })
    }

    /// Whether `dir` is a complete extraction of the archive hashed to `sha1`.
    pub fn validates(dir: &Path, sha1: &str) -> bool {
        matches!(Self::load(dir), Ok(Some(info)) if info.sha1 == sha1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_then_load() {
        let dir = tempdir().unwrap();
        let info = ArchiveInfo::new("abc123", Path::new("/downloads/Team Slack export.zip"));
        info.store(dir.path()).unwrap();

        let loaded = ArchiveInfo::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, info);
        assert_eq!(loaded.filename, "Team Slack export.zip");
    }

    #[test]
    fn non_ascii_filename_kept_literal() {
        let dir = tempdir().unwrap();
        ArchiveInfo::new("abc", Path::new("Команда.zip")).store(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(ARCHIVE_INFO_FILE)).unwrap();
        assert!(raw.contains("Команда.zip"));
    }

    #[test]
    fn missing_sidecar_is_none() {
        let dir = tempdir().unwrap();
        assert!(ArchiveInfo::load(dir.path()).unwrap().is_none());
        assert!(!ArchiveInfo::validates(dir.path(), "abc"));
    }

    #[test]
    fn validates_checks_hash() {
        let dir = tempdir().unwrap();
        ArchiveInfo::new("abc", Path::new("a.zip")).store(dir.path()).unwrap();
        assert!(ArchiveInfo::validates(dir.path(), "abc"));
        assert!(!ArchiveInfo::validates(dir.path(), "def"));
    }

    #[test]
    fn malformed_sidecar_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(ARCHIVE_INFO_FILE), "{not json").unwrap();
        assert!(matches!(
            ArchiveInfo::load(dir.path()),
            Err(Error::InfoRecord { .. })
        ));
        assert!(!ArchiveInfo::validates(dir.path(), "abc"));
    }
}
