use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::downloader::ATTACHMENTS_DIR;

/// Top-level export files that never carry attachments.
pub const EXCLUDED_FILES: &[&str] = &[
    sev_archive::ARCHIVE_INFO_FILE,
    "canvases.json",
    "channels.json",
    "huddle_transcripts.json",
    "integration_logs.json",
    "lists.json",
];

/// Structured-data files under `root`, in file-name order.
///
/// The mirrored attachment tree is not descended into. Unreadable entries are
/// logged and skipped.
pub fn scan(root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == ATTACHMENTS_DIR))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_candidate(entry.path()))
        .map(|entry| entry.into_path())
}

pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(OsStr::to_str) else {
        return false;
    };
    path.extension() == Some(OsStr::new("json")) && !EXCLUDED_FILES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[]").unwrap();
    }

    #[test]
    fn finds_channel_days_in_order() {
        let dir = tempdir().unwrap();
        for rel in [
            "random/2021-01-02.json",
            "general/2021-01-02.json",
            "general/2021-01-01.json",
            "channels.json",
            "users.json",
            "general/notes.txt",
            ".archive_info.json",
        ] {
            touch(dir.path(), rel);
        }

        let found: Vec<_> = scan(dir.path())
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("general/2021-01-01.json"),
                PathBuf::from("general/2021-01-02.json"),
                PathBuf::from("random/2021-01-02.json"),
                PathBuf::from("users.json"),
            ]
        );
    }

    #[test]
    fn attachment_tree_not_scanned() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "files/T1-F1/url_private/data.json");
        touch(dir.path(), "general/2021-01-01.json");

        assert_eq!(scan(dir.path()).count(), 1);
    }

    #[test]
    fn exclusions_match_whole_names() {
        assert!(!is_candidate(Path::new("x/channels.json")));
        assert!(is_candidate(Path::new("x/my-channels.json")));
        assert!(!is_candidate(Path::new("x/README")));
    }
}
