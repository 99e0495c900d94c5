use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Most restrictive common path ceiling (Windows `MAX_PATH`).
pub const MAX_PATH_LEN: usize = 260;

/// Reserved for the separator between parent and name and the terminator.
pub const PATH_SEPARATOR_OVERHEAD: usize = 2;

/// Longest path, in characters, that [`truncate_path`] will return.
pub const PATH_CEILING: usize = MAX_PATH_LEN - PATH_SEPARATOR_OVERHEAD;

/// Shorten `path` so that it fits within [`PATH_CEILING`] characters.
///
/// Only the file stem is cut. The parent directory and the extension are kept
/// byte for byte, so a truncated path lands in the same directory with the same
/// type. Paths already within the ceiling are returned unchanged, which makes
/// the function idempotent.
///
/// Fails with [`Error::PathTooLong`] when the parent and extension alone leave
/// no room for even one character of stem.
pub fn truncate_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    truncate_path_to(path, PATH_CEILING)
}

/// [`truncate_path`] with an explicit ceiling.
pub fn truncate_path_to(path: impl AsRef<Path>, ceiling: usize) -> Result<PathBuf> {
    let path = path.as_ref();
    if char_len(path) <= ceiling {
        return Ok(path.to_path_buf());
    }

    let parent = path.parent().ok_or_else(|| Error::NoParent {
        path: path.to_path_buf(),
    })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let used = char_len(parent) + separator_len(parent) + suffix.chars().count();
    let stem_len = ceiling.checked_sub(used).filter(|n| *n > 0).ok_or_else(|| {
        Error::PathTooLong {
            path: path.to_path_buf(),
            limit: ceiling,
        }
    })?;

    let truncated: String = stem.chars().take(stem_len).collect();
    Ok(parent.join(truncated + &suffix))
}

fn char_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

fn separator_len(parent: &Path) -> usize {
    if parent.as_os_str().is_empty() { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from("C:\\cache\\abc\\files\\T1-F1\\url_private")
        } else {
            PathBuf::from("/cache/abc/files/T1-F1/url_private")
        }
    }

    #[test]
    fn short_path_unchanged() {
        let path = base().join("report.pdf");
        assert_eq!(truncate_path(&path).unwrap(), path);
    }

    #[test]
    fn long_stem_truncated_to_ceiling() {
        let name = format!("{}.png", "x".repeat(400));
        let path = base().join(name);

        let result = truncate_path(&path).unwrap();

        assert_eq!(char_len(&result), PATH_CEILING);
        assert_eq!(result.parent(), path.parent());
        assert_eq!(result.extension().unwrap(), "png");
    }

    #[test]
    fn exceeding_by_fifty_lands_exactly_on_ceiling() {
        let parent_len = char_len(&base()) + 1;
        let stem = "a".repeat(PATH_CEILING - parent_len - 4 + 50);
        let path = base().join(format!("{stem}.txt"));
        assert_eq!(char_len(&path), PATH_CEILING + 50);

        let result = truncate_path(&path).unwrap();
        assert_eq!(char_len(&result), PATH_CEILING);
        assert!(result.to_string_lossy().ends_with(".txt"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let name = format!("{}.txt", "\u{451}".repeat(300));
        let result = truncate_path(base().join(name)).unwrap();
        assert_eq!(char_len(&result), PATH_CEILING);
    }

    #[test]
    fn truncation_is_idempotent() {
        let path = base().join(format!("{}.json", "z".repeat(500)));
        let once = truncate_path(&path).unwrap();
        let twice = truncate_path(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn no_room_for_stem_is_an_error() {
        let parent = base().join("p".repeat(PATH_CEILING));
        let result = truncate_path(parent.join("file.txt"));
        assert!(matches!(result, Err(Error::PathTooLong { .. })));
    }

    #[test]
    fn extensionless_name_truncated() {
        let path = base().join("n".repeat(300));
        let result = truncate_path(&path).unwrap();
        assert_eq!(char_len(&result), PATH_CEILING);
        assert!(result.extension().is_none());
    }

    #[test]
    fn explicit_ceiling() {
        let result = truncate_path_to("dir/abcdefghij.txt", 12).unwrap();
        assert_eq!(result, Path::new("dir/abcd.txt"));
    }
}
