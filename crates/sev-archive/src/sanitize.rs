use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an entry name against `base`, rejecting anything that would land
/// outside of it.
///
/// Only the entry name is normalized; `base` is joined as given, so relative
/// bases keep their leading `..` components.
pub fn sanitize_entry_path<P: AsRef<Path>, B: AsRef<Path>>(
    entry_path: P,
    base: B,
) -> Result<SanitizedPath> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();

    let relative = if entry_path.has_root() {
        None
    } else {
        normalize_entry(entry_path)
    };
    let Some(relative) = relative else {
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved: base.join(entry_path),
        });
    };

    Ok(SanitizedPath {
        original: entry_path.to_path_buf(),
        resolved: base.join(relative),
    })
}

/// Resolve `.` and `..` lexically. `None` when the path climbs above its
/// start or carries a root or prefix.
fn normalize_entry(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
            Component::CurDir => {}
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_base_path() -> &'static Path {
        if cfg!(windows) {
            Path::new("C:/cache/3f2a")
        } else {
            Path::new("/cache/3f2a")
        }
    }

    #[test]
    fn basic_path_sanitization() {
        let result = sanitize_entry_path("general/2024-01-01.json", test_base_path()).unwrap();
        assert_eq!(result.original, Path::new("general/2024-01-01.json"));
        assert_eq!(
            result.resolved.strip_prefix(test_base_path()).unwrap(),
            Path::new("general/2024-01-01.json")
        );
    }

    #[test]
    fn zip_slip_absolute_rejected() {
        let malicious_path = if cfg!(windows) { "C:\\etc\\passwd" } else { "/etc/passwd" };
        let result = sanitize_entry_path(malicious_path, test_base_path());
        assert!(matches!(result, Err(Error::ZipSlip { .. })));
    }

    #[test]
    fn zip_slip_parent_escape_rejected() {
        let result = sanitize_entry_path("../../outside.json", test_base_path());
        assert!(matches!(result, Err(Error::ZipSlip { .. })));
    }

    #[test]
    fn inner_parent_components_resolved() {
        let result = sanitize_entry_path("a/../b/./c.json", test_base_path()).unwrap();
        assert_eq!(
            result.resolved.strip_prefix(test_base_path()).unwrap(),
            Path::new("b/c.json")
        );
    }

    #[test]
    fn relative_base_with_current_dir() {
        let result = sanitize_entry_path("general/a.json", "./cache/3f2a").unwrap();
        assert_eq!(result.resolved, Path::new("./cache/3f2a/general/a.json"));
    }

    #[test]
    fn relative_base_keeps_parent_components() {
        let result = sanitize_entry_path("general/a.json", "../../out/dest").unwrap();
        assert_eq!(result.resolved, Path::new("../../out/dest/general/a.json"));
    }

    #[test]
    fn entry_returning_to_base_is_allowed() {
        let result = sanitize_entry_path("general/../users.json", "../dest").unwrap();
        assert_eq!(result.resolved, Path::new("../dest/users.json"));
    }

    #[test]
    fn path_normalization() {
        let result = normalize_entry(Path::new("foo//bar/baz/../qux")).unwrap();
        assert_eq!(result, Path::new("foo/bar/qux"));
        assert!(normalize_entry(Path::new("a/../../b")).is_none());
    }
}
