use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Overrides the cache root when set.
pub const CACHE_ENV: &str = "SLACKVIEWER_TEMP_PATH";

const APP_DIR: &str = "sev";

pub fn user_home() -> Option<PathBuf> {
    home::home_dir()
}

pub fn user_cache() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("Cache"))
    }
    #[cfg(target_os = "macos")]
    {
        user_home().map(|p| p.join("Library/Caches"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| user_home().map(|p| p.join(".cache")))
    }
}

/// Cache root from the environment: [`CACHE_ENV`], then the per-user cache
/// directory, then the system temp directory.
pub fn default_cache_root() -> PathBuf {
    cache_root_from(env::var_os(CACHE_ENV), user_cache())
}

fn cache_root_from(explicit: Option<OsString>, user_cache: Option<PathBuf>) -> PathBuf {
    match explicit.filter(|v| !v.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => user_cache
            .unwrap_or_else(env::temp_dir)
            .join(APP_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let root = cache_root_from(Some("/srv/sev".into()), Some(PathBuf::from("/home/u/.cache")));
        assert_eq!(root, PathBuf::from("/srv/sev"));
    }

    #[test]
    fn empty_variable_ignored() {
        let root = cache_root_from(Some(OsString::new()), Some(PathBuf::from("/home/u/.cache")));
        assert_eq!(root, PathBuf::from("/home/u/.cache/sev"));
    }

    #[test]
    fn falls_back_to_temp() {
        assert_eq!(cache_root_from(None, None), env::temp_dir().join("sev"));
    }
}
