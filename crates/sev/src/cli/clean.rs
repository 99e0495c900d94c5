use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::settings::{Overrides, Settings};

/// Remove the cache root
#[derive(Debug, clap::Args)]
pub struct Clean {
    /// Actually delete; without it only report what would be removed
    #[arg(long, env = "SEV_CLEAN_WET")]
    pub wet: bool,
}

impl Clean {
    pub fn run(self, settings: &Settings, cache: Option<PathBuf>) -> anyhow::Result<()> {
        let root = settings.cache_root(&Overrides {
            cache_dir: cache,
            ..Overrides::default()
        });

        if !root.exists() {
            println!("nothing to clean at {}", root.display());
            return Ok(());
        }

        if self.wet {
            std::fs::remove_dir_all(&root)
                .with_context(|| format!("failed to remove '{}'", root.display()))?;
            info!(path = %root.display(), "cache removed");
            println!("removed {}", root.display());
        } else {
            for entry in entries(&root)? {
                println!("would remove {}", entry.display());
            }
            println!("run with --wet to delete {}", root.display());
        }
        Ok(())
    }
}

fn entries(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to list '{}'", root.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        std::fs::create_dir_all(root.join("abc")).unwrap();

        Clean { wet: false }
            .run(&Settings::default(), Some(root.clone()))
            .unwrap();
        assert!(root.join("abc").exists());
        assert_eq!(entries(&root).unwrap(), vec![root.join("abc")]);
    }

    #[test]
    fn wet_run_removes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        std::fs::create_dir_all(root.join("abc")).unwrap();

        Clean { wet: true }
            .run(&Settings::default(), Some(root.clone()))
            .unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn missing_root_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        Clean { wet: true }
            .run(&Settings::default(), Some(dir.path().join("absent")))
            .unwrap();
    }
}
