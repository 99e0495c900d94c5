use crate::primitives::{ReplaceDirOptions, move_dir_into_place};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A private staging directory that either becomes `destination` in one rename
/// or disappears.
///
/// Dropping an uncommitted workspace deletes the staging directory together
/// with everything written into it, so an aborted or cancelled run leaves no
/// half-populated tree behind.
pub struct Workspace {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl Workspace {
    pub fn new(staging_dir: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Self> {
        let staging_path = staging_dir.as_ref().to_path_buf();
        let destination_path = destination.as_ref().to_path_buf();

        std::fs::create_dir_all(&staging_path).map_err(|e| Error::Write {
            path: staging_path.clone(),
            source: e,
        })?;

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    /// Staging directory named after `destination`, placed beside it so the
    /// final rename never crosses a filesystem boundary.
    pub fn beside(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref();
        let parent = destination.parent().ok_or_else(|| Error::NoParent {
            path: destination.to_path_buf(),
        })?;
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = parent.join(format!(".staging-{name}-{}", uuid::Uuid::new_v4()));
        Self::new(staging, destination)
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Move the staged tree to its destination. Fails with
    /// [`Error::AlreadyExists`] if another writer got there first, in which
    /// case the staged copy is discarded on drop.
    pub fn commit(mut self) -> Result<()> {
        move_dir_into_place(
            &self.staging_path,
            &self.destination_path,
            ReplaceDirOptions::default(),
        )?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_dir_all(&self.staging_path);
        }
    }
}
