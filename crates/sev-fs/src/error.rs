use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to move staged directory into '{path}': {source}")]
    ReplaceDir { path: PathBuf, source: io::Error },

    #[error("destination already exists: '{path}'")]
    AlreadyExists { path: PathBuf },

    #[error("path '{path}' cannot be shortened below {limit} characters")]
    PathTooLong { path: PathBuf, limit: usize },

    #[error("path has no parent directory: '{path}'")]
    NoParent { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
