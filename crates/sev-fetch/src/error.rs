//! Error types for sev-fetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("file I/O error at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("destination path is a directory: '{0}'")]
    DestinationIsDirectory(PathBuf),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Transient failures worth another attempt: transport errors, timeouts,
    /// throttling and server-side errors. Client errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
