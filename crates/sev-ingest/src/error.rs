use std::io;
use std::path::PathBuf;

use sev_fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("'{path}' is neither a directory nor a zip archive")]
    InvalidArchiveFormat { path: PathBuf },

    #[error("archive entry name '{entry}' is not valid UTF-8")]
    FilenameEncoding { entry: String },

    #[error("failed to download {url}: {source}")]
    Download { url: String, source: FetchError },

    #[error("'{path}' is not well-formed JSON: {source}")]
    StructuredDataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("'{path}' cannot be decoded as {encoding}")]
    TextDecoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("ingestion cancelled")]
    Cancelled,

    #[error(transparent)]
    Archive(sev_archive::Error),

    #[error(transparent)]
    Fs(#[from] sev_fs::Error),

    #[error(transparent)]
    Hash(#[from] sev_verify::VerificationError),

    #[error("I/O error at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Whether running the same ingestion again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Download { source, .. } => source.is_retryable(),
            Self::Cancelled | Self::Io { .. } | Self::Join(_) => true,
            Self::Archive(sev_archive::Error::Io(_)) => true,
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

impl From<sev_archive::Error> for IngestError {
    fn from(e: sev_archive::Error) -> Self {
        match e {
            sev_archive::Error::UnsupportedFormat { path, .. } => Self::InvalidArchiveFormat { path },
            sev_archive::Error::FilenameEncoding { lossy, .. } => Self::FilenameEncoding { entry: lossy },
            other => Self::Archive(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_errors_map_to_ingest_kinds() {
        let unsupported = sev_archive::Error::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            detected: None,
        };
        assert!(matches!(
            IngestError::from(unsupported),
            IngestError::InvalidArchiveFormat { .. }
        ));

        let encoding = sev_archive::Error::FilenameEncoding {
            raw: vec![0xff],
            lossy: "\u{fffd}".into(),
        };
        assert!(matches!(
            IngestError::from(encoding),
            IngestError::FilenameEncoding { .. }
        ));
    }

    #[test]
    fn retry_classification() {
        let transient = IngestError::Download {
            url: "https://files.example.com/a".into(),
            source: FetchError::Status {
                url: "https://files.example.com/a".into(),
                status: 502,
            },
        };
        assert!(transient.is_retryable());
        assert!(IngestError::Cancelled.is_retryable());
        assert!(
            !IngestError::InvalidArchiveFormat {
                path: PathBuf::from("a")
            }
            .is_retryable()
        );
    }
}
