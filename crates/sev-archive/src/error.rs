use std::io;
use std::path::PathBuf;

use crate::format::ArchiveFormat;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{path}' is not a zip archive{}", describe(.detected))]
    UnsupportedFormat {
        path: PathBuf,
        detected: Option<ArchiveFormat>,
    },

    #[error("entry name '{lossy}' is not valid UTF-8")]
    FilenameEncoding { raw: Vec<u8>, lossy: String },

    #[error("zip-slip attack detected: entry '{entry}' resolves to '{resolved}'")]
    ZipSlip { entry: PathBuf, resolved: PathBuf },

    #[error("archive is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("archive info record '{path}' is malformed: {source}")]
    InfoRecord {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fs(#[from] sev_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn describe(detected: &Option<ArchiveFormat>) -> String {
    match detected {
        Some(format) => format!(" (looks like {format})"),
        None => String::new(),
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Corrupted {
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
