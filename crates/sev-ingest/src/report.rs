use std::path::PathBuf;

use serde::Serialize;

/// What one ingestion did.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IngestReport {
    /// The extraction was already cached; nothing below ran.
    pub cache_hit: bool,
    pub extracted_entries: usize,
    pub downloaded: usize,
    /// Downloads satisfied by a file already on disk.
    pub reused: usize,
    /// External, hidden, tombstoned or unidentifiable attachments.
    pub skipped_attachments: usize,
    pub download_failures: Vec<DownloadFailure>,
    pub skipped_files: Vec<SkippedFile>,
    pub rewritten_files: usize,
}

impl IngestReport {
    pub fn cache_hit() -> Self {
        Self {
            cache_hit: true,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.download_failures.is_empty() && self.skipped_files.is_empty()
    }
}

/// An attachment left pointing at its remote URL.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadFailure {
    pub url: String,
    pub destination: PathBuf,
    pub reason: String,
    pub retryable: bool,
}

/// A structured-data file left untouched.
#[derive(Clone, Debug, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}
