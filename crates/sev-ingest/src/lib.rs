//! Export bundle ingestion.
//!
//! An [`Ingestor`] takes a zip export (or an already-extracted directory) and
//! produces a self-contained directory in the cache:
//!
//! 1. the archive is hashed together with the tool version,
//! 2. a cached extraction carrying a matching [`ArchiveInfo`] sidecar is
//!    returned as is,
//! 3. otherwise the archive is extracted into a staging directory, every
//!    structured-data file found by [`scan`] has its attachments mirrored
//!    under `files/` by the [`AssetDownloader`], the sidecar is written and
//!    the staging directory is renamed into place.
//!
//! [`ArchiveInfo`]: sev_archive::ArchiveInfo

mod attachment;
mod config;
mod dirs;
mod downloader;
mod error;
mod export_info;
mod ingest;
mod report;
mod scanner;

pub use attachment::{AttachmentMode, AttachmentRecord, REFERENCE_FIELDS, is_remote};
pub use config::{DownloadPolicy, IngestConfig, TOOL_VERSION, TextCodecs};
pub use dirs::{CACHE_ENV, default_cache_root, user_cache};
pub use downloader::{ATTACHMENTS_DIR, AssetDownloader};
pub use error::{IngestError, Result};
pub use export_info::ExportInfo;
pub use ingest::{Ingested, Ingestor};
pub use report::{DownloadFailure, IngestReport, SkippedFile};
pub use scanner::{EXCLUDED_FILES, is_candidate, scan};
