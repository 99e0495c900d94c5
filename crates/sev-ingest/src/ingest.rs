use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use sev_archive::{ArchiveInfo, ensure_zip, extract_file};
use sev_fetch::{Fetcher, HttpClient};
use sev_fs::Workspace;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::downloader::AssetDownloader;
use crate::error::{IngestError, Result};
use crate::export_info::ExportInfo;
use crate::report::IngestReport;

/// Result of [`Ingestor::ingest`].
#[derive(Clone, Debug)]
pub struct Ingested {
    /// Self-contained extraction directory.
    pub path: PathBuf,
    pub report: IngestReport,
}

/// Turns export archives into cached, self-contained directories.
///
/// Each distinct archive (content plus tool version) is extracted once into
/// `<cache_root>/<hash>`. Work happens in a private staging directory that is
/// renamed into place only after every step succeeded, so a directory at the
/// cache path is either complete or absent.
pub struct Ingestor<C: HttpClient> {
    config: IngestConfig,
    fetcher: Fetcher<C>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<C: HttpClient> Ingestor<C> {
    pub fn new(config: IngestConfig, client: C) -> Self {
        Self {
            config,
            fetcher: Fetcher::new(client),
            locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    pub async fn ingest(&self, source: &Path) -> Result<Ingested> {
        self.ingest_with_cancel(source, CancellationToken::new()).await
    }

    /// [`Ingestor::ingest`], abandoning the work when `cancel` fires. A
    /// cancelled ingestion leaves nothing in the cache.
    pub async fn ingest_with_cancel(&self, source: &Path, cancel: CancellationToken) -> Result<Ingested> {
        if source.is_dir() {
            let path = dunce::canonicalize(source).map_err(IngestError::io(source))?;
            debug!(path = %path.display(), "source is already extracted");
            return Ok(Ingested {
                path,
                report: IngestReport::cache_hit(),
            });
        }

        let hash = {
            let source = source.to_path_buf();
            let version = self.config.version.clone();
            tokio::task::spawn_blocking(move || identify(&source, &version)).await??
        };

        let lock = Arc::clone(&self.locks.entry(hash.clone()).or_default());
        let result = {
            let _guard = lock.lock().await;
            self.ingest_locked(source, &hash, &cancel).await
        };
        drop(lock);
        self.locks.remove_if(&hash, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn ingest_locked(&self, source: &Path, hash: &str, cancel: &CancellationToken) -> Result<Ingested> {
        let prepared = {
            let cache_root = self.config.cache_root.clone();
            let hash = hash.to_string();
            tokio::task::spawn_blocking(move || prepare(&cache_root, &hash)).await??
        };
        let workspace = match prepared {
            Prepared::Cached(destination) => {
                info!(%hash, path = %destination.display(), "archive already cached");
                return Ok(Ingested {
                    path: destination,
                    report: IngestReport::cache_hit(),
                });
            }
            Prepared::Staged(workspace) => workspace,
        };
        let destination = workspace.destination().to_path_buf();

        let populated = self.populate(source, hash, &workspace, cancel).await;
        let report = match populated {
            Ok(report) => report,
            Err(e) => {
                tokio::task::spawn_blocking(move || drop(workspace)).await?;
                return Err(e);
            }
        };

        let committed = {
            let hash = hash.to_string();
            let source = source.to_path_buf();
            tokio::task::spawn_blocking(move || publish(workspace, &hash, &source)).await??
        };
        if !committed {
            info!(%hash, "archive cached concurrently by another process");
            return Ok(Ingested {
                path: destination,
                report: IngestReport::cache_hit(),
            });
        }

        info!(
            %hash,
            path = %destination.display(),
            downloaded = report.downloaded,
            failures = report.download_failures.len(),
            "archive ingested"
        );
        Ok(Ingested {
            path: destination,
            report,
        })
    }

    /// Extract `source` into the workspace and mirror its attachments.
    async fn populate(
        &self,
        source: &Path,
        hash: &str,
        workspace: &Workspace,
        cancel: &CancellationToken,
    ) -> Result<IngestReport> {
        info!(%hash, source = %source.display(), "extracting archive");
        let archive_report = {
            let source = source.to_path_buf();
            let staging = workspace.path().to_path_buf();
            tokio::task::spawn_blocking(move || extract_file(&source, &staging)).await??
        };
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let mut report = AssetDownloader::new(&self.fetcher, &self.config)
            .publish_to(workspace.destination())
            .process_archive(workspace.path(), cancel)
            .await?;
        report.extracted_entries = archive_report.entry_count;
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        Ok(report)
    }

    /// Ingest `source` and describe it.
    pub async fn export_info(&self, source: &Path) -> Result<ExportInfo> {
        let ingested = self.ingest(source).await?;
        Ok(ExportInfo::from_source(source, ingested.path))
    }
}

enum Prepared {
    Cached(PathBuf),
    Staged(Workspace),
}

/// Resolve `<cache_root>/<hash>` to an absolute path. A valid entry is reused;
/// anything else there is removed and a staging workspace is opened beside it.
fn prepare(cache_root: &Path, hash: &str) -> Result<Prepared> {
    std::fs::create_dir_all(cache_root).map_err(IngestError::io(cache_root))?;
    let cache_root = dunce::canonicalize(cache_root).map_err(IngestError::io(cache_root))?;
    let destination = cache_root.join(hash);

    if ArchiveInfo::validates(&destination, hash) {
        return Ok(Prepared::Cached(destination));
    }
    if destination.exists() {
        warn!(%hash, path = %destination.display(), "removing incomplete cache entry");
        std::fs::remove_dir_all(&destination).map_err(IngestError::io(&destination))?;
    }
    Ok(Prepared::Staged(Workspace::beside(&destination)?))
}

/// Record the sidecar and move the workspace into place. `false` when another
/// process committed a valid entry first.
fn publish(workspace: Workspace, hash: &str, source: &Path) -> Result<bool> {
    let destination = workspace.destination().to_path_buf();
    ArchiveInfo::new(hash, source).store(workspace.path())?;
    match workspace.commit() {
        Ok(()) => Ok(true),
        Err(sev_fs::Error::AlreadyExists { .. }) if ArchiveInfo::validates(&destination, hash) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Cache key of a zip archive. Anything that is not a zip is rejected before
/// it is hashed.
fn identify(source: &Path, version: &str) -> Result<String> {
    let mut file = File::open(source).map_err(IngestError::io(source))?;
    ensure_zip(source, &mut file)?;
    drop(file);
    Ok(sev_verify::hash_file(source, version.as_bytes())?)
}
