use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde_json::Value;
use sev_fetch::{FetchError, Fetcher, HttpClient};
use sev_fs::{AtomicWriteOptions, atomic_write, truncate_path};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attachment::{AttachmentRecord, REFERENCE_FIELDS, is_remote};
use crate::config::{DownloadPolicy, IngestConfig, TextCodecs};
use crate::error::{IngestError, Result};
use crate::report::{DownloadFailure, IngestReport, SkippedFile};
use crate::scanner::scan;

/// Directory under the extraction root that receives mirrored attachments.
pub const ATTACHMENTS_DIR: &str = "files";

/// Attachment identity across the archive: object key and reference field.
type ObjectField = (String, &'static str);

/// One remote reference inside a parsed file.
#[derive(Debug)]
struct Reference {
    item: usize,
    attachment: usize,
    field: &'static str,
    key: String,
    url: String,
    destination: PathBuf,
}

impl Reference {
    fn object_field(&self) -> ObjectField {
        (self.key.clone(), self.field)
    }
}

struct ParsedFile {
    document: Value,
    references: Vec<Reference>,
    skipped: usize,
}

#[derive(Debug)]
struct Job {
    object_field: ObjectField,
    url: String,
    destination: PathBuf,
}

enum Outcome {
    Downloaded(u64),
    Reused,
    Failed(FetchError),
}

#[derive(Clone, Debug)]
enum Resolution {
    Local(PathBuf),
    Remote,
}

/// Mirrors the attachments referenced by an extracted export and rewrites the
/// references to point at the local copies.
///
/// Resolutions are remembered for the lifetime of the downloader, so an
/// attachment referenced from several files is fetched once.
pub struct AssetDownloader<'a, C: HttpClient> {
    fetcher: &'a Fetcher<C>,
    config: &'a IngestConfig,
    published: Option<PathBuf>,
    resolved: HashMap<ObjectField, Resolution>,
}

impl<'a, C: HttpClient> AssetDownloader<'a, C> {
    pub fn new(fetcher: &'a Fetcher<C>, config: &'a IngestConfig) -> Self {
        Self {
            fetcher,
            config,
            published: None,
            resolved: HashMap::new(),
        }
    }

    /// Directory the processed root will be moved to. Attachment paths are
    /// shortened against this location rather than the one being processed.
    pub fn publish_to(mut self, destination: impl Into<PathBuf>) -> Self {
        self.published = Some(destination.into());
        self
    }

    /// Process every structured-data file under `root`.
    ///
    /// Malformed files are recorded and skipped. Download failures are
    /// recorded unless [`DownloadPolicy::FailFast`] is set.
    pub async fn process_archive(&mut self, root: &Path, cancel: &CancellationToken) -> Result<IngestReport> {
        let codecs = self.config.codecs;
        info!(%codecs, "structured-data encodings");
        if !codecs.is_symmetric() {
            warn!(
                read = codecs.read.name(),
                write = codecs.write.name(),
                "structured data is read and written in different encodings"
            );
        }

        let scan_root = root.to_path_buf();
        let files: Vec<PathBuf> = tokio::task::spawn_blocking(move || scan(&scan_root).collect()).await?;
        info!(files = files.len(), "rewriting attachment references");

        let mut report = IngestReport::default();
        for path in files {
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }
            match self.process_file(root, &path, cancel, &mut report).await {
                Ok(()) => {}
                Err(e @ (IngestError::StructuredDataParse { .. } | IngestError::TextDecoding { .. })) => {
                    warn!(path = %path.display(), error = %e, "skipping structured-data file");
                    report.skipped_files.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Download and rewrite the references of one file. The file is only
    /// rewritten when a reference changed.
    pub async fn process_file(
        &mut self,
        root: &Path,
        path: &Path,
        cancel: &CancellationToken,
        report: &mut IngestReport,
    ) -> Result<()> {
        let codecs = self.config.codecs;
        let layout = match &self.published {
            Some(published) => Layout {
                root: root.to_path_buf(),
                published: published.clone(),
            },
            None => Layout::in_place(root),
        };
        let owned_path = path.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || parse_file(&layout, &owned_path, codecs)).await??;
        report.skipped_attachments += parsed.skipped;
        if parsed.references.is_empty() {
            return Ok(());
        }

        let mut queued = HashSet::new();
        let jobs: Vec<Job> = parsed
            .references
            .iter()
            .filter(|r| !self.resolved.contains_key(&r.object_field()) && queued.insert(r.object_field()))
            .map(|r| Job {
                object_field: r.object_field(),
                url: r.url.clone(),
                destination: r.destination.clone(),
            })
            .collect();

        for (job, outcome) in self.run(jobs, cancel).await? {
            let resolution = match outcome {
                Outcome::Downloaded(bytes) => {
                    debug!(url = %job.url, bytes, "attachment downloaded");
                    report.downloaded += 1;
                    Resolution::Local(job.destination)
                }
                Outcome::Reused => {
                    debug!(path = %job.destination.display(), "attachment already present");
                    report.reused += 1;
                    Resolution::Local(job.destination)
                }
                Outcome::Failed(e) => {
                    warn!(url = %job.url, error = %e, "attachment download failed, keeping remote reference");
                    report.download_failures.push(DownloadFailure {
                        url: job.url,
                        destination: job.destination,
                        retryable: e.is_retryable(),
                        reason: e.to_string(),
                    });
                    Resolution::Remote
                }
            };
            self.resolved.insert(job.object_field, resolution);
        }

        let mut document = parsed.document;
        let mut changed = false;
        for reference in &parsed.references {
            let Some(Resolution::Local(local)) = self.resolved.get(&reference.object_field()) else {
                continue;
            };
            let relative = relative_reference(root, local);
            let slot = document
                .get_mut(reference.item)
                .and_then(|item| item.get_mut("files"))
                .and_then(|files| files.get_mut(reference.attachment))
                .and_then(|attachment| attachment.get_mut(reference.field));
            if let Some(slot) = slot {
                if slot.as_str() != Some(relative.as_str()) {
                    *slot = Value::String(relative);
                    changed = true;
                }
            }
        }

        if changed {
            let owned_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || write_document(&owned_path, &document, codecs)).await??;
            report.rewritten_files += 1;
            debug!(path = %path.display(), "references rewritten");
        }
        Ok(())
    }

    async fn run(&self, jobs: Vec<Job>, cancel: &CancellationToken) -> Result<Vec<(Job, Outcome)>> {
        let semaphore = Semaphore::new(self.config.max_concurrent_downloads.max(1));
        let mut futures: FuturesUnordered<_> = jobs
            .into_iter()
            .map(|job| {
                let semaphore = &semaphore;
                async move {
                    let _permit = semaphore.acquire().await.ok();
                    let outcome = self.download(&job).await;
                    (job, outcome)
                }
            })
            .collect();

        let mut results = Vec::with_capacity(futures.len());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(IngestError::Cancelled),
                next = futures.next() => match next {
                    None => break,
                    Some((job, Outcome::Failed(source)))
                        if self.config.download_policy == DownloadPolicy::FailFast =>
                    {
                        return Err(IngestError::Download { url: job.url, source });
                    }
                    Some(result) => results.push(result),
                },
            }
        }
        Ok(results)
    }

    async fn download(&self, job: &Job) -> Outcome {
        if let Ok(metadata) = tokio::fs::metadata(&job.destination).await {
            if metadata.is_file() && metadata.len() > 0 {
                return Outcome::Reused;
            }
        }
        match self.fetcher.fetch(&job.url, &job.destination, &self.config.fetch).await {
            Ok(bytes) => Outcome::Downloaded(bytes),
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// Where attachments are written now and where they will live once published.
struct Layout {
    root: PathBuf,
    published: PathBuf,
}

impl Layout {
    fn in_place(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            published: root.to_path_buf(),
        }
    }

    /// Attachment path under `root`, shortened so that its published
    /// counterpart fits the path ceiling.
    fn attachment(&self, key: &str, field: &str, name: &str) -> sev_fs::Result<PathBuf> {
        let relative = Path::new(ATTACHMENTS_DIR).join(key).join(field).join(name);
        let published = truncate_path(self.published.join(&relative))?;
        let relative = published.strip_prefix(&self.published).unwrap_or(relative.as_path());
        Ok(self.root.join(relative))
    }
}

fn parse_file(layout: &Layout, path: &Path, codecs: TextCodecs) -> Result<ParsedFile> {
    let bytes = std::fs::read(path).map_err(IngestError::io(path))?;
    let text = codecs.decode(&bytes).ok_or_else(|| IngestError::TextDecoding {
        path: path.to_path_buf(),
        encoding: codecs.read.name(),
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| IngestError::StructuredDataParse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut references = Vec::new();
    let mut skipped = 0;
    let items = document.as_array().map(Vec::as_slice).unwrap_or_default();
    for (item_index, item) in items.iter().enumerate() {
        let Some(files) = item.get("files").and_then(Value::as_array) else {
            continue;
        };
        for (attachment_index, attachment) in files.iter().enumerate() {
            let Some(record) = AttachmentRecord::from_value(attachment) else {
                warn!(path = %path.display(), item = item_index, "ignoring malformed attachment");
                skipped += 1;
                continue;
            };
            if record.is_skipped() {
                skipped += 1;
                continue;
            }
            let Some(key) = record.object_key() else {
                warn!(path = %path.display(), item = item_index, "ignoring attachment without id");
                skipped += 1;
                continue;
            };
            let name = record.file_name(&key);

            for field in REFERENCE_FIELDS {
                let Some(url) = attachment.get(field).and_then(Value::as_str) else {
                    continue;
                };
                if url.is_empty() || !is_remote(url) {
                    continue;
                }
                let destination = match layout.attachment(&key, field, &name) {
                    Ok(destination) => destination,
                    Err(e) => {
                        warn!(url, error = %e, "no room for attachment path");
                        continue;
                    }
                };
                references.push(Reference {
                    item: item_index,
                    attachment: attachment_index,
                    field,
                    key: key.clone(),
                    url: url.to_string(),
                    destination,
                });
            }
        }
    }

    Ok(ParsedFile {
        document,
        references,
        skipped,
    })
}

fn write_document(path: &Path, document: &Value, codecs: TextCodecs) -> Result<()> {
    let text = serde_json::to_string_pretty(document).map_err(|source| IngestError::StructuredDataParse {
        path: path.to_path_buf(),
        source,
    })?;
    let (bytes, unmappable) = codecs.encode(&text);
    if unmappable {
        warn!(
            path = %path.display(),
            encoding = codecs.write.name(),
            "characters not representable in the write encoding were escaped"
        );
    }
    atomic_write(path, &bytes, AtomicWriteOptions::new())?;
    Ok(())
}

/// `local` relative to `root`, always `/`-separated.
fn relative_reference(root: &Path, local: &Path) -> String {
    let relative = local.strip_prefix(root).unwrap_or(local);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
