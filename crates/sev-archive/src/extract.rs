use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, detect_from_reader};
use crate::names::decode_entry_name;
use crate::report::{ArchiveReport, ExtractedEntry};
use crate::sanitize::sanitize_entry_path;

/// Open `archive` and extract it into `destination`.
///
/// Fails with [`Error::UnsupportedFormat`] unless the file is a zip archive.
pub fn extract_file(archive: &Path, destination: &Path) -> Result<ArchiveReport> {
    let mut file = File::open(archive).map_err(|e| Error::ExtractionFailed {
        path: archive.to_path_buf(),
        source: e,
    })?;
    ensure_zip(archive, &mut file)?;
    extract_zip(file, destination)
}

/// Check the magic number of `reader` without consuming it.
pub fn ensure_zip<R: Read + Seek>(path: &Path, reader: &mut R) -> Result<()> {
    match detect_from_reader(reader)? {
        Some(ArchiveFormat::Zip) => Ok(()),
        detected => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            detected,
        }),
    }
}

/// Extract every entry of a zip archive into `destination`.
///
/// Entry names go through [`decode_entry_name`] before they touch the
/// filesystem; one undecodable name aborts the whole extraction.
pub fn extract_zip<R: Read + Seek>(reader: R, destination: &Path) -> Result<ArchiveReport> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut report = ArchiveReport::default();

    std::fs::create_dir_all(destination).map_err(|e| Error::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let name = decode_entry_name(file.name_raw())?;
        let sanitized = sanitize_entry_path(&name, destination)?;
        let target = sanitized.resolved;
        let is_directory = name.ends_with('/');

        if is_directory {
            create_dir(&target)?;
            debug!(entry = %name, "created directory");
            report.record(ExtractedEntry {
                name,
                target_path: target,
                size: 0,
                is_directory,
            });
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        let mut out = File::create(&target).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: e,
        })?;
        let size = io::copy(&mut file, &mut out).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: e,
        })?;

        debug!(entry = %name, size, "extracted");
        report.record(ExtractedEntry {
            name,
            target_path: target,
            size,
            is_directory,
        });
    }

    info!(
        destination = %destination.display(),
        entries = report.entry_count,
        bytes = report.total_bytes,
        "archive extracted"
    );
    Ok(report)
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
