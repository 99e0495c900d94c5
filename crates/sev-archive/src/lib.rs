//! Export archive extraction.
//!
//! # Architecture
//!
//! - `format.rs` - Magic-number detection
//! - `names.rs` - Legacy entry-name decoding
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - Zip extraction
//! - `info.rs` - Provenance sidecar written into each extraction directory

pub use error::{Error, Result};
pub use extract::{ensure_zip, extract_file, extract_zip};
pub use format::{ArchiveFormat, detect_format, detect_from_reader};
pub use info::{ARCHIVE_INFO_FILE, ArchiveInfo};
pub use names::decode_entry_name;
pub use report::{ArchiveReport, ExtractedEntry};
pub use sanitize::{SanitizedPath, sanitize_entry_path};

mod error;
mod extract;
mod format;
mod info;
mod names;
mod report;
mod sanitize;
