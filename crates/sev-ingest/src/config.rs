use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::{Encoding, IBM866, UTF_8};
use sev_fetch::FetchOptions;

use crate::dirs::default_cache_root;

/// Salt mixed into every archive hash. Changing it invalidates the cache.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a failed attachment download does to the rest of the ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DownloadPolicy {
    /// Log it, keep the remote URL in place and carry on.
    #[default]
    Continue,
    /// Abort the ingestion; nothing is committed to the cache.
    FailFast,
}

/// Text encodings used to read and rewrite structured-data files.
///
/// Exports have historically been read as IBM866 and written back as UTF-8
/// ([`TextCodecs::legacy`]). That pairing corrupts non-ASCII text, so the
/// default reads and writes UTF-8 and a mismatch is logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextCodecs {
    pub read: &'static Encoding,
    pub write: &'static Encoding,
}

impl Default for TextCodecs {
    fn default() -> Self {
        Self {
            read: UTF_8,
            write: UTF_8,
        }
    }
}

impl TextCodecs {
    pub fn legacy() -> Self {
        Self {
            read: IBM866,
            write: UTF_8,
        }
    }

    /// Build from WHATWG labels such as `"utf-8"` or `"ibm866"`.
    pub fn from_labels(read: &str, write: &str) -> Option<Self> {
        Some(Self {
            read: Encoding::for_label(read.as_bytes())?,
            write: Encoding::for_label(write.as_bytes())?,
        })
    }

    pub fn is_symmetric(&self) -> bool {
        self.read == self.write
    }

    /// Strict decode; `None` on malformed input. A leading BOM of the read
    /// encoding is dropped.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let (text, had_errors) = self.read.decode_with_bom_removal(bytes);
        (!had_errors).then_some(text)
    }

    /// Encode for writing. The flag reports characters the write encoding
    /// cannot represent.
    pub fn encode<'a>(&self, text: &'a str) -> (Cow<'a, [u8]>, bool) {
        let (bytes, _, unmappable) = self.write.encode(text);
        (bytes, unmappable)
    }
}

impl fmt::Display for TextCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.read.name(), self.write.name())
    }
}

/// Settings for an [`Ingestor`](crate::Ingestor).
///
/// # Examples
///
/// ```
/// use sev_ingest::{DownloadPolicy, IngestConfig};
///
/// let config = IngestConfig::new("/var/cache/sev")
///     .max_concurrent_downloads(8)
///     .download_policy(DownloadPolicy::FailFast);
/// ```
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Directory holding one extraction per archive hash.
    pub cache_root: PathBuf,

    /// Hash salt. Default: [`TOOL_VERSION`]
    pub version: String,

    /// Width of the per-file download pool. Default: 4
    pub max_concurrent_downloads: usize,

    /// Applied to every attachment download. Default timeout: 60s
    pub fetch: FetchOptions,

    pub codecs: TextCodecs,

    pub download_policy: DownloadPolicy,
}

impl IngestConfig {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            version: TOOL_VERSION.to_string(),
            max_concurrent_downloads: 4,
            fetch: FetchOptions::default(),
            codecs: TextCodecs::default(),
            download_policy: DownloadPolicy::default(),
        }
    }

    /// Configuration rooted at [`default_cache_root`].
    pub fn from_env() -> Self {
        Self::new(default_cache_root())
    }

    #[must_use]
    pub fn cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn max_concurrent_downloads(mut self, n: usize) -> Self {
        self.max_concurrent_downloads = n.max(1);
        self
    }

    #[must_use]
    pub fn fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch = self.fetch.timeout(timeout);
        self
    }

    #[must_use]
    pub fn codecs(mut self, codecs: TextCodecs) -> Self {
        self.codecs = codecs;
        self
    }

    #[must_use]
    pub fn download_policy(mut self, policy: DownloadPolicy) -> Self {
        self.download_policy = policy;
        self
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
