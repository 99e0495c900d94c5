//! Streaming HTTP downloads for attachment mirroring.
//!
//! [`Fetcher`] drives an [`HttpClient`] and places each body on disk
//! atomically, with a per-attempt timeout and exponential backoff between
//! retries. [`MemoryClient`] answers from canned routes for offline use.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod memory;
pub mod options;
pub mod retry;

pub use error::{FetchError, Result};
pub use fetcher::Fetcher;
#[cfg(feature = "reqwest")]
pub use http::{ClientSettings, ReqwestClient};
pub use http::{BoxStream, HttpClient};
pub use memory::MemoryClient;
pub use options::FetchOptions;
pub use retry::retry_delay;
