use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures_util::stream;

use crate::error::{FetchError, Result};
use crate::http::{BoxStream, HttpClient};

const CHUNK: usize = 8192;

#[derive(Clone, Debug)]
enum Route {
    Body(Bytes),
    Status(u16),
    /// Never answers; exercises timeouts and cancellation.
    Stall,
}

/// Serves canned responses from memory and counts requests.
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MemoryClient {
    routes: HashMap<String, Route>,
    calls: AtomicUsize,
    per_url: Mutex<HashMap<String, usize>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.routes.insert(url.into(), Route::Body(body.into()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.routes.insert(url.into(), Route::Status(status));
        self
    }

    #[must_use]
    pub fn with_stall(mut self, url: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Route::Stall);
        self
    }

    /// Total requests served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests served for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.per_url
            .lock()
            .map(|m| m.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl HttpClient for MemoryClient {
    async fn stream(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<BoxStream<'static, Result<Bytes>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut per_url) = self.per_url.lock() {
            *per_url.entry(url.to_string()).or_default() += 1;
        }

        match self.routes.get(url).cloned() {
            Some(Route::Body(body)) => {
                let chunks: Vec<Result<Bytes>> = (0..body.len())
                    .step_by(CHUNK)
                    .map(|start| Ok(body.slice(start..(start + CHUNK).min(body.len()))))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some(Route::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Route::Stall) => futures_util::future::pending().await,
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
