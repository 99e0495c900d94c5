use std::sync::Arc;
use std::time::Duration;

/// Configuration for one download.
///
/// # Examples
///
/// ```
/// use sev_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_retries(5)
///     .timeout(Some(Duration::from_secs(30)))
///     .header("Authorization", "Bearer token");
/// ```
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Retries after the initial attempt, for retryable failures only.
    ///
    /// Default: 2
    pub max_retries: u32,

    /// Base delay for exponential backoff; retry N waits `retry_backoff * 2^N`.
    ///
    /// Default: 250ms
    pub retry_backoff: Duration,

    /// Limit on a single attempt, connection through last byte. Expiry counts
    /// as a retryable failure.
    ///
    /// Default: 60s
    pub timeout: Option<Duration>,

    /// Headers sent with every request, including retries.
    pub headers: Arc<[(String, String)]>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
            timeout: Some(Duration::from_secs(60)),
            headers: Arc::new([]),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains() {
        let options = FetchOptions::default()
            .max_retries(0)
            .timeout(None)
            .header("Authorization", "Bearer x")
            .header("User-Agent", "sev");

        assert_eq!(options.max_retries, 0);
        assert!(options.timeout.is_none());
        assert_eq!(options.headers.len(), 2);
        assert_eq!(options.headers[0].0, "Authorization");
    }
}
