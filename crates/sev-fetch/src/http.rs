use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects themselves and must report a non-success
/// status as [`FetchError::Status`](crate::FetchError::Status) rather than
/// streaming an error page.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - [`MemoryClient`](crate::MemoryClient): canned responses for tests and offline runs
pub trait HttpClient: Send + Sync {
    /// Open a streaming GET and return the response body.
    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes>>>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::{Client, Proxy, Url};

    use super::*;
    use crate::error::FetchError;

    /// Settings for building a [`ReqwestClient`].
    #[derive(Clone, Debug, Default)]
    pub struct ClientSettings {
        pub proxies: Vec<Url>,
        pub connect_timeout: Option<Duration>,
        pub user_agent: Option<String>,
    }

    impl ClientSettings {
        pub fn build(self) -> Result<ReqwestClient> {
            let mut builder = Client::builder();

            let (secure, insecure): (Vec<Url>, Vec<Url>) =
                self.proxies.into_iter().partition(|u| u.scheme() == "https");
            for u in secure {
                builder = builder.proxy(Proxy::https(u.as_str()).map_err(|e| {
                    FetchError::Client(format!("invalid proxy URL {u}: {e}"))
                })?);
            }
            for u in insecure {
                builder = builder.proxy(Proxy::http(u.as_str()).map_err(|e| {
                    FetchError::Client(format!("invalid proxy URL {u}: {e}"))
                })?);
            }

            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(agent) = self.user_agent {
                builder = builder.user_agent(agent);
            }

            let client = builder
                .build()
                .map_err(|e| FetchError::Client(e.to_string()))?;
            Ok(ReqwestClient { client })
        }
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self> {
            ClientSettings::default().build()
        }
    }

    fn map_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_builder() {
            FetchError::InvalidUrl(url.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    impl HttpClient for ReqwestClient {
        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<BoxStream<'static, Result<Bytes>>> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await.map_err(|e| map_error(url, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let owned_url = url.to_string();
            let stream = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| map_error(&owned_url, e)));
            Ok(Box::pin(stream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSettings, ReqwestClient};
