use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::http::HttpClient;
use crate::options::FetchOptions;
use crate::retry::retry_delay;

/// Downloads URLs to files on disk.
///
/// Bytes are streamed into a temporary file beside the destination and renamed
/// into place only after the body has been fully received. A failed, timed out
/// or dropped download leaves nothing at the destination.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch `url` into `destination`, returning the number of bytes written.
    ///
    /// Missing parent directories are created. An existing file at
    /// `destination` is replaced.
    pub async fn fetch(&self, url: &str, destination: &Path, options: &FetchOptions) -> Result<u64> {
        if destination.is_dir() {
            return Err(FetchError::DestinationIsDirectory(destination.to_path_buf()));
        }
        let parent = parent_of(destination);
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|source| FetchError::Io {
                path: parent.clone(),
                source,
            })?;

        let mut retry_count = 0;
        loop {
            match self.attempt(url, destination, &parent, options).await {
                Ok(bytes) => {
                    debug!(url, bytes, path = %destination.display(), "download complete");
                    return Ok(bytes);
                }
                Err(e) if e.is_retryable() && retry_count < options.max_retries => {
                    let delay = retry_delay(retry_count, options.retry_backoff);
                    warn!(url, error = %e, attempt = retry_count + 1, ?delay, "download failed, retrying");
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        parent: &Path,
        options: &FetchOptions,
    ) -> Result<u64> {
        let download = self.download(url, parent, options);
        let (temp_path, bytes) = match options.timeout {
            Some(after) => tokio::time::timeout(after, download)
                .await
                .map_err(|_| FetchError::Timeout {
                    url: url.to_string(),
                    after,
                })??,
            None => download.await?,
        };

        temp_path
            .persist(destination)
            .map_err(|e| FetchError::Io {
                path: destination.to_path_buf(),
                source: e.error,
            })?;
        Ok(bytes)
    }

    async fn download(&self, url: &str, parent: &Path, options: &FetchOptions) -> Result<(TempPath, u64)> {
        let mut stream = self.client.stream(url, &options.headers).await?;

        let io_err = |source| FetchError::Io {
            path: parent.to_path_buf(),
            source,
        };
        let (file, temp_path) = NamedTempFile::new_in(parent).map_err(io_err)?.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_err)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        drop(file);

        Ok((temp_path, bytes))
    }
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(parent_of(Path::new("file.bin")), PathBuf::from("."));
        assert_eq!(parent_of(Path::new("a/file.bin")), PathBuf::from("a"));
    }
}
