use opv_fs::{self as fs, FsError};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tracing::{debug, instrument};
use url::Url;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("HTTP request to '{url}' failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request to '{url}' returned {status}")]
    Status { url: Url, status: StatusCode },

    #[error("HTTP stream from '{url}' failed: {source}")]
    Stream {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("File write error for '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] FsError),
}

#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, HttpError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(HttpError::BuildClient)?;
        Ok(HttpClient { client })
    }

    /// GET `url`, failing on transport errors and on any non-2xx status.
    async fn get(&self, url: &Url) -> Result<Response, HttpError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| HttpError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        debug!(%url, %status, "response");
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.clone(),
                status,
            });
        }

        Ok(resp)
    }

    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_content(&self, url: &Url) -> Result<String, HttpError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| HttpError::Stream {
                url: url.clone(),
                source,
            })
    }

    /// Stream `url` into `file_path`. The body lands in a `.tmp` sibling first
    /// and is renamed into place once complete.
    #[instrument(skip(self, file_path), fields(url = %url))]
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        url: &Url,
        file_path: P,
    ) -> Result<(), HttpError> {
        let file_path = file_path.as_ref();

        let mut temp_file = file_path.as_os_str().to_owned();
        temp_file.push(".tmp");
        let temp_file = PathBuf::from(temp_file);

        if fs::remove_file_if_exists(&temp_file).await? {
            debug!(path = %temp_file.display(), "removed stale partial download");
        }

        let resp = self.get(url).await?;

        let mut file = fs::create_file(&temp_file).await?;

        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|source| HttpError::Stream {
                url: url.clone(),
                source,
            })?;
            file.write_all(&bytes)
                .await
                .map_err(|source| HttpError::Write {
                    path: temp_file.clone(),
                    source,
                })?;
        }

        file.flush().await.map_err(|source| HttpError::Write {
            path: temp_file.clone(),
            source,
        })?;

        fs::rename_file(&temp_file, file_path).await?;

        Ok(())
    }
}
