//! Archive access: directory listings and mosaic images.
//!
//! Transport errors (connect, timeout, interrupted body) are retried with
//! exponential backoff. A non-success HTTP status is returned immediately.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ArchiveConfig;

/// Failure talking to the archive.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

/// A downloaded image and its response metadata.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    /// Raw `Last-Modified` header value, if present
    pub last_modified: Option<String>,
}

/// Source of listings and images.
#[async_trait]
pub trait ArchiveClient: Send + Sync {
    /// Fetch an HTML directory index.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch a binary image resource.
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// Retry policy for transport errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_retry_delay(),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// `ArchiveClient` over HTTP.
pub struct HttpArchive {
    client: Client,
    retry: RetryPolicy,
}

impl HttpArchive {
    pub fn new(config: &ArchiveConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let mut attempt = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => return Err(FetchError::Status(response.status().as_u16())),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        return Err(FetchError::Transport(e.to_string()));
                    }

                    warn!(
                        url = %url,
                        error = %e,
                        retry = attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Archive request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                }
            }
        }
    }
}

#[async_trait]
impl ArchiveClient for HttpArchive {
    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(bytes = body.len(), "Fetched listing");
        Ok(body)
    }

    #[instrument(skip(self))]
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self.get(url).await?;
        let last_modified = response
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(bytes = bytes.len(), last_modified = ?last_modified, "Fetched image");
        Ok(FetchedImage { bytes, last_modified })
    }
}
