//! HTTP fetcher implementation
//!
//! This module handles all network access for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - Fetching page markup under the shared connection limiter
//! - Streaming documents to disk
//! - Routing page fetches through a JavaScript renderer when one is configured
//! - Turning every failure into an explicit `FetchResult`

use super::limiter::ConnectionLimiter;
use crate::config::Config;
use crate::url::extract_domain;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Result of a page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// The URL that was requested
        url: String,
        /// Page markup
        body: String,
    },

    /// The server answered with a non-2xx status
    HttpError {
        url: String,
        status_code: u16,
    },

    /// Timeout, connection failure or any other transport error
    NetworkError {
        url: String,
        error: String,
    },
}

impl FetchResult {
    /// The URL this result is for
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::HttpError { url, .. } | Self::NetworkError { url, .. } => {
                url
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The page markup, for successful fetches
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Maps the outcome of a fetch to a result, never failing
    fn from_outcome(url: &str, outcome: Result<String>) -> Self {
        let url = url.to_string();
        match outcome {
            Ok(body) => Self::Success { url, body },
            Err(HarvestError::Status { status, .. }) => Self::HttpError {
                url,
                status_code: status,
            },
            Err(HarvestError::Timeout { .. }) => Self::NetworkError {
                url,
                error: "Request timeout".to_string(),
            },
            Err(e) => Self::NetworkError {
                url,
                error: e.to_string(),
            },
        }
    }
}

/// Fetches page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`; failures are reported in the result, never raised
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Downloads a document to disk
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Writes the body of `url` to `dest` and returns the number of bytes
    ///
    /// On failure no partial file is left at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// A JavaScript rendering backend returning the rendered markup of a page
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}

/// Builds an HTTP client with proper configuration
///
/// The client carries the user agent and connect timeout. Total timeouts
/// differ between pages and documents, so they are set per request.
///
/// # Example
///
/// ```no_run
/// use site_harvester::config::Config;
/// use site_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(config.crawler.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Connection-limiter key for a URL; unparseable URLs share one bucket
fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| extract_domain(&url))
        .unwrap_or_default()
}

/// Plain HTTP fetcher for pages and documents
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<ConnectionLimiter>,
    request_timeout: Duration,
    document_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, limiter: Arc<ConnectionLimiter>, config: &Config) -> Self {
        Self {
            client,
            limiter,
            request_timeout: config.crawler.request_timeout(),
            document_timeout: config.crawler.document_timeout(),
        }
    }

    /// Builds the client from `config` and wraps it
    pub fn from_config(config: &Config, limiter: Arc<ConnectionLimiter>) -> Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, limiter, config))
    }

    pub fn limiter(&self) -> &Arc<ConnectionLimiter> {
        &self.limiter
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let _permit = self.limiter.acquire(&host_key(url)).await?;

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| HarvestError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| HarvestError::from_request(url, e))
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let _permit = self.limiter.acquire(&host_key(url)).await?;

        let mut response = self
            .client
            .get(url)
            .timeout(self.document_timeout)
            .send()
            .await
            .map_err(|e| HarvestError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| HarvestError::from_request(url, e))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let outcome = self.get_text(url).await;
        if let Err(e) = &outcome {
            tracing::debug!("Fetch failed for {}: {}", url, e);
        }
        FetchResult::from_outcome(url, outcome)
    }
}

#[async_trait]
impl Downloader for HttpFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let partial = partial_path(dest);
        let result = match self.stream_to_file(url, &partial).await {
            Ok(written) => tokio::fs::rename(&partial, dest)
                .await
                .map(|_| written)
                .map_err(HarvestError::from),
            Err(e) => Err(e),
        };
        if result.is_err() {
            // An earlier copy at `dest` stays untouched
            let _ = tokio::fs::remove_file(&partial).await;
        }
        result
    }
}

/// Sibling of `dest` that a download is streamed into before the rename
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Page fetcher that asks a [`Renderer`] for the markup
///
/// Rendering shares the connection limiter and the page timeout with plain
/// HTTP fetches.
#[derive(Clone)]
pub struct RenderingFetcher {
    renderer: Arc<dyn Renderer>,
    limiter: Arc<ConnectionLimiter>,
    timeout: Duration,
}

impl RenderingFetcher {
    pub fn new(renderer: Arc<dyn Renderer>, limiter: Arc<ConnectionLimiter>, timeout: Duration) -> Self {
        Self {
            renderer,
            limiter,
            timeout,
        }
    }

    async fn render(&self, url: &str) -> Result<String> {
        let _permit = self.limiter.acquire(&host_key(url)).await?;
        match tokio::time::timeout(self.timeout, self.renderer.render(url)).await {
            Ok(markup) => markup,
            Err(_) => Err(HarvestError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PageFetcher for RenderingFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let outcome = self.render(url).await;
        if let Err(e) = &outcome {
            tracing::debug!("Render failed for {}: {}", url, e);
        }
        FetchResult::from_outcome(url, outcome)
    }
}
