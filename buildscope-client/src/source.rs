//! Remote build source
//!
//! Stateless transport to the CI service. It knows three endpoints: the
//! recent-builds listing, a single build, and arbitrary log output URLs.
//! Retries and caching live in [`BuildClient`], not here.
//!
//! [`BuildClient`]: crate::BuildClient

use async_trait::async_trait;
use buildscope_core::{BuildId, BuildRecord, ProjectUrls};
use reqwest::Client;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Source of build data
///
/// Trait-based so the client can be exercised without a network.
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Fetches the raw JSON body of one build
    ///
    /// The body is returned unparsed so it can be cached byte for byte.
    async fn fetch_build(&self, id: BuildId) -> Result<Vec<u8>>;

    /// Fetches summaries of the most recent builds, newest first
    async fn fetch_recent(&self) -> Result<Vec<BuildRecord>>;

    /// Fetches and parses the JSON document at a log output URL
    async fn fetch_output(&self, url: &str) -> Result<serde_json::Value>;
}

/// HTTP implementation of BuildSource
#[derive(Debug, Clone)]
pub struct HttpBuildSource {
    client: Client,
    urls: ProjectUrls,
}

impl HttpBuildSource {
    /// Creates a new HTTP build source
    ///
    /// # Arguments
    /// * `urls` - API and web locations of the project
    /// * `timeout` - Timeout applied to every request
    pub fn new(urls: ProjectUrls, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(urls, client))
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(urls: ProjectUrls, client: Client) -> Self {
        Self { client, urls }
    }

    pub fn urls(&self) -> &ProjectUrls {
        &self.urls
    }

    /// GET `url` and return the body of a successful response
    async fn get_body(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl BuildSource for HttpBuildSource {
    async fn fetch_build(&self, id: BuildId) -> Result<Vec<u8>> {
        self.get_body(&self.urls.api_build_url(id)).await
    }

    async fn fetch_recent(&self) -> Result<Vec<BuildRecord>> {
        let body = self.get_body(self.urls.api_base()).await?;

        serde_json::from_slice(&body).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse recent builds: {}", e))
        })
    }

    async fn fetch_output(&self, url: &str) -> Result<serde_json::Value> {
        let body = self.get_body(url).await?;

        serde_json::from_slice(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse output {}: {}", url, e)))
    }
}
