//! Client configuration
//!
//! Everything the client needs to know about the project and its
//! environment, built once by the caller and handed to [`BuildClient`].
//!
//! [`BuildClient`]: crate::BuildClient

use buildscope_core::ProjectUrls;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

/// Default number of builds fetched at once by a batch
pub const DEFAULT_MAX_CONCURRENCY: usize = 50;

/// Default per-request timeout of the HTTP transport
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Repository slug, e.g. "octo-org/octo-repo"
    pub repository: String,

    /// API and web locations of the project
    pub urls: ProjectUrls,

    /// Directory holding cached builds
    pub cache_dir: PathBuf,

    /// Retry behaviour for build and summary fetches
    pub retry: RetryPolicy,

    /// Maximum number of builds fetched concurrently by a batch
    pub max_concurrency: usize,

    /// Timeout applied by the HTTP transport to each request
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for a GitHub-hosted project with defaults
    pub fn new(repository: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        let repository = repository.into();
        Self {
            urls: ProjectUrls::github(&repository),
            repository,
            cache_dir: cache_dir.into(),
            retry: RetryPolicy::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Points the client at a different CI host
    pub fn with_urls(mut self, urls: ProjectUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.repository.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "repository cannot be empty".to_string(),
            ));
        }

        for base in [self.urls.api_base(), self.urls.web_base()] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ClientError::InvalidConfig(format!(
                    "{} must start with http:// or https://",
                    base
                )));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "retry attempts must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency == 0 {
            return Err(ClientError::InvalidConfig(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(ClientError::InvalidConfig(format!(
                "max_concurrency must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(())
    }
}
