//! Buildscope Client
//!
//! Tiered access to the builds of one CI project.
//!
//! A build is looked up in three tiers, cheapest first: the on-disk
//! [`BuildCache`], the recent-builds listing, and finally a full fetch of the
//! build with retries. Finished builds are cached forever since their data
//! never changes again.
//!
//! # Example
//!
//! ```no_run
//! use buildscope_client::{BuildClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::new("octo-org/octo-repo", "/tmp/buildscope");
//!     let client = BuildClient::new(config)?;
//!
//!     let latest = client.latest_id().await?;
//!     let build = client.resolve(latest, true).await?;
//!
//!     println!("Build {} finished: {:?}", build.id, build.outcome);
//!     Ok(())
//! }
//! ```

mod builds;
pub mod cache;
pub mod config;
pub mod error;
mod logs;
pub mod retry;
pub mod source;

// Re-export commonly used types
pub use cache::BuildCache;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use retry::RetryPolicy;
pub use source::{BuildSource, HttpBuildSource};

use buildscope_core::{BuildId, BuildRecord, BuildView, ProjectUrls};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OnceCell, Semaphore};

/// Client for the builds of one CI project
///
/// Combines a [`BuildSource`] with the [`BuildCache`] and remembers every
/// lookup for its lifetime, so asking twice for the same build costs nothing.
/// Clones share that memory and are safe to use from concurrent tasks.
#[derive(Clone)]
pub struct BuildClient {
    /// Transport to the CI service
    source: Arc<dyn BuildSource>,
    /// Persistent store of finished builds
    cache: BuildCache,
    urls: ProjectUrls,
    retry: RetryPolicy,
    max_concurrency: usize,
    memo: Arc<Memo>,
}

/// Results already produced by this client
#[derive(Default)]
struct Memo {
    builds: Mutex<HashMap<(BuildId, bool), BuildRecord>>,
    logs: Mutex<HashMap<LogKey, Option<serde_json::Value>>>,
    recent: OnceCell<Vec<BuildRecord>>,
}

/// Build, container index and step pattern of a log lookup
type LogKey = (BuildId, usize, String);

impl Memo {
    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BuildClient {
    /// Create a client talking to the CI service over HTTP
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpBuildSource::new(config.urls.clone(), config.request_timeout)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a client backed by a custom build source
    pub fn with_source(config: ClientConfig, source: Arc<dyn BuildSource>) -> Self {
        Self {
            source,
            cache: BuildCache::new(config.cache_dir),
            urls: config.urls,
            retry: config.retry,
            max_concurrency: config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
            memo: Arc::new(Memo::default()),
        }
    }

    pub fn urls(&self) -> &ProjectUrls {
        &self.urls
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Wrap a record fetched by this client in a [`BuildView`]
    pub fn view<'a>(&'a self, record: &'a BuildRecord) -> BuildView<'a> {
        BuildView::new(record, &self.urls)
    }
}
