//! Build lookups

use buildscope_core::selection::MAX_RANGE_LEN;
use buildscope_core::{BuildId, BuildRecord, ResolvedRange};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::{BuildClient, Memo};

impl BuildClient {
    // =============================================================================
    // Single Builds
    // =============================================================================

    /// Look up one build
    ///
    /// Tries the cache, then (unless `ensure_full` is set) the recent-builds
    /// listing, then a full fetch with retries. Summaries from the listing
    /// omit fields such as `steps`; pass `ensure_full` when those are needed.
    ///
    /// # Arguments
    /// * `id` - The build number
    /// * `ensure_full` - Skip the recent-builds listing
    ///
    /// # Errors
    /// Returns an error if every fetch attempt fails, the body is not a valid
    /// build, or a finished build cannot be written to the cache.
    pub async fn resolve(&self, id: BuildId, ensure_full: bool) -> Result<BuildRecord> {
        let memoized = Memo::lock(&self.memo.builds)
            .get(&(id, ensure_full))
            .cloned();
        if let Some(build) = memoized {
            return Ok(build);
        }

        let build = self.lookup(id, ensure_full).await?;

        Memo::lock(&self.memo.builds).insert((id, ensure_full), build.clone());
        Ok(build)
    }

    async fn lookup(&self, id: BuildId, ensure_full: bool) -> Result<BuildRecord> {
        if let Some(body) = self.cache.get(id).await {
            match BuildRecord::from_json(&body) {
                Ok(build) => return Ok(build),
                Err(e) => warn!("Cached build {} is not valid JSON, refetching: {}", id, e),
            }
        }

        if !ensure_full {
            let recent = self.recent_summaries().await?;
            if let Some(summary) = recent.iter().find(|build| build.id == id) {
                debug!("Build {} served from recent builds", id);
                return Ok(summary.clone());
            }
        }

        self.fetch_full(id).await
    }

    /// Download a build and cache it once it has finished
    async fn fetch_full(&self, id: BuildId) -> Result<BuildRecord> {
        let what = format!("build {}", id);
        let body = self
            .retry
            .run(&what, || self.source.fetch_build(id))
            .await?;

        let build = BuildRecord::from_json(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse build {}: {}", id, e)))?;

        if build.is_finished() {
            self.cache.put(id, &body).await?;
        } else {
            debug!("Build {} has no outcome yet, not caching", id);
        }

        Ok(build)
    }

    // =============================================================================
    // Batches
    // =============================================================================

    /// Look up every build of a range
    ///
    /// See [`BuildClient::resolve_ids`].
    ///
    /// # Errors
    /// Returns an error if the range covers more than
    /// [`MAX_RANGE_LEN`](buildscope_core::selection::MAX_RANGE_LEN) builds.
    pub async fn resolve_range(
        &self,
        range: &ResolvedRange,
        ensure_full: bool,
    ) -> Result<Vec<Result<BuildRecord>>> {
        if range.len() > MAX_RANGE_LEN {
            return Err(ClientError::InvalidRange(format!(
                "{} covers {} builds, more than the limit of {}",
                range,
                range.len(),
                MAX_RANGE_LEN
            )));
        }
        self.resolve_ids(range.ids().collect(), ensure_full).await
    }

    /// Look up many builds concurrently
    ///
    /// At most `max_concurrency` lookups run at once. The output has one
    /// entry per input id, in input order; a failed lookup only fails its own
    /// entry.
    ///
    /// # Errors
    /// Returns an error if `ids` is empty or not strictly ascending.
    pub async fn resolve_ids(
        &self,
        ids: Vec<BuildId>,
        ensure_full: bool,
    ) -> Result<Vec<Result<BuildRecord>>> {
        let (Some(first), Some(last)) = (ids.first().copied(), ids.last().copied()) else {
            return Err(ClientError::InvalidRange("no build ids given".to_string()));
        };
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ClientError::InvalidRange(format!(
                "ids must be ascending, found {} before {}",
                pair[0], pair[1]
            )));
        }

        info!(
            "Fetching builds {}..{} ({} at a time)",
            first, last, self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(ids.len());

        for id in ids {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ClientError::InternalError(e.to_string()))?;
            let client = self.clone();

            let handle = tokio::spawn(async move {
                let result = client.resolve(id, ensure_full).await;
                drop(permit);
                result
            });
            handles.push((id, handle));
        }

        let mut builds = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ClientError::InternalError(format!(
                    "Fetch task for build {} failed: {}",
                    id, e
                ))),
            };
            if let Err(e) = &result {
                warn!("Failed to fetch build {}: {}", id, e);
            }
            builds.push(result);
        }

        info!("Fetched builds {}..{}", first, last);
        Ok(builds)
    }

    // =============================================================================
    // Recent Builds
    // =============================================================================

    /// Summaries of the most recent builds, newest first
    ///
    /// Fetched once per client. The listing is one page of the CI service
    /// (about 30 builds), not the full history.
    pub async fn recent_summaries(&self) -> Result<&[BuildRecord]> {
        let recent = self
            .memo
            .recent
            .get_or_try_init(|| self.retry.run("recent builds", || self.source.fetch_recent()))
            .await?;

        Ok(recent.as_slice())
    }

    /// Number of the most recent build
    ///
    /// # Errors
    /// Returns an error if the listing cannot be fetched or is empty.
    pub async fn latest_id(&self) -> Result<BuildId> {
        self.recent_summaries()
            .await?
            .first()
            .map(|build| build.id)
            .ok_or_else(|| ClientError::NotFound("the project has no builds".to_string()))
    }
}
