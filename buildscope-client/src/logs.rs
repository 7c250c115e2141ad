//! Build step output

use buildscope_core::BuildId;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::{BuildClient, Memo};

impl BuildClient {
    /// Fetch the log output of one step of a build
    ///
    /// Picks the first step whose name contains `step`, then the action run on
    /// container `container`, and fetches the JSON document at its output URL.
    /// Every failure along the way (unknown step, container out of range,
    /// transport or parse error) yields `None`; the reason is logged at debug
    /// level.
    ///
    /// # Arguments
    /// * `id` - The build number
    /// * `container` - Index of the container within the step
    /// * `step` - Substring of the step name, e.g. "rake install"
    pub async fn fetch_log(
        &self,
        id: BuildId,
        container: usize,
        step: &str,
    ) -> Option<serde_json::Value> {
        let key = (id, container, step.to_string());

        let memoized = Memo::lock(&self.memo.logs).get(&key).cloned();
        if let Some(log) = memoized {
            return log;
        }

        let log = match self.lookup_log(id, container, step).await {
            Ok(log) => Some(log),
            Err(e) => {
                debug!(
                    "No log for build {} container {} step '{}': {}",
                    id, container, step, e
                );
                None
            }
        };

        Memo::lock(&self.memo.logs).insert(key, log.clone());
        log
    }

    async fn lookup_log(
        &self,
        id: BuildId,
        container: usize,
        step: &str,
    ) -> Result<serde_json::Value> {
        let build = self.resolve(id, true).await?;

        let matched = build
            .find_step(step)
            .ok_or_else(|| ClientError::NotFound(format!("no step matching '{}'", step)))?;

        let action = matched.actions.get(container).ok_or_else(|| {
            ClientError::NotFound(format!(
                "step '{}' ran on {} container(s), not {}",
                matched.name,
                matched.actions.len(),
                container
            ))
        })?;

        let url = action.output_url.as_deref().ok_or_else(|| {
            ClientError::NotFound(format!("step '{}' has no output", matched.name))
        })?;

        self.source.fetch_output(url).await
    }
}
