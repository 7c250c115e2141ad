//! Build domain types

use serde::{Deserialize, Serialize};

/// Identifier of a build within a project
pub type BuildId = u64;

/// A single build as returned by the CI service
///
/// Summaries from the recent-builds listing deserialize into the same
/// structure but usually carry no `steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    #[serde(rename = "build_num")]
    pub id: BuildId,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub queued_at: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default, rename = "build_time_millis")]
    pub duration_millis: Option<u64>,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
}

impl BuildRecord {
    /// Parse a record from the raw JSON body served by the CI service
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Whether the build has reached an outcome and will never change again
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Steps of the build, empty when the record is only a summary
    pub fn steps(&self) -> &[Step] {
        self.steps.as_deref().unwrap_or_default()
    }

    /// First step whose name contains `pattern`
    pub fn find_step(&self, pattern: &str) -> Option<&Step> {
        self.steps().iter().find(|step| step.name.contains(pattern))
    }
}

/// Build outcome as reported by the CI service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Queued,
    Running,
    Canceled,
    InfrastructureFail,
    Timedout,
    Failed,
    NoTests,
    Success,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Outcome::Queued => "queued",
            Outcome::Running => "running",
            Outcome::Canceled => "canceled",
            Outcome::InfrastructureFail => "infrastructure_fail",
            Outcome::Timedout => "timedout",
            Outcome::Failed => "failed",
            Outcome::NoTests => "no_tests",
            Outcome::Success => "success",
            Outcome::Other => "other",
        };
        f.write_str(name)
    }
}

/// A named phase of a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// One action per container the step ran on
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Execution of a step on one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Location of the log output, absent when the action produced none
    #[serde(default)]
    pub output_url: Option<String>,
}
