//! Derived view over a build record

use chrono::{DateTime, Duration, Utc};

use crate::domain::build::{BuildId, BuildRecord, Outcome, Step};
use crate::domain::timestamp::parse_timestamp;
use crate::project::ProjectUrls;

/// Read-only accessors over one build
///
/// Classifies the outcome and parses timestamps lazily. Malformed timestamps
/// read as unknown (`None`) instead of failing.
#[derive(Debug, Clone, Copy)]
pub struct BuildView<'a> {
    record: &'a BuildRecord,
    urls: &'a ProjectUrls,
}

impl<'a> BuildView<'a> {
    pub fn new(record: &'a BuildRecord, urls: &'a ProjectUrls) -> Self {
        Self { record, urls }
    }

    pub fn record(&self) -> &'a BuildRecord {
        self.record
    }

    pub fn id(&self) -> BuildId {
        self.record.id
    }

    pub fn branch(&self) -> Option<&'a str> {
        self.record.branch.as_deref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.record.outcome
    }

    pub fn steps(&self) -> &'a [Step] {
        self.record.steps()
    }

    pub fn succeeded(&self) -> bool {
        self.record.outcome == Some(Outcome::Success)
    }

    /// Whether the build failed; a timeout counts as a failure
    pub fn failed(&self) -> bool {
        matches!(
            self.record.outcome,
            Some(Outcome::Failed | Outcome::Timedout)
        )
    }

    /// `None` matches every branch
    pub fn matches_branch(&self, branch: Option<&str>) -> bool {
        branch.is_none_or(|name| self.record.branch.as_deref() == Some(name))
    }

    pub fn queued_at(&self) -> Option<DateTime<Utc>> {
        self.record.queued_at.as_deref().and_then(parse_timestamp)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.record.start_time.as_deref().and_then(parse_timestamp)
    }

    /// Wall time of the build, if reported
    pub fn duration(&self) -> Option<Duration> {
        self.record
            .duration_millis
            .and_then(|millis| i64::try_from(millis).ok())
            .map(Duration::milliseconds)
    }

    /// Web page of the build
    pub fn url(&self) -> String {
        self.urls.build_url(self.record.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(outcome: Option<Outcome>, branch: Option<&str>) -> BuildRecord {
        BuildRecord {
            id: 300,
            branch: branch.map(str::to_string),
            outcome,
            queued_at: Some("2024-03-02T10:15:00.000Z".to_string()),
            start_time: Some("not a time".to_string()),
            duration_millis: Some(90_500),
            steps: None,
        }
    }

    #[test]
    fn test_outcome_classification() {
        let urls = ProjectUrls::github("octo/repo");
        let cases = [
            (Some(Outcome::Success), true, false),
            (Some(Outcome::Failed), false, true),
            (Some(Outcome::Timedout), false, true),
            (Some(Outcome::Running), false, false),
            (Some(Outcome::Canceled), false, false),
            (Some(Outcome::InfrastructureFail), false, false),
            (None, false, false),
        ];

        for (outcome, succeeded, failed) in cases {
            let build = record(outcome, None);
            let view = BuildView::new(&build, &urls);
            assert_eq!(view.succeeded(), succeeded, "succeeded for {:?}", outcome);
            assert_eq!(view.failed(), failed, "failed for {:?}", outcome);
        }
    }

    #[test]
    fn test_matches_branch() {
        let urls = ProjectUrls::github("octo/repo");
        let on_main = record(None, Some("main"));
        let detached = record(None, None);

        assert!(BuildView::new(&on_main, &urls).matches_branch(None));
        assert!(BuildView::new(&detached, &urls).matches_branch(None));
        assert!(BuildView::new(&on_main, &urls).matches_branch(Some("main")));
        assert!(!BuildView::new(&on_main, &urls).matches_branch(Some("staging")));
        assert!(!BuildView::new(&detached, &urls).matches_branch(Some("main")));
    }

    #[test]
    fn test_timestamps_degrade_to_unknown() {
        let urls = ProjectUrls::github("octo/repo");
        let build = record(Some(Outcome::Success), None);
        let view = BuildView::new(&build, &urls);

        assert_eq!(
            view.queued_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 10, 15, 0).unwrap())
        );
        assert_eq!(view.started_at(), None);
    }

    #[test]
    fn test_url_and_duration() {
        let urls = ProjectUrls::github("octo/repo");
        let build = record(None, None);
        let view = BuildView::new(&build, &urls);

        assert_eq!(view.url(), "https://circleci.com/gh/octo/repo/300");
        assert_eq!(view.duration(), Some(Duration::milliseconds(90_500)));
    }
}
