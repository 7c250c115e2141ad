//! Build selection
//!
//! Turns the sparse constraints a user gives on the command line into a
//! concrete, inclusive range of build ids, and narrows fetched builds by
//! queue date afterwards.

use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::domain::build::{BuildId, BuildRecord};
use crate::domain::timestamp::parse_timestamp;

/// Number of builds selected when no bound is given.
///
/// Matches the page size of the recent-builds listing.
pub const DEFAULT_BUILD_COUNT: u64 = 30;

/// Largest number of builds a single selection may cover
pub const MAX_RANGE_LEN: u64 = 100_000;

/// Errors raised while resolving a selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Cannot specify --after, --before AND --count: maximum of two")]
    TooManyBounds,

    #[error("Invalid range {after}..{before}: --after must not exceed --before")]
    InvertedRange { after: BuildId, before: BuildId },

    #[error("Build {after} is newer than the latest build {latest}")]
    AfterLatest { after: BuildId, latest: BuildId },

    #[error("Cannot specify --before without --after or --count")]
    BeforeWithoutAnchor,

    #[error("--count must be at least 1")]
    ZeroCount,

    #[error("Selection ends at build {last}, before the first build of the project")]
    EmptyRange { last: BuildId },

    #[error("Latest build id is required to resolve this selection")]
    LatestUnknown,

    #[error("Range of {count} builds starting at {after} runs past the largest build id")]
    RangeOverflow { after: BuildId, count: u64 },

    #[error("Range {first}..{last} covers {len} builds, more than the limit of {max}", max = MAX_RANGE_LEN)]
    RangeTooLarge {
        first: BuildId,
        last: BuildId,
        len: u64,
    },
}

/// Constraints used to select builds
///
/// Populated once from command-line flags and passed around as a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// First build to include
    pub after: Option<BuildId>,
    /// Last build to include
    pub before: Option<BuildId>,
    /// How many builds to include
    pub count: Option<u64>,
    /// Only keep builds queued at or after this time
    pub after_date: Option<DateTime<Utc>>,
    /// Only keep builds queued at or before this time
    pub before_date: Option<DateTime<Utc>>,
}

impl SelectionCriteria {
    /// Check flag combinations without knowing the latest build
    pub fn validate(&self) -> Result<(), SelectionError> {
        match (self.after, self.before, self.count) {
            (Some(_), Some(_), Some(_)) => Err(SelectionError::TooManyBounds),
            (Some(after), Some(before), None) if after > before => {
                Err(SelectionError::InvertedRange { after, before })
            }
            (None, Some(_), None) => Err(SelectionError::BeforeWithoutAnchor),
            (_, _, Some(0)) => Err(SelectionError::ZeroCount),
            _ => Ok(()),
        }
    }

    /// Whether resolving this selection needs the latest build id
    pub fn needs_latest(&self) -> bool {
        matches!(
            (self.after, self.before, self.count),
            (Some(_), None, None) | (None, None, Some(_)) | (None, None, None)
        )
    }

    /// Date bounds of this selection
    pub fn date_window(&self) -> DateWindow {
        DateWindow {
            after: self.after_date,
            before: self.before_date,
        }
    }
}

/// Inclusive range of build ids, never empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    first: BuildId,
    last: BuildId,
}

impl ResolvedRange {
    /// Create a range, `None` unless `1 <= first <= last`
    pub fn new(first: BuildId, last: BuildId) -> Option<Self> {
        (first >= 1 && first <= last).then_some(Self { first, last })
    }

    pub fn first(&self) -> BuildId {
        self.first
    }

    pub fn last(&self) -> BuildId {
        self.last
    }

    /// Number of builds in the range
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: BuildId) -> bool {
        self.first <= id && id <= self.last
    }

    /// Ids in ascending order
    pub fn ids(&self) -> RangeInclusive<BuildId> {
        self.first..=self.last
    }
}

impl std::fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.first, self.last)
    }
}

/// Resolve selection criteria into a concrete build range
///
/// `latest_id` is only consulted when the criteria are open-ended; pass
/// `None` when [`SelectionCriteria::needs_latest`] is false.
///
/// # Errors
/// Returns an error if:
/// - All of `after`, `before` and `count` are given
/// - `after` exceeds `before`, or exceeds the latest build
/// - `before` is given alone
/// - `count` is zero
/// - `after + count - 1` does not fit a build id
/// - The range would end before build 1
/// - The range covers more than [`MAX_RANGE_LEN`] builds
pub fn resolve_range(
    criteria: &SelectionCriteria,
    latest_id: Option<BuildId>,
) -> Result<ResolvedRange, SelectionError> {
    criteria.validate()?;

    let latest = || latest_id.ok_or(SelectionError::LatestUnknown);

    let (first, last) = match (criteria.after, criteria.before, criteria.count) {
        (Some(after), Some(before), None) => (after, before),
        (Some(after), None, Some(count)) => {
            let last = after
                .checked_add(count - 1)
                .ok_or(SelectionError::RangeOverflow { after, count })?;
            (after, last)
        }
        (None, Some(before), Some(count)) => (counted_back(before, count), before),
        (Some(after), None, None) => {
            let latest = latest()?;
            if after > latest {
                return Err(SelectionError::AfterLatest { after, latest });
            }
            (after, latest)
        }
        (None, None, Some(count)) => {
            let latest = latest()?;
            (counted_back(latest, count), latest)
        }
        (None, None, None) => {
            let latest = latest()?;
            (counted_back(latest, DEFAULT_BUILD_COUNT), latest)
        }
        (Some(_), Some(_), Some(_)) => return Err(SelectionError::TooManyBounds),
        (None, Some(_), None) => return Err(SelectionError::BeforeWithoutAnchor),
    };

    let range =
        ResolvedRange::new(first.max(1), last).ok_or(SelectionError::EmptyRange { last })?;
    if range.len() > MAX_RANGE_LEN {
        return Err(SelectionError::RangeTooLarge {
            first: range.first(),
            last: range.last(),
            len: range.len(),
        });
    }
    Ok(range)
}

/// First id of `count` builds ending at `last`, clamped to build 1
fn counted_back(last: BuildId, count: u64) -> BuildId {
    last.saturating_sub(count - 1).max(1)
}

/// Queue-date bounds applied after builds have been fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// Builds that survived a [`DateWindow`]
#[derive(Debug, Clone, Default)]
pub struct DateFiltered {
    pub builds: Vec<BuildRecord>,
    /// Smallest surviving id among builds with a known queue time
    pub earliest: Option<BuildId>,
}

impl DateFiltered {
    /// Range actually covered once the date filter narrowed the selection
    ///
    /// `None` when no dated build survived.
    pub fn effective_range(&self, range: &ResolvedRange) -> Option<ResolvedRange> {
        self.earliest
            .and_then(|earliest| ResolvedRange::new(earliest, range.last()))
    }
}

impl DateWindow {
    pub fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// Whether a build queued at `queued_at` falls inside the window
    ///
    /// Builds with an unknown queue time always pass.
    pub fn admits(&self, queued_at: Option<DateTime<Utc>>) -> bool {
        let Some(queued_at) = queued_at else {
            return true;
        };
        if self.after.is_some_and(|after| queued_at < after) {
            return false;
        }
        if self.before.is_some_and(|before| queued_at > before) {
            return false;
        }
        true
    }

    /// Drop builds queued outside the window, preserving order
    pub fn apply(&self, builds: Vec<BuildRecord>) -> DateFiltered {
        let mut earliest: Option<BuildId> = None;

        let builds = builds
            .into_iter()
            .filter(|build| {
                let queued_at = build.queued_at.as_deref().and_then(parse_timestamp);
                if !self.admits(queued_at) {
                    return false;
                }
                if queued_at.is_some() && earliest.is_none_or(|id| build.id < id) {
                    earliest = Some(build.id);
                }
                true
            })
            .collect();

        DateFiltered { builds, earliest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn criteria(after: Option<u64>, before: Option<u64>, count: Option<u64>) -> SelectionCriteria {
        SelectionCriteria {
            after,
            before,
            count,
            ..Default::default()
        }
    }

    fn range(first: u64, last: u64) -> ResolvedRange {
        ResolvedRange::new(first, last).unwrap()
    }

    fn build(id: BuildId, queued_at: Option<&str>) -> BuildRecord {
        BuildRecord {
            id,
            branch: None,
            outcome: None,
            queued_at: queued_at.map(str::to_string),
            start_time: None,
            duration_millis: None,
            steps: None,
        }
    }

    #[test]
    fn test_after_and_count() {
        let resolved = resolve_range(&criteria(Some(100), None, Some(5)), None).unwrap();
        assert_eq!(resolved, range(100, 104));
    }

    #[test]
    fn test_before_and_count() {
        let resolved = resolve_range(&criteria(None, Some(100), Some(5)), None).unwrap();
        assert_eq!(resolved, range(96, 100));
    }

    #[test]
    fn test_after_and_before() {
        let resolved = resolve_range(&criteria(Some(100), Some(104), None), None).unwrap();
        assert_eq!(resolved, range(100, 104));
        assert_eq!(resolved.len(), 5);
    }

    #[test]
    fn test_single_build_range() {
        let resolved = resolve_range(&criteria(Some(42), Some(42), None), None).unwrap();
        assert_eq!(resolved.ids().collect::<Vec<_>>(), vec![42]);
    }

    #[test]
    fn test_after_only_runs_to_latest() {
        let resolved = resolve_range(&criteria(Some(150), None, None), Some(200)).unwrap();
        assert_eq!(resolved, range(150, 200));
    }

    #[test]
    fn test_count_only_ends_at_latest() {
        let resolved = resolve_range(&criteria(None, None, Some(10)), Some(200)).unwrap();
        assert_eq!(resolved, range(191, 200));
    }

    #[test]
    fn test_default_is_thirty_builds() {
        let resolved = resolve_range(&SelectionCriteria::default(), Some(200)).unwrap();
        assert_eq!(resolved, range(171, 200));
    }

    #[test]
    fn test_default_clamps_to_first_build() {
        let resolved = resolve_range(&SelectionCriteria::default(), Some(12)).unwrap();
        assert_eq!(resolved, range(1, 12));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = resolve_range(&criteria(Some(105), Some(100), None), None).unwrap_err();
        assert_eq!(
            err,
            SelectionError::InvertedRange {
                after: 105,
                before: 100
            }
        );
    }

    #[test]
    fn test_before_alone_rejected() {
        let err = resolve_range(&criteria(None, Some(100), None), Some(200)).unwrap_err();
        assert_eq!(err, SelectionError::BeforeWithoutAnchor);
    }

    #[test]
    fn test_three_bounds_rejected() {
        let err = resolve_range(&criteria(Some(1), Some(2), Some(3)), Some(200)).unwrap_err();
        assert_eq!(err, SelectionError::TooManyBounds);
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = resolve_range(&criteria(Some(1), None, Some(0)), None).unwrap_err();
        assert_eq!(err, SelectionError::ZeroCount);
    }

    #[test]
    fn test_after_beyond_latest_rejected() {
        let err = resolve_range(&criteria(Some(250), None, None), Some(200)).unwrap_err();
        assert_eq!(
            err,
            SelectionError::AfterLatest {
                after: 250,
                latest: 200
            }
        );
    }

    #[test]
    fn test_count_past_largest_id_rejected() {
        let err = resolve_range(&criteria(Some(u64::MAX), None, Some(2)), None).unwrap_err();
        assert_eq!(
            err,
            SelectionError::RangeOverflow {
                after: u64::MAX,
                count: 2
            }
        );
    }

    #[test]
    fn test_count_ending_at_largest_id() {
        let resolved = resolve_range(&criteria(Some(u64::MAX - 4), None, Some(5)), None).unwrap();
        assert_eq!(resolved, range(u64::MAX - 4, u64::MAX));
        assert_eq!(resolved.len(), 5);
        assert!(resolved.contains(u64::MAX));
    }

    #[test]
    fn test_oversized_range_rejected() {
        let err = resolve_range(&criteria(Some(1), Some(u64::MAX), None), None).unwrap_err();
        assert_eq!(
            err,
            SelectionError::RangeTooLarge {
                first: 1,
                last: u64::MAX,
                len: u64::MAX
            }
        );

        let err = resolve_range(&criteria(Some(10), None, Some(MAX_RANGE_LEN + 1)), None)
            .unwrap_err();
        assert!(matches!(err, SelectionError::RangeTooLarge { .. }));

        let resolved = resolve_range(&criteria(Some(1), None, Some(MAX_RANGE_LEN)), None).unwrap();
        assert_eq!(resolved.len(), MAX_RANGE_LEN);
    }

    #[test]
    fn test_open_ended_without_latest() {
        let err = resolve_range(&SelectionCriteria::default(), None).unwrap_err();
        assert_eq!(err, SelectionError::LatestUnknown);
    }

    #[test]
    fn test_needs_latest() {
        assert!(SelectionCriteria::default().needs_latest());
        assert!(criteria(Some(1), None, None).needs_latest());
        assert!(criteria(None, None, Some(3)).needs_latest());
        assert!(!criteria(Some(1), Some(5), None).needs_latest());
        assert!(!criteria(None, Some(5), Some(2)).needs_latest());
    }

    #[test]
    fn test_validate_runs_without_latest() {
        assert!(criteria(Some(1), Some(2), Some(3)).validate().is_err());
        assert!(criteria(None, Some(2), None).validate().is_err());
        assert!(criteria(Some(1), None, None).validate().is_ok());
    }

    #[test]
    fn test_resolved_range_rejects_bad_bounds() {
        assert!(ResolvedRange::new(0, 5).is_none());
        assert!(ResolvedRange::new(6, 5).is_none());
        assert_eq!(range(3, 5).to_string(), "3..5");
    }

    #[test]
    fn test_date_window_filters_and_tracks_earliest() {
        let window = DateWindow {
            after: Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()),
            before: Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()),
        };
        let builds = vec![
            build(10, Some("2024-03-01T12:00:00Z")),
            build(11, Some("garbage")),
            build(12, Some("2024-03-02T08:00:00Z")),
            build(13, Some("2024-03-03T08:00:00Z")),
            build(14, Some("2024-03-05T08:00:00Z")),
        ];

        let filtered = window.apply(builds);
        let ids: Vec<_> = filtered.builds.iter().map(|b| b.id).collect();

        assert_eq!(ids, vec![11, 12, 13]);
        assert_eq!(filtered.earliest, Some(12));
        assert_eq!(filtered.effective_range(&range(10, 14)), Some(range(12, 14)));
    }

    #[test]
    fn test_date_window_without_dated_builds() {
        let window = DateWindow::default();
        assert!(window.is_unbounded());

        let filtered = window.apply(vec![build(5, None)]);
        assert_eq!(filtered.builds.len(), 1);
        assert_eq!(filtered.earliest, None);
        assert_eq!(filtered.effective_range(&range(5, 5)), None);
    }
}
