//! Build selection flags
//!
//! Shared by every subcommand and turned into a [`SelectionCriteria`] once
//! parsing is done.

use buildscope_core::{BuildId, SelectionCriteria, parse_timestamp};
use chrono::{DateTime, Utc};
use clap::Args;

/// Flags selecting the repository and a subset of its builds
#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Build selection")]
pub struct SelectionArgs {
    /// Which repository to use (e.g. octo-org/octo-repo)
    #[arg(short, long, global = true, env = "BUILDSCOPE_REPOSITORY")]
    pub repository: Option<String>,

    /// First build to include in the build range
    #[arg(short, long, global = true, alias = "start", value_name = "BUILD")]
    pub after: Option<BuildId>,

    /// Last build to include in the build range
    #[arg(short, long, global = true, alias = "end", value_name = "BUILD")]
    pub before: Option<BuildId>,

    /// How many builds to include in the build range
    #[arg(short, long, global = true, value_name = "COUNT")]
    pub count: Option<u64>,

    /// Only include builds queued after this date; still bounded by the build range
    #[arg(short = 's', long, global = true, value_name = "DATE", value_parser = parse_date)]
    pub after_date: Option<DateTime<Utc>>,

    /// Only include builds queued before this date; still bounded by the build range
    #[arg(short = 'e', long, global = true, value_name = "DATE", value_parser = parse_date)]
    pub before_date: Option<DateTime<Utc>>,

    /// Only report builds of this branch
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Always download complete build details instead of recent summaries
    #[arg(long, global = true)]
    pub full: bool,
}

impl SelectionArgs {
    /// Selection criteria described by these flags
    pub fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            after: self.after,
            before: self.before,
            count: self.count,
            after_date: self.after_date,
            before_date: self.before_date,
        }
    }
}

/// Parse a `--after-date`/`--before-date` value
fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(input).ok_or_else(|| {
        format!(
            "invalid date '{}', expected YYYY-MM-DD or an ISO-8601 timestamp",
            input
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-02").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()
        );
        assert!(parse_date("last tuesday").is_err());
    }

    #[test]
    fn test_criteria_copies_bounds() {
        let args = SelectionArgs {
            after: Some(10),
            count: Some(3),
            ..Default::default()
        };
        let criteria = args.criteria();
        assert_eq!(criteria.after, Some(10));
        assert_eq!(criteria.before, None);
        assert_eq!(criteria.count, Some(3));
    }
}
