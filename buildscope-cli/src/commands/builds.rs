//! Build command handlers
//!
//! Handles listing a selection of builds, showing one build and reporting
//! the latest build number.

use anyhow::{Context, Result};
use buildscope_client::BuildClient;
use buildscope_core::{BuildId, BuildView, Outcome, resolve_range};
use chrono::Duration;
use colored::*;

use crate::args::SelectionArgs;

/// List the builds selected by the command-line flags
///
/// Selection errors are reported before any network traffic. Builds that
/// fail to download are reported in place and do not abort the listing.
pub async fn list_builds(client: &BuildClient, selection: &SelectionArgs) -> Result<()> {
    let criteria = selection.criteria();
    criteria.validate()?;

    let latest = if criteria.needs_latest() {
        Some(
            client
                .latest_id()
                .await
                .context("Failed to determine the latest build")?,
        )
    } else {
        None
    };
    let range = resolve_range(&criteria, latest)?;

    let results = client.resolve_range(&range, selection.full).await?;

    let mut builds = Vec::with_capacity(results.len());
    for (id, result) in range.ids().zip(results) {
        match result {
            Ok(build) => builds.push(build),
            Err(e) => println!("  {} Build {} {}", "✗".red(), id, e.to_string().red()),
        }
    }

    let filtered = criteria.date_window().apply(builds);
    let branch = selection.branch.as_deref();
    let shown: Vec<BuildView<'_>> = filtered
        .builds
        .iter()
        .map(|build| client.view(build))
        .filter(|view| view.matches_branch(branch))
        .collect();

    if shown.is_empty() {
        println!("{}", format!("No builds found in {}.", range).yellow());
    } else {
        println!(
            "{}",
            format!("Found {} build(s) in {}:", shown.len(), range).bold()
        );
        println!();
        for view in &shown {
            print_build_summary(view);
        }
    }

    let effective = filtered
        .effective_range(&range)
        .map(|effective| effective.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("{} {}", "Effective range:".bold(), effective.cyan());

    Ok(())
}

/// Get and display a single build
pub async fn show_build(client: &BuildClient, id: BuildId) -> Result<()> {
    let build = client
        .resolve(id, true)
        .await
        .with_context(|| format!("Failed to fetch build {}", id))?;

    print_build_details(&client.view(&build));

    Ok(())
}

/// Print the number of the most recent build
pub async fn print_latest(client: &BuildClient) -> Result<()> {
    let latest = client
        .latest_id()
        .await
        .context("Failed to fetch recent builds")?;

    println!("{}", latest);

    Ok(())
}

/// Print a one-line summary of a build
fn print_build_summary(view: &BuildView<'_>) {
    println!(
        "  {} Build {:<8} {:<20} {:<24} {:>10}  {}",
        "▸".cyan(),
        view.id().to_string().bold(),
        colorize_outcome(view.outcome()),
        view.branch().unwrap_or("-").dimmed(),
        format_duration(view.duration()),
        format_time(view.record().queued_at.as_deref(), view.queued_at()).dimmed()
    );
}

/// Print detailed build information
fn print_build_details(view: &BuildView<'_>) {
    println!("{}", "Build Details:".bold());
    println!("  Number:    {}", view.id().to_string().cyan());
    println!("  Outcome:   {}", colorize_outcome(view.outcome()));
    println!("  Branch:    {}", view.branch().unwrap_or("-"));
    println!(
        "  Queued:    {}",
        format_time(view.record().queued_at.as_deref(), view.queued_at())
    );
    println!(
        "  Started:   {}",
        format_time(view.record().start_time.as_deref(), view.started_at())
    );
    println!("  Duration:  {}", format_duration(view.duration()));
    println!("  URL:       {}", view.url().underline());

    if !view.steps().is_empty() {
        println!("\n{}", "Steps:".bold());
        for step in view.steps() {
            println!(
                "  {} {} {}",
                "▸".cyan(),
                step.name,
                format!("({} container(s))", step.actions.len()).dimmed()
            );
        }
    }
}

/// Format a build timestamp, keeping the raw text when it cannot be parsed
fn format_time(raw: Option<&str>, parsed: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match (parsed, raw) {
        (Some(time), _) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        (None, Some(raw)) => format!("unknown ({})", raw),
        (None, None) => "unknown".to_string(),
    }
}

/// Format a build duration as minutes and seconds
fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => {
            let seconds = duration.num_seconds();
            format!("{}m{:02}s", seconds / 60, seconds % 60)
        }
        None => "-".to_string(),
    }
}

/// Colorize a build outcome for display
fn colorize_outcome(outcome: Option<Outcome>) -> ColoredString {
    let Some(outcome) = outcome else {
        return "in progress".cyan();
    };
    let outcome_str = outcome.to_string();
    match outcome {
        Outcome::Success => outcome_str.green(),
        Outcome::Failed | Outcome::Timedout => outcome_str.red(),
        Outcome::InfrastructureFail => outcome_str.magenta(),
        Outcome::Queued | Outcome::Running => outcome_str.yellow(),
        Outcome::Canceled | Outcome::NoTests | Outcome::Other => outcome_str.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(Duration::milliseconds(754_900))), "12m34s");
        assert_eq!(format_duration(Some(Duration::seconds(5))), "0m05s");
        assert_eq!(format_duration(None), "-");
    }

    #[test]
    fn test_format_time() {
        let parsed = chrono::Utc.with_ymd_and_hms(2024, 3, 2, 10, 15, 0).unwrap();
        assert_eq!(
            format_time(Some("2024-03-02T10:15:00Z"), Some(parsed)),
            "2024-03-02 10:15:00"
        );
        assert_eq!(format_time(Some("soon"), None), "unknown (soon)");
        assert_eq!(format_time(None, None), "unknown");
    }
}
