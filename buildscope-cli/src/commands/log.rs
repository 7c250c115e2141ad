//! Log command handler

use anyhow::Result;
use buildscope_client::BuildClient;
use buildscope_core::BuildId;
use colored::*;

/// Print the log output of one step of a build
pub async fn print_log(
    client: &BuildClient,
    id: BuildId,
    container: usize,
    step: &str,
) -> Result<()> {
    let Some(log) = client.fetch_log(id, container, step).await else {
        println!(
            "{}",
            format!(
                "No log found for step '{}' on container {} of build {}.",
                step, container, id
            )
            .yellow()
        );
        println!("{}", "  Run with -vv to see why.".dimmed());
        return Ok(());
    };

    println!(
        "{}",
        format!("Log of '{}' on container {} of build {}:", step, container, id).bold()
    );
    println!("{}", "─".repeat(80).dimmed());
    println!("{}", serde_json::to_string_pretty(&log)?);
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}
