//! Buildscope CLI
//!
//! Command-line interface for inspecting the CI builds of a project.

mod args;
mod commands;
mod config;

use anyhow::Result;
use args::SelectionArgs;
use buildscope_client::BuildClient;
use clap::{ArgAction, Parser};
use commands::{Commands, handle_command};
use config::{Config, UserConfig};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "buildscope", version)]
#[command(about = "Inspect the CI builds of a project", long_about = None)]
struct Cli {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Config file with user defaults [default: ~/.buildscope/config.yml]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Default log filter for a verbosity level; RUST_LOG takes precedence
fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    format!(
        "buildscope_core={level},buildscope_client={level},buildscope={level}",
        level = level
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.clone().unwrap_or_else(UserConfig::default_path);
    let user = UserConfig::load(&config_path);
    let config = Config::resolve(&cli.selection, user, &config_path)?;

    tracing::debug!("Using repository {}", config.client.repository);

    let client = BuildClient::new(config.client)?;

    handle_command(cli.command, &cli.selection, &client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_selection_flags() {
        let cli = Cli::try_parse_from([
            "buildscope", "list", "-r", "octo/repo", "-a", "100", "-c", "5", "--branch", "main",
        ])
        .unwrap();

        let criteria = cli.selection.criteria();
        assert_eq!(cli.selection.repository.as_deref(), Some("octo/repo"));
        assert_eq!(criteria.after, Some(100));
        assert_eq!(criteria.count, Some(5));
        assert_eq!(cli.selection.branch.as_deref(), Some("main"));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_deprecated_aliases() {
        let cli =
            Cli::try_parse_from(["buildscope", "--start", "10", "--end", "20", "list"]).unwrap();

        assert_eq!(cli.selection.after, Some(10));
        assert_eq!(cli.selection.before, Some(20));
    }

    #[test]
    fn test_date_flags() {
        let cli = Cli::try_parse_from([
            "buildscope",
            "list",
            "-s",
            "2024-03-01",
            "--before-date",
            "2024-03-05T12:00:00Z",
        ])
        .unwrap();

        assert!(cli.selection.after_date.is_some());
        assert!(cli.selection.before_date.unwrap() > cli.selection.after_date.unwrap());
        assert!(Cli::try_parse_from(["buildscope", "list", "-s", "whenever"]).is_err());
    }

    #[test]
    fn test_log_command() {
        let cli = Cli::try_parse_from([
            "buildscope", "log", "4182", "--step", "rake install", "--container", "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Log {
                id,
                step,
                container,
            } => {
                assert_eq!(id, 4182);
                assert_eq!(step, "rake install");
                assert_eq!(container, 2);
            }
            _ => panic!("expected log command"),
        }
    }

    #[test]
    fn test_help_exits_successfully() {
        let err = match Cli::try_parse_from(["buildscope", "--help"]) {
            Ok(_) => panic!("--help should not parse into a command"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_default_filter() {
        assert!(default_filter(0).contains("buildscope_client=warn"));
        assert!(default_filter(2).contains("buildscope_client=debug"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
