//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod builds;
mod log;

use anyhow::Result;
use buildscope_client::BuildClient;
use buildscope_core::BuildId;
use clap::Subcommand;

use crate::args::SelectionArgs;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the selected builds
    List,
    /// Show details of one build
    Show {
        /// Build number
        id: BuildId,
    },
    /// Print the log output of one build step
    Log {
        /// Build number
        id: BuildId,

        /// Part of the step name to look for (e.g. "rake install")
        #[arg(long)]
        step: String,

        /// Container whose output to print
        #[arg(long, default_value_t = 0)]
        container: usize,
    },
    /// Print the number of the most recent build
    Latest,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `selection` - Build selection flags
/// * `client` - Client for the selected repository
pub async fn handle_command(
    command: Commands,
    selection: &SelectionArgs,
    client: &BuildClient,
) -> Result<()> {
    match command {
        Commands::List => builds::list_builds(client, selection).await,
        Commands::Show { id } => builds::show_build(client, id).await,
        Commands::Log {
            id,
            step,
            container,
        } => log::print_log(client, id, container, &step).await,
        Commands::Latest => builds::print_latest(client).await,
    }
}
