//! jira-panel: issue manager and per-project disable toggle for JIRA Cloud.

mod api;
mod cli;
mod config;
mod error;
mod issues;
mod logging;
mod manager;
mod render;
mod toggle;
mod users;

use std::process::ExitCode;

use clap::Parser;

use crate::api::JiraClient;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match execute(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            if let Some(dir) = logging::log_directory() {
                eprintln!("Logs: {}", dir.display());
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<String, AppError> {
    let mut config = Config::load()?;

    match cli.command {
        Command::Profile(command) => cli::run_profile(&mut config, command),
        command => {
            let profile = config.resolve_profile(cli.profile.as_deref())?;
            let client = JiraClient::new(profile)?;
            tracing::info!(profile = %profile.name, url = client.base_url(), "Using profile");
            cli::run(&client, &config.settings, command).await
        }
    }
}
