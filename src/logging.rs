//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to a daily-rotated file so stdout carries only command output.
//! The level is taken from `RUST_LOG`, e.g. `RUST_LOG=jira_panel=debug`.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "jira_panel=info,warn";

const LOG_FILE_PREFIX: &str = "jira-panel.log";

/// Install the global subscriber writing to the log directory.
///
/// Logs live under the platform local data directory, for example
/// `~/.local/share/jira-panel/logs/` on Linux.
pub fn init() -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "jira-panel starting"
    );

    Ok(())
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-panel").join("logs"))
}

/// Where log files are written, shown when a command fails.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}
