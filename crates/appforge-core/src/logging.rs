//! File logging via tracing
//!
//! The CLI prints command output on stdout, so logs always go to a daily
//! rolling file rather than the terminal.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "APPFORGE_LOG";

const LOG_FILE_PREFIX: &str = "appforge.log";

/// Install the global subscriber
///
/// Logs are written to `<data_local_dir>/appforge/logs/appforge.log.<date>`.
/// The filter comes from `APPFORGE_LOG`, for example:
///
/// ```bash
/// APPFORGE_LOG=debug appforge project list
/// APPFORGE_LOG=appforge_app::flow=trace appforge generate "a blog"
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let file_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(())
}

/// Info for our crates, warn for dependencies
fn default_filter() -> &'static str {
    "appforge=info,appforge_app=info,appforge_store=info,warn"
}

/// `<data_local_dir>/appforge/logs`
pub fn get_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("appforge")
        .join("logs")
}
