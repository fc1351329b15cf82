//! AppForge Library
//!
//! Command-line driver for the AppForge workspace. The services themselves
//! live in `appforge-app`; this crate parses commands and prints results.

pub mod cli;

use std::sync::Arc;

use appforge_app::config::{default_config_dir, init_config_dir, load_settings, resolve_data_dir};
use appforge_app::{NotificationLevel, Workspace};
use appforge_store::{FileStore, SharedStore};
use color_eyre::Result;
use tracing::{debug, info};

use crate::cli::{Cli, Command};

/// Run one command; returns `false` when it failed
pub async fn run(cli: Cli) -> Result<bool> {
    let config_dir = cli.config_dir.clone().unwrap_or_else(default_config_dir);

    if let Command::Init = cli.command {
        let path = init_config_dir(&config_dir)?;
        println!("Config written to {}", path.display());
        return Ok(true);
    }

    let settings = load_settings(&config_dir);
    let data_dir = resolve_data_dir(cli.data_dir.as_deref(), &settings);
    info!("Using store at {}", data_dir.display());

    let store: SharedStore = Arc::new(FileStore::open(&data_dir)?);
    let mut workspace = Workspace::open(store, settings);

    let mut stdout = std::io::stdout().lock();
    let ok = cli::execute(&mut workspace, cli.command, &mut stdout).await?;
    drop(stdout);

    for notification in workspace.take_notifications() {
        let label = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        eprintln!("{}: {}", label, notification.message);
    }
    debug!("Command finished, ok = {}", ok);
    Ok(ok)
}
