//! Settings parser for `config.toml`

use std::path::{Path, PathBuf};

use appforge_core::prelude::*;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the store directory
pub const DATA_DIR_ENV_VAR: &str = "APPFORGE_DATA_DIR";

/// `<config_dir>/appforge`, or `./.appforge` without a platform config dir
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("appforge"))
        .unwrap_or_else(|| PathBuf::from(".appforge"))
}

/// Load settings from `<config_dir>/config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Write a commented default `config.toml` unless one already exists
///
/// Returns the path of the config file.
pub fn init_config_dir(config_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(config_dir)
        .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Wrote default config to {:?}", config_path);
    }

    Ok(config_path)
}

/// Pick the store directory
///
/// Precedence: explicit override, `APPFORGE_DATA_DIR`, `[storage] data_dir`,
/// then the platform default.
pub fn resolve_data_dir(explicit: Option<&Path>, settings: &Settings) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    settings
        .storage
        .data_dir
        .clone()
        .unwrap_or_else(appforge_store::default_store_dir)
}

fn generate_default_config() -> &'static str {
    r#"# AppForge Configuration

[storage]
# Store directory (leave unset for the platform data directory)
# data_dir = "/path/to/store"

[flow]
thinking_ms = 1500        # Time in "thinking" before "building"
building_ms = 2500        # Time in "building" before "complete"
complete_linger_ms = 1200 # How long "complete" shows before "idle"
jitter_ms = 500           # Random extra delay per stage
auth_ms = 1000            # Login/register "thinking" time

[console]
max_entries = 500         # Console lines kept per project
max_commands = 100        # Command history kept per project

[generation]
default_model = "gemini-2.0-flash"
starting_credits = 50     # Credits for newly registered users
credit_cost = 1           # Credits charged per generation
"#
}
