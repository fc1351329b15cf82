//! Configuration file parsing for AppForge
//!
//! Settings live in `<config dir>/appforge/config.toml`. A missing or broken
//! file is not an error: defaults are used and a warning is logged.

pub mod settings;
pub mod types;

pub use settings::{
    default_config_dir, init_config_dir, load_settings, resolve_data_dir, DATA_DIR_ENV_VAR,
};
pub use types::*;
