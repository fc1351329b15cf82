//! Configuration types for AppForge
//!
//! Defines `Settings` and one sub-struct per `config.toml` section. Every
//! field has a default so partial files load cleanly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub flow: FlowSettings,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Where the key/value store lives
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Store directory; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Simulated latency of the mock flows
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowSettings {
    /// Time spent in `thinking` before `building`
    #[serde(default = "default_thinking_ms")]
    pub thinking_ms: u64,

    /// Time spent in `building` before `complete`
    #[serde(default = "default_building_ms")]
    pub building_ms: u64,

    /// How long `complete` is shown before returning to `idle`
    #[serde(default = "default_complete_linger_ms")]
    pub complete_linger_ms: u64,

    /// Random extra delay added to each stage, `0..=jitter_ms`
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Time the login/register flow spends in `thinking`
    #[serde(default = "default_auth_ms")]
    pub auth_ms: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            thinking_ms: default_thinking_ms(),
            building_ms: default_building_ms(),
            complete_linger_ms: default_complete_linger_ms(),
            jitter_ms: default_jitter_ms(),
            auth_ms: default_auth_ms(),
        }
    }
}

fn default_thinking_ms() -> u64 {
    1500
}

fn default_building_ms() -> u64 {
    2500
}

fn default_complete_linger_ms() -> u64 {
    1200
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_auth_ms() -> u64 {
    1000
}

/// Console history limits
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConsoleSettings {
    /// Maximum persisted console entries per project
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum persisted command history per project
    #[serde(default = "default_max_commands")]
    pub max_commands: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_commands: default_max_commands(),
        }
    }
}

fn default_max_entries() -> usize {
    500
}

fn default_max_commands() -> usize {
    100
}

/// Mock AI generation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationSettings {
    /// Model id used when none has been selected
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Credits granted to a newly registered user
    #[serde(default = "default_starting_credits")]
    pub starting_credits: u32,

    /// Credits charged per generation
    #[serde(default = "default_credit_cost")]
    pub credit_cost: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            starting_credits: default_starting_credits(),
            credit_cost: default_credit_cost(),
        }
    }
}

/// Model id used when none has been selected
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_starting_credits() -> u32 {
    50
}

fn default_credit_cost() -> u32 {
    1
}
