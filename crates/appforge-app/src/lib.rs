//! # appforge-app - Workspace Services
//!
//! Everything a session needs on top of a key-value store: the per-project
//! virtual file store, the saved project list, console history, preferences,
//! the mock account service and the timer-driven generation/auth flows.
//!
//! ## Public API
//!
//! - [`Workspace`] - Facade composing every service; reports failures as [`Notification`]s
//! - [`VirtualFileStore`] / [`FileTree`] - Files and derived folders of one project
//! - [`ProjectDirectory`] - Saved projects, plan quotas, featured flags
//! - [`ConsoleLog`] - Per-project console history and command interpreter
//! - [`FlowMachine`] - `idle -> thinking -> building -> complete -> idle`
//! - [`AuthService`] - Mock registration and login with hashed passwords
//! - [`Preferences`] - API key, claimed plan, selected model
//! - [`config`] - `config.toml` loading

pub mod auth;
pub mod config;
pub mod console;
pub mod flow;
pub mod generator;
pub mod ids;
pub mod preferences;
pub mod projects;
pub mod vfs;
pub mod workspace;

pub use auth::AuthService;
pub use config::Settings;
pub use console::ConsoleLog;
pub use flow::{FlowMachine, FlowStage, FlowState, FlowTimings};
pub use generator::{generate_site, GeneratedSite};
pub use preferences::Preferences;
pub use projects::ProjectDirectory;
pub use vfs::{FileTree, FolderNode, VirtualFileStore};
pub use workspace::{AuthRequest, Notification, NotificationLevel, Workspace};
