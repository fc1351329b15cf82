//! # appforge-store - Key/Value Persistence
//!
//! The injected storage layer every AppForge service persists through.
//!
//! - [`KeyValueStore`] / [`SharedStore`] - byte store with get/set/remove
//! - [`MemoryStore`] - in-memory store with an optional byte budget
//! - [`FileStore`] - one file per key in a data directory
//! - [`JsonStoreExt`] - typed JSON access with corrupt-value recovery
//! - [`keys`] - the persisted key layout

pub mod file;
pub mod json;
pub mod keys;
pub mod kv;
pub mod memory;

pub use file::{default_store_dir, FileStore};
pub use json::JsonStoreExt;
pub use kv::{KeyValueStore, SharedStore};
pub use memory::MemoryStore;
