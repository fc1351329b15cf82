//! Key/value store abstraction
//!
//! Every persisted value lives under a string key. Services receive the store
//! through their constructors as a [`SharedStore`]; nothing reaches for an
//! ambient global.

use std::sync::Arc;

use appforge_core::prelude::*;

/// Byte-oriented persistent key/value storage
///
/// Methods take `&self`; implementations use interior mutability so a single
/// store can be shared by every service in a workspace.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored, in sorted order
    fn keys(&self) -> Result<Vec<String>>;

    /// Check whether `key` holds a value
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Store handle shared between services
pub type SharedStore = Arc<dyn KeyValueStore>;
