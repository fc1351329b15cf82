//! JSON helpers over any [`KeyValueStore`]
//!
//! Loading follows one policy everywhere: a missing key is `None`, and a key
//! whose bytes no longer parse is removed with a warning so the caller can
//! continue with a default instead of failing startup.

use appforge_core::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::kv::KeyValueStore;

/// Typed access to JSON values in a store
pub trait JsonStoreExt {
    /// Read and parse a value; parse failures are storage errors
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Serialize and store a value
    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()>;

    /// Read a value, discarding the key if it is corrupt
    fn load_or_discard<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Read a value, falling back to `T::default()` when absent or corrupt
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_or_discard(key).unwrap_or_default()
    }

    /// Read a string value stored either as a JSON string or raw UTF-8
    fn read_string(&self, key: &str) -> Option<String>;

    /// Store a string as a JSON string
    fn write_string(&self, key: &str, value: &str) -> Result<()> {
        self.write_json(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.get(key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::storage(key, format!("corrupt JSON: {}", e)))
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes)
    }

    fn load_or_discard<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt value under '{}': {}", key, e);
                if let Err(e) = self.remove(key) {
                    warn!("Failed to remove corrupt key '{}': {}", key, e);
                }
                None
            }
        }
    }

    fn read_string(&self, key: &str) -> Option<String> {
        let bytes = match self.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!("Failed to read '{}': {}", key, e);
                return None;
            }
        };

        if let Ok(value) = serde_json::from_slice::<String>(&bytes) {
            return Some(value);
        }
        match String::from_utf8(bytes) {
            Ok(raw) => Some(raw),
            Err(_) => {
                warn!("Discarding non-UTF-8 value under '{}'", key);
                if let Err(e) = self.remove(key) {
                    warn!("Failed to remove corrupt key '{}': {}", key, e);
                }
                None
            }
        }
    }
}
