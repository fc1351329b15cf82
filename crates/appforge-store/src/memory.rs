//! In-memory store, used by tests and ephemeral sessions

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use appforge_core::prelude::*;

use crate::kv::KeyValueStore;

/// Map-backed store with an optional byte budget
///
/// The budget mimics the quota a browser enforces on local storage: a write
/// that would push the total size of keys and values past it fails with
/// [`Error::StorageFull`] and leaves the store unchanged.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that holds at most `bytes` of keys plus values
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            capacity: Some(bytes),
        }
    }

    /// Total bytes used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.lock()
            .map(|entries| used_bytes(&entries))
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|e| Error::storage("*", format!("store lock poisoned: {}", e)))
    }
}

fn used_bytes(entries: &BTreeMap<String, Vec<u8>>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.lock()?;
        if let Some(capacity) = self.capacity {
            let current = used_bytes(&entries);
            let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = key.len() + value.len();
            let available = capacity.saturating_sub(current - replaced);
            if needed > available {
                warn!("Store full: '{}' needs {} bytes, {} available", key, needed, available);
                return Err(Error::StorageFull {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
