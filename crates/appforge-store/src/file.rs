//! Directory-backed store: one file per key
//!
//! Keys are percent-encoded into file names so any string key maps to a
//! single flat file under the store directory. Writes hold an exclusive
//! `fs2` lock on the target file; reads take a shared lock.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use appforge_core::prelude::*;
use fs2::FileExt;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::kv::KeyValueStore;

/// Characters left readable in file names
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Suffix of every value file
const VALUE_SUFFIX: &str = ".json";

/// Store persisting each key as a file in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| root.display().to_string(), "Failed to create store directory")?;
        debug!("Opened file store at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }
}

/// `<data_local_dir>/appforge/store`, or `./.appforge/store` when the
/// platform has no data directory
pub fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("appforge").join("store"))
        .unwrap_or_else(|| PathBuf::from(".appforge").join("store"))
}

fn encode_key(key: &str) -> String {
    format!("{}{}", utf8_percent_encode(key, KEY_ENCODE_SET), VALUE_SUFFIX)
}

fn decode_key(file_name: &str) -> Option<String> {
    let encoded = file_name.strip_suffix(VALUE_SUFFIX)?;
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        let mut file = match OpenOptions::new().read(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context(key, "Failed to open"),
        };

        file.lock_shared().context(key, "Failed to lock")?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).context(key, "Failed to read")?;
        trace!("Read {} bytes for '{}'", bytes.len(), key);
        Ok(Some(bytes))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .context(key, "Failed to open")?;

        // Truncate only once the lock is held
        file.lock_exclusive().context(key, "Failed to lock")?;
        file.set_len(0).context(key, "Failed to truncate")?;
        file.write_all(value).context(key, "Failed to write")?;
        file.flush().context(key, "Failed to flush")?;

        trace!("Wrote {} bytes for '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(key, "Failed to remove"),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| self.root.display().to_string(), "Failed to list store")?;

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().and_then(decode_key))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
