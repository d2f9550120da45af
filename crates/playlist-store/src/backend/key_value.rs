//! Key-value string store and the playlist backend built on it.
//!
//! The store keeps one file per key under a root directory, each holding a
//! single string value. The playlist is written as one JSON list under a
//! namespaced key, compressed to the fields the UI reads.

use super::{StorageBackend, PROBE_KEY};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use shared::{BackendKind, PlaylistItem};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-per-key string store
pub struct KeyValueStore {
    /// Root directory
    root: PathBuf,
}

impl KeyValueStore {
    /// Create a store rooted at `root` (the directory is created on first write)
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Read the value stored under `key`
    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.item_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        std::fs::create_dir_all(&self.root)?;

        let path = self.item_path(key);
        let tmp = path.with_extension("tmp");

        // Readers never observe a half-written value
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;

        Ok(())
    }

    /// Remove the value stored under `key` (no-op if absent)
    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write, read back and remove a scratch value
    ///
    /// The scratch file has no `.json` extension, so it never shares a path
    /// with a stored key.
    pub fn check_writable(&self) -> StorageResult<bool> {
        std::fs::create_dir_all(&self.root)?;

        let path = self.root.join(format!("{}.probe", PROBE_KEY));
        std::fs::write(&path, PROBE_KEY)?;
        let value = std::fs::read_to_string(&path)?;
        std::fs::remove_file(&path)?;

        Ok(value == PROBE_KEY)
    }

    /// Get the file path for a given key
    fn item_path(&self, key: &str) -> PathBuf {
        // Sanitize key to create valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");

        self.root.join(format!("{}.json", safe_key))
    }
}

/// Key-value backend
pub struct KeyValueBackend {
    store: KeyValueStore,
    key: String,
}

impl KeyValueBackend {
    /// Backend storing the playlist under `key` in a store rooted at `root`
    pub fn new(root: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self {
            store: KeyValueStore::new(root),
            key: key.into(),
        }
    }

    /// The namespaced key the playlist lives under
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl StorageBackend for KeyValueBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn probe(&self) -> StorageResult<()> {
        if !self.store.check_writable()? {
            return Err(StorageError::Probe(
                BackendKind::KeyValue,
                "probe value did not read back".to_string(),
            ));
        }

        Ok(())
    }

    async fn load(&self) -> StorageResult<Vec<PlaylistItem>> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            debug!(key = %self.key, "No playlist stored under key");
            return Ok(Vec::new());
        };

        let items: Vec<PlaylistItem> = serde_json::from_str(&raw)?;
        debug!(key = %self.key, count = items.len(), "Loaded playlist from key-value store");
        Ok(items)
    }

    async fn save(&self, items: &[PlaylistItem]) -> StorageResult<()> {
        let compressed: Vec<PlaylistItem> = items.iter().map(PlaylistItem::compress).collect();
        let raw = serde_json::to_string(&compressed)?;

        self.store.set_item(&self.key, &raw)?;
        debug!(key = %self.key, count = items.len(), "Saved playlist to key-value store");
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.store.remove_item(&self.key)?;
        debug!(key = %self.key, "Cleared playlist in key-value store");
        Ok(())
    }
}
