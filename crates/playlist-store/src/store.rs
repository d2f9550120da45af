//! Composite playlist store.
//!
//! Reads and writes the whole playlist against every usable backend:
//! - reads return the first non-empty list, in priority order (no merging)
//! - writes replace the contents of every usable backend and succeed if at
//!   least one backend accepted them
//!
//! Writes are not atomic across backends. After a partial failure the
//! backends can disagree until the next successful write. The key-value
//! backend also stores only the compressed projection, so backends are
//! equivalent on the compressed fields, not byte-identical.

use crate::backend::{DatabaseBackend, KeyValueBackend, StorageBackend};
use crate::probe::{in_priority_order, BackendSelection};
use shared::{Config, DataPaths, PlaylistItem, StorageInfo};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, warn};

/// Store fanning the playlist out across all usable backends
pub struct CompositeStore {
    backends: Vec<Arc<dyn StorageBackend>>,
    selection: OnceCell<BackendSelection>,
    /// Held across read-modify-write cycles by every caller sharing this store
    write_lock: Mutex<()>,
}

impl CompositeStore {
    /// Create a store over `backends` (probed lazily, in kind priority order)
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>) -> Self {
        Self {
            backends: in_priority_order(backends),
            selection: OnceCell::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store over the backends enabled in `config`
    pub fn from_config(config: &Config) -> Self {
        let paths = DataPaths::from_config(config);
        let mut backends: Vec<Arc<dyn StorageBackend>> = Vec::new();

        if config.storage.enable_database {
            backends.push(Arc::new(DatabaseBackend::new(paths.database_file())));
        }
        if config.storage.enable_key_value {
            backends.push(Arc::new(KeyValueBackend::new(
                paths.key_value_dir(),
                config.storage.storage_key.clone(),
            )));
        }

        Self::new(backends)
    }

    /// Probe the backends on first call; later calls return the cached result
    pub async fn initialize(&self) -> &BackendSelection {
        self.selection
            .get_or_init(|| BackendSelection::probe(&self.backends))
            .await
    }

    /// Exclusive access for a read-modify-write of the whole list
    ///
    /// Plain reads and writes do not take this lock; callers that read, change
    /// and write back must hold the guard for the whole cycle.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Read the playlist from the first backend holding a non-empty list
    pub async fn get_playlist(&self) -> Vec<PlaylistItem> {
        let selection = self.initialize().await;

        for backend in selection.usable() {
            match backend.load().await {
                Ok(items) if !items.is_empty() => {
                    debug!(backend = %backend.kind(), count = items.len(), "Read playlist");
                    return items;
                }
                Ok(_) => {
                    debug!(backend = %backend.kind(), "Backend holds an empty playlist");
                }
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "Failed to read playlist");
                }
            }
        }

        Vec::new()
    }

    /// Replace the playlist in every usable backend
    ///
    /// Returns `true` if at least one backend was written.
    pub async fn save_playlist(&self, items: &[PlaylistItem]) -> bool {
        let selection = self.initialize().await;
        let mut written = 0usize;

        for backend in selection.usable() {
            match backend.save(items).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "Failed to save playlist");
                }
            }
        }

        debug!(
            count = items.len(),
            written,
            backends = selection.usable().len(),
            "Saved playlist"
        );
        written > 0
    }

    /// Empty the playlist in every usable backend
    ///
    /// Returns `true` if at least one backend was cleared.
    pub async fn clear_playlist(&self) -> bool {
        let selection = self.initialize().await;
        let mut cleared = 0usize;

        for backend in selection.usable() {
            match backend.clear().await {
                Ok(()) => cleared += 1,
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "Failed to clear playlist");
                }
            }
        }

        cleared > 0
    }

    /// Active backend and all usable backends
    pub async fn storage_info(&self) -> StorageInfo {
        self.initialize().await.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryBackend;
    use shared::BackendKind;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn items(ids: &[u32]) -> Vec<PlaylistItem> {
        ids.iter()
            .map(|id| PlaylistItem::new(*id, format!("Anime {}", id)))
            .collect()
    }

    fn shared_backend(backend: &Arc<MemoryBackend>) -> Arc<dyn StorageBackend> {
        backend.clone()
    }

    fn ids(items: &[PlaylistItem]) -> Vec<u32> {
        items.iter().map(|item| item.mal_id).collect()
    }

    #[tokio::test]
    async fn test_initialize_probes_once() {
        let database = Arc::new(MemoryBackend::new(BackendKind::Database));
        let key_value = Arc::new(MemoryBackend::new(BackendKind::KeyValue));
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        store.initialize().await;
        store.get_playlist().await;
        store.save_playlist(&items(&[1])).await;
        store.storage_info().await;

        assert_eq!(database.probes.load(Ordering::SeqCst), 1);
        assert_eq!(key_value.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_save_fans_out() {
        let database = Arc::new(MemoryBackend::new(BackendKind::Database));
        let key_value = Arc::new(MemoryBackend::new(BackendKind::KeyValue));
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        assert!(store.save_playlist(&items(&[1, 2])).await);
        assert_eq!(ids(&database.snapshot()), vec![1, 2]);
        assert_eq!(ids(&key_value.snapshot()), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_read_prefers_first_non_empty() {
        let database = Arc::new(MemoryBackend::new(BackendKind::Database));
        let key_value = Arc::new(MemoryBackend::with_items(
            BackendKind::KeyValue,
            items(&[9]),
        ));
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        // Empty higher-priority backend falls through
        assert_eq!(ids(&store.get_playlist().await), vec![9]);

        database.save(&items(&[1, 2])).await.unwrap();
        // No merge with the lower-priority list
        assert_eq!(ids(&store.get_playlist().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_read_skips_failing_backend() {
        let database = Arc::new(MemoryBackend::with_items(BackendKind::Database, items(&[1])));
        let key_value = Arc::new(MemoryBackend::with_items(BackendKind::KeyValue, items(&[2])));
        database.fail_reads.store(true, Ordering::SeqCst);
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        assert_eq!(ids(&store.get_playlist().await), vec![2]);
    }

    #[tokio::test]
    async fn test_partial_write_failure_still_succeeds() {
        let database = Arc::new(MemoryBackend::new(BackendKind::Database));
        let key_value = Arc::new(MemoryBackend::new(BackendKind::KeyValue));
        database.fail_writes.store(true, Ordering::SeqCst);
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        assert!(store.save_playlist(&items(&[5])).await);
        assert!(database.snapshot().is_empty());
        assert_eq!(ids(&key_value.snapshot()), vec![5]);
    }

    #[tokio::test]
    async fn test_total_failure_degrades() {
        let database = Arc::new(MemoryBackend::unavailable(BackendKind::Database));
        let key_value = Arc::new(MemoryBackend::unavailable(BackendKind::KeyValue));
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        assert!(store.get_playlist().await.is_empty());
        assert!(!store.save_playlist(&items(&[1])).await);
        assert!(!store.clear_playlist().await);
        assert_eq!(store.storage_info().await, StorageInfo::default());
        assert_eq!(database.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_writes_failing_returns_false() {
        let database = Arc::new(MemoryBackend::new(BackendKind::Database));
        database.fail_writes.store(true, Ordering::SeqCst);
        let store = CompositeStore::new(vec![shared_backend(&database)]);

        assert!(!store.save_playlist(&items(&[1])).await);
        assert!(!store.clear_playlist().await);
    }

    #[tokio::test]
    async fn test_clear_empties_every_backend() {
        let database = Arc::new(MemoryBackend::with_items(BackendKind::Database, items(&[1])));
        let key_value = Arc::new(MemoryBackend::with_items(BackendKind::KeyValue, items(&[1])));
        let store =
            CompositeStore::new(vec![shared_backend(&database), shared_backend(&key_value)]);

        assert!(store.clear_playlist().await);
        assert!(database.snapshot().is_empty());
        assert!(key_value.snapshot().is_empty());
        assert!(store.get_playlist().await.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_uses_real_backends() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = Config::default();
        config.data.root_dir = temp_dir.path().to_string_lossy().to_string();

        let store = CompositeStore::from_config(&config);
        let info = store.storage_info().await;
        assert_eq!(info.active, Some(BackendKind::Database));
        assert_eq!(info.supported, vec![BackendKind::Database, BackendKind::KeyValue]);

        let item: PlaylistItem = serde_json::from_value(serde_json::json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "synopsis": "Space bounty hunters"
        }))?;
        assert!(store.save_playlist(&[item.clone()]).await);

        // Database keeps the full record, key-value the projection
        assert_eq!(store.get_playlist().await, vec![item.clone()]);
        let key_value = KeyValueBackend::new(config.key_value_dir(), config.storage.storage_key);
        assert_eq!(key_value.load().await?, vec![item.compress()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_from_config_respects_disabled_backends() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = Config::default();
        config.data.root_dir = temp_dir.path().to_string_lossy().to_string();
        config.storage.enable_database = false;

        let store = CompositeStore::from_config(&config);
        let info = store.storage_info().await;
        assert_eq!(info.active, Some(BackendKind::KeyValue));
        assert_eq!(info.supported, vec![BackendKind::KeyValue]);

        Ok(())
    }
}
