//! SQLite-backed playlist storage.
//!
//! Items are stored one row per `mal_id` with the full record serialized as
//! given. A `position` column keeps insertion order. SQLite calls run on the
//! blocking thread pool.

use super::{StorageBackend, PROBE_KEY};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use shared::{BackendKind, Database, PlaylistItem};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
enum Location {
    File(PathBuf),
    #[cfg(test)]
    Memory,
}

/// Structured database backend
pub struct DatabaseBackend {
    location: Location,
    /// Opened on first successful probe
    db: Arc<Mutex<Option<Database>>>,
}

impl DatabaseBackend {
    /// Backend persisted to the SQLite file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            db: Arc::new(Mutex::new(None)),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            db: Arc::new(Mutex::new(None)),
        }
    }

    fn unavailable(reason: impl std::fmt::Display) -> StorageError {
        StorageError::Unavailable(BackendKind::Database, reason.to_string())
    }

    fn open(location: &Location) -> StorageResult<Database> {
        let opened = match location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Database::open(path)
            }
            #[cfg(test)]
            Location::Memory => Database::open_in_memory(),
        };

        opened.map_err(|e| Self::unavailable(format!("{:#}", e)))
    }

    /// Run `f` against the connection slot on the blocking pool
    async fn with_slot<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Option<Database>) -> StorageResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| Self::unavailable("connection lock poisoned"))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Self::unavailable(format!("database task failed: {}", e)))?
    }

    /// Run `f` against the opened database
    async fn with_db<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> StorageResult<T> + Send + 'static,
    {
        self.with_slot(move |slot| match slot.as_mut() {
            Some(db) => f(db),
            None => Err(Self::unavailable("backend has not been probed")),
        })
        .await
    }
}

#[async_trait]
impl StorageBackend for DatabaseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    async fn probe(&self) -> StorageResult<()> {
        let location = self.location.clone();

        self.with_slot(move |slot| {
            if slot.is_none() {
                *slot = Some(Self::open(&location)?);
            }

            let db = slot
                .as_ref()
                .ok_or_else(|| Self::unavailable("connection missing after open"))?;
            let conn = db.conn();

            conn.execute(
                "INSERT OR REPLACE INTO storage_probe (key, value) VALUES (?1, ?2)",
                params![PROBE_KEY, PROBE_KEY],
            )?;
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM storage_probe WHERE key = ?1",
                    params![PROBE_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            conn.execute("DELETE FROM storage_probe WHERE key = ?1", params![PROBE_KEY])?;

            if value.as_deref() != Some(PROBE_KEY) {
                return Err(StorageError::Probe(
                    BackendKind::Database,
                    "probe value did not read back".to_string(),
                ));
            }

            Ok(())
        })
        .await
    }

    async fn load(&self) -> StorageResult<Vec<PlaylistItem>> {
        self.with_db(|db| {
            let mut stmt = db
                .conn()
                .prepare("SELECT data FROM playlist_items ORDER BY position ASC")?;

            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let items = rows
                .iter()
                .map(|data| serde_json::from_str::<PlaylistItem>(data))
                .collect::<Result<Vec<_>, _>>()?;

            debug!(count = items.len(), "Loaded playlist from database");
            Ok(items)
        })
        .await
    }

    async fn save(&self, items: &[PlaylistItem]) -> StorageResult<()> {
        let items = items.to_vec();

        self.with_db(move |db| {
            let tx = db
                .begin_transaction()
                .map_err(|e| Self::unavailable(format!("{:#}", e)))?;

            // Mark every row stale; rows still in the list get a real position
            tx.execute("UPDATE playlist_items SET position = -1", [])?;

            // Upsert the list, keeping the original added_at
            let now = Utc::now();
            {
                let mut upsert = tx.prepare_cached(
                    "INSERT INTO playlist_items (mal_id, position, data, added_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(mal_id) DO UPDATE SET
                         position = excluded.position,
                         data = excluded.data",
                )?;
                for (position, item) in items.iter().enumerate() {
                    let data = serde_json::to_string(item)?;
                    upsert.execute(params![item.mal_id, position as i64, data, now])?;
                }
            }

            tx.execute("DELETE FROM playlist_items WHERE position < 0", [])?;
            tx.commit()?;

            debug!(count = items.len(), "Saved playlist to database");
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_db(|db| {
            db.conn().execute("DELETE FROM playlist_items", [])?;
            debug!("Cleared playlist in database");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn full_item(mal_id: u32) -> PlaylistItem {
        serde_json::from_value(json!({
            "mal_id": mal_id,
            "title": format!("Anime {}", mal_id),
            "type": "TV",
            "synopsis": "Kept verbatim by the database backend",
            "rank": 12
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_requires_probe() {
        let backend = DatabaseBackend::in_memory();
        assert!(matches!(
            backend.load().await,
            Err(StorageError::Unavailable(BackendKind::Database, _))
        ));
    }

    #[tokio::test]
    async fn test_probe_leaves_no_trace() -> anyhow::Result<()> {
        let backend = DatabaseBackend::in_memory();
        backend.probe().await?;
        backend.probe().await?;

        let count = backend
            .with_db(|db| {
                Ok(db
                    .conn()
                    .query_row("SELECT COUNT(*) FROM storage_probe", [], |row| {
                        row.get::<_, i64>(0)
                    })?)
            })
            .await?;
        assert_eq!(count, 0);
        assert!(backend.load().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_save_keeps_full_record_and_order() -> anyhow::Result<()> {
        let backend = DatabaseBackend::in_memory();
        backend.probe().await?;

        // Ids deliberately out of numeric order
        let items = vec![full_item(30), full_item(10), full_item(20)];
        backend.save(&items).await?;

        let loaded = backend.load().await?;
        assert_eq!(loaded, items);
        assert_eq!(loaded[0].extra["synopsis"], "Kept verbatim by the database backend");

        Ok(())
    }

    #[tokio::test]
    async fn test_save_replaces_contents() -> anyhow::Result<()> {
        let backend = DatabaseBackend::in_memory();
        backend.probe().await?;

        backend.save(&[full_item(1), full_item(2), full_item(3)]).await?;
        backend.save(&[full_item(3), full_item(4)]).await?;

        let ids: Vec<u32> = backend.load().await?.iter().map(|i| i.mal_id).collect();
        assert_eq!(ids, vec![3, 4]);

        backend.save(&[]).await?;
        assert!(backend.load().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_save_beyond_sqlite_variable_limit() -> anyhow::Result<()> {
        let backend = DatabaseBackend::in_memory();
        backend.probe().await?;

        // More ids than SQLite accepts as bound parameters in one statement
        let large: Vec<PlaylistItem> = (1..=40_000)
            .map(|id| PlaylistItem::new(id, "x"))
            .collect();
        backend.save(&large).await?;
        assert_eq!(backend.load().await?.len(), 40_000);

        let shrunk: Vec<PlaylistItem> = large[39_990..].to_vec();
        backend.save(&shrunk).await?;

        let ids: Vec<u32> = backend.load().await?.iter().map(|i| i.mal_id).collect();
        assert_eq!(ids, (39_991..=40_000).collect::<Vec<_>>());

        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> anyhow::Result<()> {
        let backend = DatabaseBackend::in_memory();
        backend.probe().await?;

        backend.save(&[full_item(1)]).await?;
        backend.clear().await?;
        assert!(backend.load().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_persists_across_reopen() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("playlist.db");

        let backend = DatabaseBackend::new(&path);
        backend.probe().await?;
        backend.save(&[full_item(7), full_item(8)]).await?;
        drop(backend);

        let reopened = DatabaseBackend::new(&path);
        reopened.probe().await?;
        let ids: Vec<u32> = reopened.load().await?.iter().map(|i| i.mal_id).collect();
        assert_eq!(ids, vec![7, 8]);

        Ok(())
    }

    #[tokio::test]
    async fn test_probe_fails_when_parent_is_a_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x")?;

        let backend = DatabaseBackend::new(blocker.join("playlist.db"));
        assert!(backend.probe().await.is_err());

        Ok(())
    }
}
