//! Storage backends for the playlist.
//!
//! Each backend persists the whole playlist as one unit. Two implementations
//! exist, checked in this priority order:
//! - [`DatabaseBackend`]: SQLite, one row per item holding the full record
//! - [`KeyValueBackend`]: one JSON string under a namespaced key, holding the
//!   compressed projection

mod database;
mod key_value;

pub use database::DatabaseBackend;
pub use key_value::{KeyValueBackend, KeyValueStore};

use crate::error::StorageResult;
use async_trait::async_trait;
use shared::{BackendKind, PlaylistItem};

/// Key written and removed again when probing a backend
pub const PROBE_KEY: &str = "__storage_test__";

/// A storage technology the playlist can be persisted to
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which kind of backend this is
    fn kind(&self) -> BackendKind;

    /// Check the backend can be opened, written and read back
    async fn probe(&self) -> StorageResult<()>;

    /// Read the stored playlist (empty if nothing was stored yet)
    async fn load(&self) -> StorageResult<Vec<PlaylistItem>>;

    /// Replace the stored playlist with `items`
    async fn save(&self, items: &[PlaylistItem]) -> StorageResult<()>;

    /// Remove the stored playlist
    async fn clear(&self) -> StorageResult<()>;
}
