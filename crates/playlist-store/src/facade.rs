//! Playlist operations for UI callers.
//!
//! Every operation reads the whole list from the store, changes it in memory
//! and writes the whole list back while holding the store's write lock, so
//! managers sharing one store never lose each other's updates. None of them
//! fail: total storage failure shows up as an empty list or a `false` return.

use crate::store::CompositeStore;
use shared::{PlaylistItem, StorageInfo, DEFAULT_MAX_PLAYLIST_ITEMS};
use std::sync::Arc;
use tracing::{debug, info};

/// Playlist facade over a [`CompositeStore`]
pub struct PlaylistManager {
    store: Arc<CompositeStore>,
    max_items: usize,
}

impl PlaylistManager {
    /// Create a manager with the default 200-item cap
    pub fn new(store: Arc<CompositeStore>) -> Self {
        Self::with_max_items(store, DEFAULT_MAX_PLAYLIST_ITEMS)
    }

    /// Create a manager keeping at most `max_items` entries (at least one)
    pub fn with_max_items(store: Arc<CompositeStore>, max_items: usize) -> Self {
        Self {
            store,
            max_items: max_items.max(1),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Current playlist, oldest entry first
    pub async fn get_playlist(&self) -> Vec<PlaylistItem> {
        self.store.get_playlist().await
    }

    /// Number of entries in the playlist
    pub async fn playlist_len(&self) -> usize {
        self.get_playlist().await.len()
    }

    /// Append `item` unless its id is already present
    ///
    /// Evicts the oldest entries once the cap is exceeded. Returns `false` for
    /// a duplicate or when nothing could be saved.
    pub async fn add_to_playlist(&self, item: PlaylistItem) -> bool {
        let _guard = self.store.lock_writes().await;

        let mut playlist = self.store.get_playlist().await;
        if playlist.iter().any(|existing| existing.mal_id == item.mal_id) {
            debug!(mal_id = item.mal_id, "Already in playlist");
            return false;
        }

        let mal_id = item.mal_id;
        playlist.push(item);

        if playlist.len() > self.max_items {
            let overflow = playlist.len() - self.max_items;
            let evicted: Vec<u32> = playlist.drain(..overflow).map(|i| i.mal_id).collect();
            info!(?evicted, max_items = self.max_items, "Playlist full, evicted oldest entries");
        }

        let saved = self.store.save_playlist(&playlist).await;
        if saved {
            info!(mal_id, count = playlist.len(), "Added to playlist");
        }
        saved
    }

    /// Remove the entry with `mal_id` (absent ids are a successful no-op)
    pub async fn remove_from_playlist(&self, mal_id: u32) -> bool {
        let _guard = self.store.lock_writes().await;

        let mut playlist = self.store.get_playlist().await;
        let before = playlist.len();
        playlist.retain(|item| item.mal_id != mal_id);

        let saved = self.store.save_playlist(&playlist).await;
        if saved && playlist.len() < before {
            info!(mal_id, count = playlist.len(), "Removed from playlist");
        }
        saved
    }

    /// Whether `mal_id` is in the playlist (always a fresh read)
    pub async fn is_in_playlist(&self, mal_id: u32) -> bool {
        self.store
            .get_playlist()
            .await
            .iter()
            .any(|item| item.mal_id == mal_id)
    }

    /// Empty the playlist in every backend
    pub async fn clear_playlist(&self) -> bool {
        let _guard = self.store.lock_writes().await;

        let cleared = self.store.clear_playlist().await;
        if cleared {
            info!("Playlist cleared");
        }
        cleared
    }

    /// Active and usable backends, for display only
    pub async fn get_storage_info(&self) -> StorageInfo {
        self.store.storage_info().await
    }
}
