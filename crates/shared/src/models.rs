//! Data models for the playlist.
//!
//! This module defines the playlist entry (a reduced projection of an anime
//! record from the Jikan API), the storage backend descriptors and the
//! diagnostics returned by the storage layer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default cap on the number of entries in a playlist
pub const DEFAULT_MAX_PLAYLIST_ITEMS: usize = 200;

/// One image URL set (jpg or webp)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Anime images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeImages {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

/// Genre label record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Playlist entry
///
/// Identity is `mal_id`. The named fields are the compressed projection that
/// the UI reads; anything else the remote record carried is kept in `extra`
/// so the full object can be stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub mal_id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: AnimeImages,
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>, // TV, Movie, OVA, etc.
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,

    /// Remaining fields of the remote record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaylistItem {
    /// Create a bare item with only an id and a title
    pub fn new(mal_id: u32, title: impl Into<String>) -> Self {
        Self {
            mal_id,
            title: title.into(),
            images: AnimeImages::default(),
            anime_type: None,
            episodes: None,
            score: None,
            genres: Vec::new(),
            members: None,
            year: None,
            status: None,
            extra: Map::new(),
        }
    }

    /// Compressed projection: the same item without any extra fields
    pub fn compress(&self) -> Self {
        Self {
            extra: Map::new(),
            ..self.clone()
        }
    }

    /// Parse an anime record, either bare or wrapped in `{"data": ...}`
    pub fn from_json_str(content: &str) -> Result<Self> {
        if let Ok(envelope) = serde_json::from_str::<DataEnvelope<PlaylistItem>>(content) {
            return Ok(envelope.data);
        }

        serde_json::from_str(content).context("Failed to parse anime record")
    }
}

/// Single record wrapper used by the Jikan API (`/anime/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Storage backend kinds, in fixed priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Structured on-device database (SQLite)
    Database,
    /// Simple key-value string store
    KeyValue,
}

impl BackendKind {
    /// All kinds, highest priority first
    pub const PRIORITY: [BackendKind; 2] = [BackendKind::Database, BackendKind::KeyValue];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Database => "database",
            BackendKind::KeyValue => "key_value",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage diagnostics (for display only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    /// First usable backend, if any
    pub active: Option<BackendKind>,
    /// All usable backends, in priority order
    pub supported: Vec<BackendKind>,
}
