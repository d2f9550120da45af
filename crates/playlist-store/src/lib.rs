//! Anime playlist storage.
//!
//! Persists a bounded, de-duplicated playlist of anime across two on-device
//! backends (a SQLite database and a key-value string store), probing which
//! ones are usable and writing to all of them for redundancy.

pub mod backend;
pub mod error;
pub mod facade;
pub mod probe;
pub mod store;

pub use backend::{DatabaseBackend, KeyValueBackend, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use facade::PlaylistManager;
pub use probe::BackendSelection;
pub use store::CompositeStore;
