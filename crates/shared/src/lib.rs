//! Shared library for the anime playlist.
//!
//! This crate provides common functionality used by the playlist store and CLI:
//! - Configuration management
//! - Database connection and schema
//! - Playlist data models
//! - File path utilities
//! - Logging infrastructure

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod paths;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use logging::LogConfig;
pub use models::*;
pub use paths::DataPaths;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
