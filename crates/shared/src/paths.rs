//! File path utilities for organizing data files.
//!
//! This module provides a centralized way to manage the on-disk locations of
//! the playlist backends and logs.

use crate::Config;
use std::path::{Path, PathBuf};

/// File path manager for data files
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
    database: PathBuf,
    key_value: PathBuf,
    logs: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths with the default layout under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            database: root.join("playlist.db"),
            key_value: root.join("kv"),
            logs: root.join("logs"),
            root,
        }
    }

    /// Create a DataPaths honoring the configured locations
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.data_dir(),
            database: config.database_path(),
            key_value: config.key_value_dir(),
            logs: config.log_dir(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the SQLite file backing the database backend
    pub fn database_file(&self) -> &Path {
        &self.database
    }

    /// Get the directory backing the key-value backend
    pub fn key_value_dir(&self) -> &Path {
        &self.key_value
    }

    /// Get logs directory
    pub fn logs_dir(&self) -> &Path {
        &self.logs
    }

    /// Create all necessary directories
    pub fn create_dirs(&self) -> std::io::Result<()> {
        let mut dirs = vec![self.root.clone(), self.key_value.clone(), self.logs.clone()];
        if let Some(parent) = self.database.parent() {
            dirs.push(parent.to_path_buf());
        }

        for dir in dirs {
            if dir.as_os_str().is_empty() {
                continue;
            }
            std::fs::create_dir_all(&dir)?;
        }

        Ok(())
    }
}
