//! Backend probing and selection.
//!
//! Probes each backend once, in fixed priority order, and keeps the ordered
//! list of the ones that work. The first usable backend is the active one.

use crate::backend::StorageBackend;
use shared::{BackendKind, StorageInfo};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of probing the configured backends
#[derive(Clone, Default)]
pub struct BackendSelection {
    usable: Vec<Arc<dyn StorageBackend>>,
}

impl BackendSelection {
    /// Probe `backends` in the order given and keep the usable ones
    ///
    /// A failing probe only excludes that backend. An empty selection is not
    /// an error: callers degrade to empty reads and failed writes.
    pub async fn probe(backends: &[Arc<dyn StorageBackend>]) -> Self {
        let mut usable = Vec::with_capacity(backends.len());

        for backend in backends {
            match backend.probe().await {
                Ok(()) => {
                    info!(backend = %backend.kind(), "Storage backend available");
                    usable.push(Arc::clone(backend));
                }
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "Storage backend unavailable");
                }
            }
        }

        if usable.is_empty() {
            warn!("No storage backend available, playlist will not be persisted");
        }

        Self { usable }
    }

    /// Usable backends, highest priority first
    pub fn usable(&self) -> &[Arc<dyn StorageBackend>] {
        &self.usable
    }

    /// The first usable backend
    pub fn active(&self) -> Option<BackendKind> {
        self.usable.first().map(|backend| backend.kind())
    }

    pub fn is_empty(&self) -> bool {
        self.usable.is_empty()
    }

    /// Diagnostics view of this selection
    pub fn info(&self) -> StorageInfo {
        StorageInfo {
            active: self.active(),
            supported: self.usable.iter().map(|backend| backend.kind()).collect(),
        }
    }
}

/// Order backends by fixed kind priority (stable for equal kinds)
pub fn in_priority_order(
    mut backends: Vec<Arc<dyn StorageBackend>>,
) -> Vec<Arc<dyn StorageBackend>> {
    backends.sort_by_key(|backend| {
        BackendKind::PRIORITY
            .iter()
            .position(|kind| *kind == backend.kind())
            .unwrap_or(BackendKind::PRIORITY.len())
    });
    backends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryBackend;

    #[tokio::test]
    async fn test_all_usable() {
        let backends: Vec<Arc<dyn StorageBackend>> = vec![
            Arc::new(MemoryBackend::new(BackendKind::Database)),
            Arc::new(MemoryBackend::new(BackendKind::KeyValue)),
        ];

        let selection = BackendSelection::probe(&backends).await;
        assert_eq!(selection.active(), Some(BackendKind::Database));
        assert_eq!(
            selection.info().supported,
            vec![BackendKind::Database, BackendKind::KeyValue]
        );
    }

    #[tokio::test]
    async fn test_failed_probe_is_excluded() {
        let backends: Vec<Arc<dyn StorageBackend>> = vec![
            Arc::new(MemoryBackend::unavailable(BackendKind::Database)),
            Arc::new(MemoryBackend::new(BackendKind::KeyValue)),
        ];

        let selection = BackendSelection::probe(&backends).await;
        assert_eq!(
            selection.info(),
            StorageInfo {
                active: Some(BackendKind::KeyValue),
                supported: vec![BackendKind::KeyValue],
            }
        );
    }

    #[tokio::test]
    async fn test_nothing_usable() {
        let backends: Vec<Arc<dyn StorageBackend>> = vec![
            Arc::new(MemoryBackend::unavailable(BackendKind::Database)),
            Arc::new(MemoryBackend::unavailable(BackendKind::KeyValue)),
        ];

        let selection = BackendSelection::probe(&backends).await;
        assert!(selection.is_empty());
        assert_eq!(selection.info(), StorageInfo::default());
    }

    #[test]
    fn test_priority_order() {
        let backends: Vec<Arc<dyn StorageBackend>> = vec![
            Arc::new(MemoryBackend::new(BackendKind::KeyValue)),
            Arc::new(MemoryBackend::new(BackendKind::Database)),
        ];

        let kinds: Vec<BackendKind> = in_priority_order(backends)
            .iter()
            .map(|backend| backend.kind())
            .collect();
        assert_eq!(kinds, vec![BackendKind::Database, BackendKind::KeyValue]);
    }
}
