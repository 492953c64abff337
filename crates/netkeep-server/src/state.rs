// ── Shared application state ──

use std::sync::Arc;

use netkeep_core::{MemoryStore, Reconciler, SnapshotExporter, SnapshotImporter};

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub exporter: SnapshotExporter,
    pub importer: SnapshotImporter,
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            exporter: SnapshotExporter::new(Arc::clone(&store)),
            importer: SnapshotImporter::new(Arc::clone(&store)),
            reconciler: Reconciler::new(Arc::clone(&store)),
            store,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
