use crate::core::WorkloadKind;
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tracing::trace;

/// Holds one computed result per workload kind until it is invalidated.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    entries: RwLock<BTreeMap<WorkloadKind, Arc<T>>>,
}

// === impl SnapshotCache ===

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T> SnapshotCache<T> {
    pub fn get(&self, kind: WorkloadKind) -> Option<Arc<T>> {
        self.entries.read().get(&kind).cloned()
    }

    /// Drops the cached value for `kind`, returning whether one was held.
    pub fn invalidate(&self, kind: WorkloadKind) -> bool {
        let removed = self.entries.write().remove(&kind).is_some();
        trace!(%kind, removed, "Invalidated");
        removed
    }

    /// Returns the cached value for `kind`, computing it if absent.
    ///
    /// `f` runs under the write lock, so concurrent callers compute a value
    /// at most once.
    pub fn get_or_insert_with(&self, kind: WorkloadKind, f: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = self.get(kind) {
            trace!(%kind, "Cache hit");
            return value;
        }

        self.entries
            .write()
            .entry(kind)
            .or_insert_with(|| {
                trace!(%kind, "Cache miss");
                Arc::new(f())
            })
            .clone()
    }
}
