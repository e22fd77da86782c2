use crate::index::{Index, IndexBuilder};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, swappable reference to the live index.
///
/// Readers take a snapshot and query it without holding any lock. A rebuild
/// produces a complete new [`Index`] which replaces the old one in a single
/// store, so a reader never observes a half-built index.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Arc<Index>>,
}

impl IndexHandle {
    pub fn new(index: Index) -> Self {
        Self { current: RwLock::new(Arc::new(index)) }
    }

    pub fn snapshot(&self) -> Arc<Index> { Arc::clone(&self.current.read()) }

    /// Replace the live index, returning the one it displaced.
    pub fn publish(&self, index: Index) -> Arc<Index> {
        self.swap(Arc::new(index))
    }

    /// Build from `builder` without holding the lock, then publish it.
    pub fn rebuild(&self, builder: IndexBuilder) -> Arc<Index> {
        let next = Arc::new(builder.build());
        self.swap(Arc::clone(&next));
        next
    }

    fn swap(&self, next: Arc<Index>) -> Arc<Index> {
        let num_docs = next.document_count();
        let previous = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(num_docs, previous_docs = previous.document_count(), "published index");
        previous
    }
}
