//! Atomic generation swap for the published [`RecordStore`].
//!
//! Readers take a cheap `Arc` clone under a momentary read lock and then
//! work lock-free on that generation. Publishing replaces the single
//! reference under a momentary write lock; the old generation is dropped
//! when its last in-flight reader finishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::RecordStore;

/// Holds the current generation, if any has been published.
#[derive(Debug, Default)]
pub struct SharedStore {
    current: RwLock<Option<Arc<RecordStore>>>,
    last_generation: AtomicU64,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id for the next generation to be built.
    pub fn next_generation_id(&self) -> u64 {
        self.last_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The generation in effect right now.
    pub fn snapshot(&self) -> Option<Arc<RecordStore>> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a complete generation.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a fully built generation, returning the one it replaced.
    pub fn publish(&self, store: RecordStore) -> (Arc<RecordStore>, Option<Arc<RecordStore>>) {
        let next = Arc::new(store);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = guard.replace(Arc::clone(&next));
        (next, previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn readers_keep_their_generation_across_publish() {
        let shared = SharedStore::new();
        assert!(shared.snapshot().is_none());

        let g1 = shared.next_generation_id();
        shared.publish(RecordStore::build(g1, vec![Record::new("a")], None));
        let held = shared.snapshot().unwrap();

        let g2 = shared.next_generation_id();
        let (published, previous) =
            shared.publish(RecordStore::build(g2, vec![Record::new("b")], None));

        assert_eq!(held.generation_id(), g1);
        assert!(held.get("a").is_some());
        assert_eq!(previous.unwrap().generation_id(), g1);
        assert_eq!(published.generation_id(), g2);
        assert!(shared.snapshot().unwrap().get("b").is_some());
        assert!(g2 > g1);
    }
}
