//! Usage store whose flushes fail on demand.

use crate::application::ports::{StoreError, UsageStore};
use crate::domain::record::{UsageKey, UsageRecord};
use crate::infrastructure::store::MemoryStore;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory store whose `flush` fails while its switch is on.
///
/// Records are always kept in memory, so tests can check that decisions
/// survive a failed durable write.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
    failures: usize,
}

impl FailingStore {
    /// Create a store controlled by `failing`.
    pub fn new(failing: Arc<AtomicBool>) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing,
            failures: 0,
        }
    }

    /// Number of flushes that failed.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Number of flushes that succeeded.
    pub fn flush_count(&self) -> usize {
        self.inner.flush_count()
    }
}

impl UsageStore for FailingStore {
    fn get(&self, key: &UsageKey) -> Option<UsageRecord> {
        self.inner.get(key)
    }

    fn set(&mut self, key: UsageKey, record: UsageRecord) {
        self.inner.set(key, record);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            self.failures += 1;
            return Err(StoreError::Io {
                path: PathBuf::from("failing-store"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"),
            });
        }
        self.inner.flush()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&UsageKey, &UsageRecord),
    {
        self.inner.for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_controls_flush() {
        let failing = Arc::new(AtomicBool::new(true));
        let mut store = FailingStore::new(Arc::clone(&failing));

        assert!(store.flush().is_err());
        failing.store(false, Ordering::SeqCst);
        assert!(store.flush().is_ok());

        assert_eq!(store.failures(), 1);
        assert_eq!(store.flush_count(), 1);
    }
}
