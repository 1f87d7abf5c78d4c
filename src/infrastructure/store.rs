//! In-memory usage store.

use crate::application::ports::{StoreError, UsageStore};
use crate::domain::record::{UsageKey, UsageRecord};
use std::collections::HashMap;

/// Usage store that keeps records in memory only.
///
/// Flushing is a no-op that is counted, which makes this store useful for
/// hosts that do not need durability and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<UsageKey, UsageRecord>,
    flushes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `flush` has been called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl UsageStore for MemoryStore {
    fn get(&self, key: &UsageKey) -> Option<UsageRecord> {
        self.records.get(key).copied()
    }

    fn set(&mut self, key: UsageKey, record: UsageRecord) {
        self.records.insert(key, record);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&UsageKey, &UsageRecord),
    {
        for (key, record) in &self.records {
            f(key, record);
        }
    }
}
