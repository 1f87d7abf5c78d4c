//! In-memory window cache.
//!
//! Mirrors the start of each live window so that evaluations can decide
//! whether a new window begins without consulting the durable store.

use crate::domain::record::{Timestamp, UsageKey};
use dashmap::DashMap;

/// Concurrent map from (actor, item type) to window start, backed by DashMap.
///
/// DashMap shards its locks, so an expiry sweep only blocks evaluations that
/// hash to the shard currently being swept.
#[derive(Debug, Default)]
pub struct WindowCache {
    map: DashMap<UsageKey, Timestamp>,
}

impl WindowCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Start of the cached window for a key.
    pub fn window_start(&self, key: &UsageKey) -> Option<Timestamp> {
        self.map.get(key).map(|start| *start)
    }

    /// Record that a window for `key` started at `start`.
    pub fn start_window(&self, key: UsageKey, start: Timestamp) {
        self.map.insert(key, start);
    }

    /// Check if a window is cached for a key.
    pub fn contains(&self, key: &UsageKey) -> bool {
        self.map.contains_key(key)
    }

    /// Number of cached windows.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove entries for which the predicate returns false, returning how
    /// many were removed.
    pub fn retain(&self, mut keep: impl FnMut(&UsageKey, Timestamp) -> bool) -> usize {
        let mut removed = 0;
        self.map.retain(|key, start| {
            let kept = keep(key, *start);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }
}
