//! Cooldown bookkeeping.
//!
//! The tracker owns the policy table, the window cache and the durable usage
//! store, and decides whether each usage attempt is allowed.

use crate::application::cache::WindowCache;
use crate::application::metrics::Metrics;
use crate::application::ports::{StoreError, UsageStore};
use crate::domain::{
    actor::ActorId,
    decision::Decision,
    item::ItemType,
    policy::PolicyTable,
    record::{Timestamp, UsageKey, UsageRecord},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Tracks usage per (actor, item type) and enforces per-item-type limits.
///
/// # Concurrency
///
/// The tracker is `Send + Sync` and is meant to be shared behind an `Arc`.
/// The store lock is held for the whole read-check-increment-write sequence
/// of [`evaluate`](Self::evaluate), so two attempts can never both take the
/// last use of a window. [`expire`](Self::expire) only touches the window
/// cache and may run concurrently with evaluations.
///
/// # Persistence
///
/// Every allowed attempt flushes the store before returning. This caps
/// throughput at the speed of the backing store, which is fine for
/// interactive placement rates but not for machine-rate events.
#[derive(Debug)]
pub struct CooldownTracker<S>
where
    S: UsageStore,
{
    policies: RwLock<Arc<PolicyTable>>,
    cache: WindowCache,
    store: Mutex<S>,
    metrics: Metrics,
}

impl<S> CooldownTracker<S>
where
    S: UsageStore,
{
    /// Create a tracker with a policy table and a usage store.
    pub fn new(policies: PolicyTable, store: S) -> Self {
        Self::with_metrics(policies, store, Metrics::new())
    }

    /// Create a tracker that reports into existing metrics.
    pub fn with_metrics(policies: PolicyTable, store: S, metrics: Metrics) -> Self {
        Self {
            policies: RwLock::new(Arc::new(policies)),
            cache: WindowCache::new(),
            store: Mutex::new(store),
            metrics,
        }
    }

    /// Evaluate one usage attempt at `now`.
    ///
    /// Item types without a policy are always allowed and leave no trace.
    /// Otherwise the attempt either starts a new window, counts against the
    /// current one, or is denied once the window's limit is used up.
    ///
    /// A failed flush is logged and does not change the decision.
    pub fn evaluate(&self, actor: ActorId, item: &ItemType, now: Timestamp) -> Decision {
        let policies = self.policies();
        let Some(policy) = policies.get(item).copied() else {
            self.metrics.record_unrestricted();
            return Decision::Allow;
        };

        let key = UsageKey::new(actor, item.clone());
        let mut store = self.lock_store();

        match self.cache.window_start(&key) {
            Some(start) if !policy.window_elapsed(start, now) => {
                let record = store.get(&key).unwrap_or(UsageRecord {
                    count: 0,
                    last_placed: start,
                });

                if record.count >= policy.limit() {
                    let remaining = policy.remaining(start, now);
                    self.metrics.record_denied();
                    tracing::debug!(
                        actor = %actor,
                        item = %item,
                        count = record.count,
                        remaining_ms = remaining.as_millis() as u64,
                        "placement denied"
                    );
                    return Decision::Deny { remaining };
                }

                let record = record.incremented();
                tracing::debug!(actor = %actor, item = %item, count = record.count, "placement counted");
                store.set(key, record);
            }
            _ => {
                tracing::debug!(actor = %actor, item = %item, start = now, "window started");
                self.cache.start_window(key.clone(), now);
                store.set(key, UsageRecord::first(now));
                self.metrics.record_window_started();
            }
        }

        self.metrics.record_allowed();
        self.persist(&mut store);
        Decision::Allow
    }

    /// Drop cached windows that have elapsed at `now`, returning how many
    /// were removed.
    ///
    /// Windows for item types that no longer have a policy are dropped
    /// immediately. Persisted records are left alone.
    pub fn expire(&self, now: Timestamp) -> usize {
        let policies = self.policies();
        let removed = self
            .cache
            .retain(|key, start| match policies.get(&key.item) {
                Some(policy) => !policy.window_elapsed(start, now),
                None => false,
            });

        if removed > 0 {
            self.metrics.record_expired(removed);
            tracing::debug!(removed, live = self.cache.len(), "expired cooldown windows");
        }
        removed
    }

    /// Replace the policy table.
    ///
    /// Existing records and cached windows are kept and are interpreted under
    /// the new table from the next attempt on.
    pub fn reload_policy(&self, policies: PolicyTable) {
        let mut current = self
            .policies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(policies);
    }

    /// Warm the window cache from persisted records still in-window at `now`,
    /// returning how many windows were restored.
    ///
    /// Called once at startup so that restarting does not hand every actor a
    /// fresh window.
    pub fn restore_windows(&self, now: Timestamp) -> usize {
        let policies = self.policies();
        let store = self.lock_store();
        let mut restored = 0;

        store.for_each(|key, record| {
            let live = policies
                .get(&key.item)
                .is_some_and(|policy| !policy.window_elapsed(record.last_placed, now));
            if live && !self.cache.contains(key) {
                self.cache.start_window(key.clone(), record.last_placed);
                restored += 1;
            }
        });

        restored
    }

    /// The current policy table.
    pub fn policies(&self) -> Arc<PolicyTable> {
        Arc::clone(&self.policies.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The persisted record for a key.
    pub fn record(&self, key: &UsageKey) -> Option<UsageRecord> {
        self.lock_store().get(key)
    }

    /// The cached window start for a key.
    pub fn window_start(&self, key: &UsageKey) -> Option<Timestamp> {
        self.cache.window_start(key)
    }

    /// Number of cached windows.
    pub fn cached_windows(&self) -> usize {
        self.cache.len()
    }

    /// Number of persisted records.
    pub fn stored_records(&self) -> usize {
        self.lock_store().len()
    }

    /// Flush the store, propagating any error.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.lock_store().flush()
    }

    /// Run a closure with shared access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock_store())
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, store: &mut S) {
        if let Err(error) = store.flush() {
            self.metrics.record_persist_failure();
            tracing::error!(%error, "failed to persist usage data");
        }
    }
}
