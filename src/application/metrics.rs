//! Observability metrics for placement limiting.
//!
//! Provides counters about limiter behavior for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking limiter statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Restricted attempts that were allowed
    attempts_allowed: AtomicU64,
    /// Restricted attempts that were denied
    attempts_denied: AtomicU64,
    /// Attempts on item types without a policy
    attempts_unrestricted: AtomicU64,
    /// Attempts by actors holding the bypass capability
    attempts_bypassed: AtomicU64,
    /// New windows started
    windows_started: AtomicU64,
    /// Window cache entries removed by expiry sweeps
    entries_expired: AtomicU64,
    /// Failed durable writes
    persist_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.attempts_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.attempts_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unrestricted(&self) {
        self.inner
            .attempts_unrestricted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypassed(&self) {
        self.inner.attempts_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_window_started(&self) {
        self.inner.windows_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self, count: usize) {
        self.inner
            .entries_expired
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_persist_failure(&self) {
        self.inner.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Restricted attempts that were allowed (including window starts).
    pub fn attempts_allowed(&self) -> u64 {
        self.inner.attempts_allowed.load(Ordering::Relaxed)
    }

    /// Restricted attempts that were denied.
    pub fn attempts_denied(&self) -> u64 {
        self.inner.attempts_denied.load(Ordering::Relaxed)
    }

    /// Attempts on item types without a policy.
    pub fn attempts_unrestricted(&self) -> u64 {
        self.inner.attempts_unrestricted.load(Ordering::Relaxed)
    }

    /// Attempts by actors holding the bypass capability.
    pub fn attempts_bypassed(&self) -> u64 {
        self.inner.attempts_bypassed.load(Ordering::Relaxed)
    }

    /// New windows started.
    pub fn windows_started(&self) -> u64 {
        self.inner.windows_started.load(Ordering::Relaxed)
    }

    /// Window cache entries removed by expiry sweeps.
    pub fn entries_expired(&self) -> u64 {
        self.inner.entries_expired.load(Ordering::Relaxed)
    }

    /// Failed durable writes.
    pub fn persist_failures(&self) -> u64 {
        self.inner.persist_failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts_allowed: self.attempts_allowed(),
            attempts_denied: self.attempts_denied(),
            attempts_unrestricted: self.attempts_unrestricted(),
            attempts_bypassed: self.attempts_bypassed(),
            windows_started: self.windows_started(),
            entries_expired: self.entries_expired(),
            persist_failures: self.persist_failures(),
        }
    }
}

/// Point-in-time copy of all metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub attempts_allowed: u64,
    pub attempts_denied: u64,
    pub attempts_unrestricted: u64,
    pub attempts_bypassed: u64,
    pub windows_started: u64,
    pub entries_expired: u64,
    pub persist_failures: u64,
}

impl MetricsSnapshot {
    /// Total attempts that were evaluated against a policy.
    pub fn restricted_attempts(&self) -> u64 {
        self.attempts_allowed + self.attempts_denied
    }

    /// Fraction of restricted attempts that were denied (0.0 - 1.0).
    pub fn denial_rate(&self) -> f64 {
        let total = self.restricted_attempts();
        if total == 0 {
            0.0
        } else {
            self.attempts_denied as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();

        metrics.record_allowed();
        metrics.record_allowed();
        metrics.record_denied();
        metrics.record_unrestricted();
        metrics.record_bypassed();
        metrics.record_window_started();
        metrics.record_expired(4);
        metrics.record_persist_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts_allowed, 2);
        assert_eq!(snapshot.attempts_denied, 1);
        assert_eq!(snapshot.attempts_unrestricted, 1);
        assert_eq!(snapshot.attempts_bypassed, 1);
        assert_eq!(snapshot.windows_started, 1);
        assert_eq!(snapshot.entries_expired, 4);
        assert_eq!(snapshot.persist_failures, 1);
        assert_eq!(snapshot.restricted_attempts(), 3);
    }

    #[test]
    fn test_denial_rate() {
        assert_eq!(MetricsSnapshot::default().denial_rate(), 0.0);

        let metrics = Metrics::new();
        for _ in 0..3 {
            metrics.record_allowed();
        }
        metrics.record_denied();
        assert!((metrics.snapshot().denial_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        clone.record_denied();
        assert_eq!(metrics.attempts_denied(), 1);
    }
}
