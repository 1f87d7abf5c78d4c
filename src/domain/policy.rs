//! Per-item-type limiting policies.
//!
//! A policy caps how many times an actor may use an item type within a
//! window. Windows are fixed from their first use: once the window has
//! elapsed the next use starts a new one.

use crate::domain::item::ItemType;
use crate::domain::record::Timestamp;
use std::collections::HashMap;
use std::time::Duration;

/// Error returned when a policy's parameters are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The limit must allow at least one use per window.
    #[error("limit must be greater than 0")]
    ZeroLimit,
    /// The window must have a non-zero length.
    #[error("period must be greater than 0")]
    ZeroWindow,
    /// The configured limit was negative or too large.
    #[error("limit {0} is out of range")]
    LimitOutOfRange(i64),
    /// The configured period was negative or too large.
    #[error("period {0} is out of range")]
    PeriodOutOfRange(i64),
}

/// Limit and window length for one item type.
///
/// # Example
/// ```
/// use placement_limiter::ItemPolicy;
/// use std::time::Duration;
///
/// let policy = ItemPolicy::new(3, Duration::from_secs(60)).unwrap();
/// assert!(!policy.window_elapsed(0, 60_000));
/// assert!(policy.window_elapsed(0, 60_001));
/// assert_eq!(policy.remaining(0, 3_000), Duration::from_secs(57));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPolicy {
    limit: u32,
    window: Duration,
}

impl ItemPolicy {
    /// Create a policy allowing `limit` uses per `window`.
    ///
    /// # Errors
    /// Returns `PolicyError::ZeroLimit` or `PolicyError::ZeroWindow` if either
    /// parameter is zero.
    pub fn new(limit: u32, window: Duration) -> Result<Self, PolicyError> {
        if limit == 0 {
            return Err(PolicyError::ZeroLimit);
        }
        if window.as_millis() == 0 {
            return Err(PolicyError::ZeroWindow);
        }
        Ok(Self { limit, window })
    }

    /// Create a policy from raw configuration values: a limit and a period
    /// in seconds.
    pub fn from_config(limit: i64, period_secs: i64) -> Result<Self, PolicyError> {
        let limit = match u32::try_from(limit) {
            Ok(0) => return Err(PolicyError::ZeroLimit),
            Ok(limit) => limit,
            Err(_) => return Err(PolicyError::LimitOutOfRange(limit)),
        };
        let period = match u64::try_from(period_secs) {
            Ok(0) => return Err(PolicyError::ZeroWindow),
            Ok(secs) if secs <= u64::MAX / 1000 => secs,
            _ => return Err(PolicyError::PeriodOutOfRange(period_secs)),
        };
        Self::new(limit, Duration::from_secs(period))
    }

    /// Maximum uses per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in milliseconds.
    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    /// Whether a window that started at `start` is over at `now`.
    ///
    /// A window is over once strictly more than its length has passed. A
    /// `now` earlier than `start` counts as inside the window.
    pub fn window_elapsed(&self, start: Timestamp, now: Timestamp) -> bool {
        now.saturating_sub(start) > self.window_millis()
    }

    /// Time left in a window that started at `start`, as seen at `now`.
    pub fn remaining(&self, start: Timestamp, now: Timestamp) -> Duration {
        let elapsed = now.saturating_sub(start);
        Duration::from_millis(self.window_millis().saturating_sub(elapsed))
    }
}

/// The full set of policies, keyed by item type.
///
/// Item types without an entry are unrestricted. A table is immutable once
/// built; reloading configuration produces a new table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    policies: HashMap<ItemType, ItemPolicy>,
}

impl PolicyTable {
    /// Create an empty table (everything unrestricted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the policy for an item type, builder style.
    pub fn with(mut self, item: ItemType, policy: ItemPolicy) -> Self {
        self.policies.insert(item, policy);
        self
    }

    /// Policy for an item type, if it is restricted.
    pub fn get(&self, item: &ItemType) -> Option<&ItemPolicy> {
        self.policies.get(item)
    }

    /// Whether an item type is restricted.
    pub fn contains(&self, item: &ItemType) -> bool {
        self.policies.contains_key(item)
    }

    /// Number of restricted item types.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no item type is restricted.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Iterate over all restricted item types and their policies.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemType, &ItemPolicy)> {
        self.policies.iter()
    }
}

impl FromIterator<(ItemType, ItemPolicy)> for PolicyTable {
    fn from_iter<I: IntoIterator<Item = (ItemType, ItemPolicy)>>(iter: I) -> Self {
        Self {
            policies: iter.into_iter().collect(),
        }
    }
}
