//! Usage bookkeeping records.

use crate::domain::actor::ActorId;
use crate::domain::item::ItemType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Identifies the usage of one item type by one actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageKey {
    /// The actor using the item
    pub actor: ActorId,
    /// The item type being used
    pub item: ItemType,
}

impl UsageKey {
    /// Create a key for an actor and item type.
    pub fn new(actor: ActorId, item: ItemType) -> Self {
        Self { actor, item }
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.actor, self.item)
    }
}

/// Persisted count of uses within the current window.
///
/// `last_placed` is the start of the window the count belongs to; it is only
/// rewritten when a new window begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Uses recorded since `last_placed`
    pub count: u32,
    /// Start of the current window
    #[serde(rename = "lastPlaced")]
    pub last_placed: Timestamp,
}

impl UsageRecord {
    /// Record for the first use of a new window starting at `now`.
    pub fn first(now: Timestamp) -> Self {
        Self {
            count: 1,
            last_placed: now,
        }
    }

    /// The same window with one more use.
    pub fn incremented(self) -> Self {
        Self {
            count: self.count.saturating_add(1),
            ..self
        }
    }
}
