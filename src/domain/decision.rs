//! Decisions returned for usage attempts.

use crate::domain::item::ItemType;
use std::fmt;
use std::time::Duration;

/// Outcome of evaluating a usage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The use may proceed
    Allow,
    /// The limit is reached; the use must be suppressed
    Deny {
        /// Time until the current window ends
        remaining: Duration,
    },
}

impl Decision {
    /// Check if this decision is Allow.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Check if this decision is Deny.
    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    /// Whole seconds to wait before the item can be used again.
    ///
    /// Rounded up rather than truncated, so 56.5 seconds reads as 57 and a
    /// deny never reports 0: the window only ends once strictly more than its
    /// length has passed. Returns `None` for Allow.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            Decision::Allow => None,
            Decision::Deny { remaining } => {
                let millis = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
                Some(millis.div_ceil(1000).max(1))
            }
        }
    }

    /// The message to show the actor, for a deny.
    pub fn notice(&self, item: &ItemType) -> Option<DenyNotice> {
        self.remaining_secs().map(|remaining_secs| DenyNotice {
            item: item.display_name(),
            remaining_secs,
        })
    }
}

/// Two-line message shown to an actor whose use was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyNotice {
    item: String,
    remaining_secs: u64,
}

impl DenyNotice {
    /// Seconds until the item can be used again.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// The reason line followed by the wait line.
    pub fn lines(&self) -> [String; 2] {
        [
            format!("You have reached the limit for placing {}s.", self.item),
            format!(
                "You can place them again in {} seconds.",
                self.remaining_secs
            ),
        ]
    }
}

impl fmt::Display for DenyNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [reason, wait] = self.lines();
        write!(f, "{reason}\n{wait}")
    }
}
