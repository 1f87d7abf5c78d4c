//! Mock clock for testing.

use crate::application::ports::Clock;
use crate::domain::record::Timestamp;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling deterministic
/// testing of window expiry.
///
/// # Examples
///
/// ```
/// use placement_limiter::infrastructure::mocks::MockClock;
/// use placement_limiter::application::ports::Clock;
/// use std::time::Duration;
///
/// let clock = MockClock::new(1_000);
/// assert_eq!(clock.now(), 1_000);
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), 11_000);
///
/// clock.set(500);
/// assert_eq!(clock.now(), 500);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time value, so advancing time in
/// one clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Timestamp>>,
}

impl MockClock {
    /// Create a mock clock starting at `start` milliseconds.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = time.saturating_add(millis);
    }

    /// Set the clock to a specific timestamp.
    pub fn set(&self, timestamp: Timestamp) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = timestamp;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}
