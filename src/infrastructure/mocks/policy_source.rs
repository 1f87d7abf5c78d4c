//! Policy source whose table can be swapped between loads.

use crate::application::ports::{ConfigError, PolicySource};
use crate::domain::policy::PolicyTable;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Policy source backed by a shared, replaceable table.
///
/// Clones share the same table, so a test can keep one clone and change
/// what the next reload returns.
#[derive(Debug, Clone)]
pub struct MockPolicySource {
    state: Arc<Mutex<Option<PolicyTable>>>,
}

impl MockPolicySource {
    /// Create a source that returns `table`.
    pub fn new(table: PolicyTable) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(table))),
        }
    }

    /// Return `table` from subsequent loads.
    pub fn set(&self, table: PolicyTable) {
        *self
            .state
            .lock()
            .expect("MockPolicySource mutex poisoned - a test thread panicked while holding the lock") =
            Some(table);
    }

    /// Make subsequent loads fail as if the file were unreadable.
    pub fn break_source(&self) {
        *self
            .state
            .lock()
            .expect("MockPolicySource mutex poisoned - a test thread panicked while holding the lock") =
            None;
    }
}

impl PolicySource for MockPolicySource {
    fn load(&self) -> Result<PolicyTable, ConfigError> {
        self.state
            .lock()
            .expect("MockPolicySource mutex poisoned - a test thread panicked while holding the lock")
            .clone()
            .ok_or_else(|| ConfigError::Io {
                path: PathBuf::from("mock-config.yml"),
                source: io::Error::new(io::ErrorKind::NotFound, "configuration unavailable"),
            })
    }
}
