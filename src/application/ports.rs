//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::item::ItemType;
use crate::domain::policy::PolicyTable;
use crate::domain::record::{Timestamp, UsageKey, UsageRecord};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

/// Error raised by a usage store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("failed to access usage data at {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The backing file exists but could not be parsed
    #[error("usage data at {} is malformed: {source}", .path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
    /// The in-memory state could not be serialized
    #[error("failed to serialize usage data: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Error raised when the configuration as a whole cannot be loaded.
///
/// Problems with individual policy entries are not errors: those entries are
/// skipped with a warning.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid YAML of the expected shape
    #[error("configuration {} is malformed: {source}", .path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Port for durable usage storage.
///
/// A simple key-value store keyed by actor and item type. Writes through
/// `set` become durable on the next `flush`. Infrastructure provides concrete
/// implementations (MemoryStore, YamlFileStore).
pub trait UsageStore: Send + Debug {
    /// Look up the record for a key.
    fn get(&self, key: &UsageKey) -> Option<UsageRecord>;

    /// Insert or replace the record for a key.
    fn set(&mut self, key: UsageKey, record: UsageRecord);

    /// Write all records to durable storage.
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Number of stored records.
    fn len(&self) -> usize;

    /// Check if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every stored record.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&UsageKey, &UsageRecord);
}

/// Port for reading the policy configuration.
///
/// Called once at startup and again on every administrative reload.
pub trait PolicySource: Send + Sync + Debug {
    /// Load the current policy table.
    fn load(&self) -> Result<PolicyTable, ConfigError>;
}

impl PolicySource for PolicyTable {
    fn load(&self) -> Result<PolicyTable, ConfigError> {
        Ok(self.clone())
    }
}

/// Port for the host's registry of item types.
///
/// Configuration entries naming an item type the catalog does not contain
/// are skipped with a warning, so a typo does not silently become a policy
/// that never matches.
pub trait ItemCatalog: Send + Sync + Debug {
    /// Check if `item` is a real item type.
    fn contains(&self, item: &ItemType) -> bool;
}

/// Catalog accepting every well-formed item name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyItem;

impl ItemCatalog for AnyItem {
    fn contains(&self, _item: &ItemType) -> bool {
        true
    }
}

impl ItemCatalog for HashSet<ItemType> {
    fn contains(&self, item: &ItemType) -> bool {
        HashSet::contains(self, item)
    }
}

impl ItemCatalog for BTreeSet<ItemType> {
    fn contains(&self, item: &ItemType) -> bool {
        BTreeSet::contains(self, item)
    }
}
