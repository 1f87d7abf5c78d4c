//! YAML configuration.
//!
//! ```yaml
//! blacklist:
//!   DIRT:
//!     limit: 3
//!     period: 60          # seconds
//!   lava_bucket:
//!     limit: 1
//!     period: 300
//! settings:
//!   cleanup-interval: 60  # seconds between expiry sweeps
//!   data-file: playerdata.yml
//! ```
//!
//! Each blacklist entry is loaded on its own: an entry with an unrecognized
//! item name or invalid numbers is skipped with a warning and the rest of
//! the file still loads. Which names are recognized is up to the host's
//! [`ItemCatalog`]; without one, any well-formed name is accepted.

use crate::application::ports::{AnyItem, ConfigError, ItemCatalog, PolicySource};
use crate::domain::{
    item::{ItemType, ItemTypeError},
    policy::{ItemPolicy, PolicyError, PolicyTable},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default data file name, relative to the configuration file.
pub const DEFAULT_DATA_FILE: &str = "playerdata.yml";

/// Default time between expiry sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Reason a single blacklist entry was skipped.
#[derive(Debug, thiserror::Error)]
pub enum PolicyEntryError {
    /// The entry's key is not a recognized item type
    #[error("invalid item type in blacklist: {0}")]
    UnknownItem(#[from] ItemTypeError),
    /// The entry's key is well-formed but not in the item catalog
    #[error("unknown item type: {0}")]
    NotInCatalog(ItemType),
    /// The entry is not a `{limit, period}` mapping of integers
    #[error("malformed blacklist entry: {0}")]
    Malformed(#[from] serde_yaml::Error),
    /// The entry's numbers are out of range
    #[error("invalid blacklist entry: {0}")]
    Invalid(#[from] PolicyError),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    blacklist: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    settings: RawSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSettings {
    cleanup_interval: Option<u64>,
    data_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    limit: i64,
    period: i64,
}

/// Fully loaded limiter configuration.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Policies for restricted item types
    pub policies: PolicyTable,
    /// Time between expiry sweeps
    pub cleanup_interval: Duration,
    /// Location of the usage data file
    pub data_file: PathBuf,
}

impl LimiterConfig {
    /// Load configuration from a file.
    ///
    /// A relative `data-file` is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_catalog(path, &AnyItem)
    }

    /// Load configuration from a file, skipping blacklist entries for item
    /// types `catalog` does not contain.
    pub fn load_with_catalog(
        path: impl AsRef<Path>,
        catalog: &dyn ItemCatalog,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        Self::parse_with_catalog(&contents, base, catalog).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration text, resolving a relative `data-file` against
    /// `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self, serde_yaml::Error> {
        Self::parse_with_catalog(contents, base_dir, &AnyItem)
    }

    /// Parse configuration text against an item catalog.
    pub fn parse_with_catalog(
        contents: &str,
        base_dir: &Path,
        catalog: &dyn ItemCatalog,
    ) -> Result<Self, serde_yaml::Error> {
        let raw: RawConfig = if contents.trim().is_empty() {
            RawConfig {
                blacklist: None,
                settings: RawSettings::default(),
            }
        } else {
            serde_yaml::from_str(contents)?
        };

        let policies = match raw.blacklist {
            Some(entries) => load_policies(entries, catalog),
            None => {
                tracing::warn!("configuration has no blacklist section; nothing is restricted");
                PolicyTable::new()
            }
        };

        let cleanup_interval = match raw.settings.cleanup_interval {
            Some(0) => {
                tracing::warn!(
                    default_secs = DEFAULT_CLEANUP_INTERVAL.as_secs(),
                    "cleanup-interval must be positive; using default"
                );
                DEFAULT_CLEANUP_INTERVAL
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_CLEANUP_INTERVAL,
        };

        let data_file = raw
            .settings
            .data_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        Ok(Self {
            policies,
            cleanup_interval,
            data_file: base_dir.join(data_file),
        })
    }
}

fn load_policies(
    entries: BTreeMap<String, serde_yaml::Value>,
    catalog: &dyn ItemCatalog,
) -> PolicyTable {
    let mut table = PolicyTable::new();

    for (name, value) in entries {
        match parse_entry(&name, value, catalog) {
            Ok((item, policy)) => {
                if table.contains(&item) {
                    tracing::warn!(entry = %name, %item, "duplicate blacklist entry; later entry wins");
                }
                table = table.with(item, policy);
            }
            Err(error) => {
                tracing::warn!(entry = %name, %error, "skipping blacklist entry");
            }
        }
    }

    table
}

fn parse_entry(
    name: &str,
    value: serde_yaml::Value,
    catalog: &dyn ItemCatalog,
) -> Result<(ItemType, ItemPolicy), PolicyEntryError> {
    let item = ItemType::parse(name)?;
    if !catalog.contains(&item) {
        return Err(PolicyEntryError::NotInCatalog(item));
    }
    let raw: RawPolicy = serde_yaml::from_value(value)?;
    let policy = ItemPolicy::from_config(raw.limit, raw.period)?;
    Ok((item, policy))
}

/// Policy source that re-reads a YAML configuration file on every load.
#[derive(Debug, Clone)]
pub struct YamlConfigFile {
    path: PathBuf,
    catalog: Arc<dyn ItemCatalog>,
}

impl YamlConfigFile {
    /// Create a source for the file at `path` that accepts any item name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            catalog: Arc::new(AnyItem),
        }
    }

    /// Only accept item types in `catalog`.
    pub fn with_catalog(mut self, catalog: impl ItemCatalog + 'static) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole configuration, settings included.
    pub fn load_config(&self) -> Result<LimiterConfig, ConfigError> {
        LimiterConfig::load_with_catalog(&self.path, self.catalog.as_ref())
    }
}

impl PolicySource for YamlConfigFile {
    fn load(&self) -> Result<PolicyTable, ConfigError> {
        self.load_config().map(|config| config.policies)
    }
}
