//! File-backed usage store.
//!
//! Records live in memory and the whole file is rewritten on every flush.
//! The file is a two-level YAML mapping, actor id then item type:
//!
//! ```yaml
//! 0f8fad5b-d9cb-469f-a165-70867728950e:
//!   DIRT:
//!     count: 3
//!     lastPlaced: 1700000000000
//! ```

use crate::application::ports::{StoreError, UsageStore};
use crate::domain::{
    actor::ActorId,
    item::ItemType,
    record::{UsageKey, UsageRecord},
};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

type UsageFile = BTreeMap<ActorId, BTreeMap<String, UsageRecord>>;

/// Durable usage store persisted as a YAML file.
#[derive(Debug)]
pub struct YamlFileStore {
    path: PathBuf,
    records: HashMap<UsageKey, UsageRecord>,
}

impl YamlFileStore {
    /// Open the store at `path`, loading any existing records.
    ///
    /// Missing parent directories are created and a missing file is treated
    /// as an empty store. Entries with an unrecognized actor id, item type or
    /// record shape are skipped with a warning.
    ///
    /// # Errors
    /// Returns `StoreError` if the file exists but cannot be read or is not
    /// a YAML mapping.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let records = parse_records(&path, &contents)?;
        tracing::debug!(path = %path.display(), records = records.len(), "loaded usage data");

        Ok(Self { path, records })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("usage"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn to_file(&self) -> UsageFile {
        let mut file = UsageFile::new();
        for (key, record) in &self.records {
            file.entry(key.actor)
                .or_default()
                .insert(key.item.to_string(), *record);
        }
        file
    }
}

fn parse_records(
    path: &Path,
    contents: &str,
) -> Result<HashMap<UsageKey, UsageRecord>, StoreError> {
    let mut records = HashMap::new();
    if contents.trim().is_empty() {
        return Ok(records);
    }

    let raw: Option<serde_yaml::Mapping> =
        serde_yaml::from_str(contents).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (actor_key, items) in raw.unwrap_or_default() {
        let actor = match serde_yaml::from_value::<ActorId>(actor_key.clone()) {
            Ok(actor) => actor,
            Err(error) => {
                tracing::warn!(actor = ?actor_key, %error, "skipping usage data for invalid actor id");
                continue;
            }
        };

        let items: BTreeMap<String, serde_yaml::Value> = match serde_yaml::from_value(items) {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(%actor, %error, "skipping malformed usage data");
                continue;
            }
        };

        for (item_name, value) in items {
            let item = match ItemType::parse(&item_name) {
                Ok(item) => item,
                Err(error) => {
                    tracing::warn!(%actor, item = %item_name, %error, "skipping usage data for invalid item type");
                    continue;
                }
            };
            match serde_yaml::from_value::<UsageRecord>(value) {
                Ok(record) => {
                    records.insert(UsageKey::new(actor, item), record);
                }
                Err(error) => {
                    tracing::warn!(%actor, %item, %error, "skipping malformed usage record");
                }
            }
        }
    }

    Ok(records)
}

impl UsageStore for YamlFileStore {
    fn get(&self, key: &UsageKey) -> Option<UsageRecord> {
        self.records.get(key).copied()
    }

    fn set(&mut self, key: UsageKey, record: UsageRecord) {
        self.records.insert(key, record);
    }

    /// Rewrite the file through a sibling temporary file, so a crash never
    /// leaves a truncated file behind.
    fn flush(&mut self) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(&self.to_file()).map_err(StoreError::Serialize)?;
        let temp = self.temp_path();

        fs::write(&temp, yaml).map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&UsageKey, &UsageRecord),
    {
        for (key, record) in &self.records {
            f(key, record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockCaptureLayer;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    const ACTOR: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    #[test]
    fn test_missing_file_is_empty_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugins").join("limiter").join("playerdata.yml");

        let store = YamlFileStore::open(&path).unwrap();

        assert!(store.is_empty());
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_flush_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerdata.yml");
        let key = UsageKey::new(ACTOR.parse().unwrap(), ItemType::parse("DIRT").unwrap());
        let record = UsageRecord {
            count: 3,
            last_placed: 1_700_000_000_000,
        };

        let mut store = YamlFileStore::open(&path).unwrap();
        store.set(key.clone(), record);
        store.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(ACTOR));
        assert!(contents.contains("DIRT:"));
        assert!(contents.contains("lastPlaced: 1700000000000"));
        assert!(!store.temp_path().exists());

        let reopened = YamlFileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(&key), Some(record));
    }

    #[test]
    fn test_reads_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerdata.yml");
        fs::write(
            &path,
            format!("{ACTOR}:\n  dirt:\n    count: 2\n    lastPlaced: 500\n  TNT:\n    count: 1\n    lastPlaced: 900\n"),
        )
        .unwrap();

        let store = YamlFileStore::open(&path).unwrap();
        let actor: ActorId = ACTOR.parse().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get(&UsageKey::new(actor, ItemType::parse("DIRT").unwrap())),
            Some(UsageRecord {
                count: 2,
                last_placed: 500
            })
        );
    }

    #[test]
    fn test_invalid_entries_are_skipped_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerdata.yml");
        fs::write(
            &path,
            format!(
                "not-a-uuid:\n  DIRT:\n    count: 1\n    lastPlaced: 1\n\
                 {ACTOR}:\n  bad.item:\n    count: 1\n    lastPlaced: 1\n  \
                 SAND:\n    count: lots\n  GRAVEL:\n    count: 1\n    lastPlaced: 7\n"
            ),
        )
        .unwrap();

        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let store = tracing::subscriber::with_default(subscriber, || {
            YamlFileStore::open(&path).unwrap()
        });

        assert_eq!(store.len(), 1);
        let warnings = capture
            .get_captured()
            .into_iter()
            .filter(|event| event.level == Level::WARN)
            .count();
        assert_eq!(warnings, 3);
    }

    #[test]
    fn test_actor_keys_round_trip_through_serde() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerdata.yml");
        let actor: ActorId = ACTOR.parse().unwrap();

        let mut store = YamlFileStore::open(&path).unwrap();
        store.set(
            UsageKey::new(actor, ItemType::parse("TNT").unwrap()),
            UsageRecord::first(42),
        );
        store.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(ACTOR));

        // Non-string keys are skipped like any other invalid actor id.
        fs::write(&path, format!("{contents}7:\n  DIRT:\n    count: 1\n    lastPlaced: 1\n")).unwrap();
        let reopened = YamlFileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get(&UsageKey::new(actor, ItemType::parse("TNT").unwrap())),
            Some(UsageRecord::first(42))
        );
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerdata.yml");
        fs::write(&path, "- just\n- a list\n").unwrap();

        let result = YamlFileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_flush_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("playerdata.yml");
        let mut store = YamlFileStore::open(&path).unwrap();
        fs::remove_dir_all(dir.path().join("data")).unwrap();

        store.set(
            UsageKey::new(ActorId::random(), ItemType::parse("DIRT").unwrap()),
            UsageRecord::first(0),
        );
        assert!(matches!(store.flush(), Err(StoreError::Io { .. })));
        // The record is still available in memory.
        assert_eq!(store.len(), 1);
    }
}
