//! JSON file preference store
//!
//! Stores each partition in `<dir>/<partition>.json` as a flat object
//! mapping key to string or integer.
//!
//! Durability:
//! - Commit writes `<partition>.json.tmp` then renames it over the target,
//!   so a partition file is always either the old or the new version
//! - The in-memory copy is only updated after the rename succeeds
//! - A file that is not a JSON object is treated as an empty partition
//! - Entries that are neither text nor a 32-bit integer are skipped, the
//!   rest of the partition is kept

use super::{validate_partition_name, PrefValue, PreferenceStore};
use crate::error::{CoreError, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Entries = BTreeMap<String, PrefValue>;

/// One JSON document per partition, cached after first access
pub struct JsonFileStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Entries>>,
}

impl JsonFileStore {
    /// The directory is created lazily on first commit.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn partition_path(&self, partition: &str) -> PathBuf {
        self.dir.join(format!("{}.json", partition))
    }

    fn load(path: &Path) -> Result<Entries> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(CoreError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Corrupt preference file, starting from an empty partition"
                );
                return Ok(Entries::new());
            }
        };

        let mut entries = Entries::new();
        for (key, value) in raw {
            match decode_value(value) {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => warn!(
                    path = %path.display(),
                    key = %key,
                    "Skipping preference that is neither text nor a 32-bit integer"
                ),
            }
        }

        debug!(path = %path.display(), entries = entries.len(), "Partition loaded");
        Ok(entries)
    }

    fn read_entries<R>(&self, partition: &str, f: impl FnOnce(&Entries) -> R) -> Result<R> {
        validate_partition_name(partition)?;

        if let Some(entries) = self.cache.read().get(partition) {
            return Ok(f(entries));
        }

        let mut cache = self.cache.write();
        if !cache.contains_key(partition) {
            let entries = Self::load(&self.partition_path(partition))?;
            cache.insert(partition.to_string(), entries);
        }
        Ok(f(&cache[partition]))
    }

    fn write_file(&self, partition: &str, entries: &Entries) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CoreError::FileWrite {
            path: self.dir.clone(),
            source,
        })?;

        let content =
            serde_json::to_string_pretty(entries).map_err(|source| CoreError::JsonEncode {
                partition: partition.to_string(),
                source,
            })?;

        let path = self.partition_path(partition);
        let tmp_path = self.dir.join(format!("{}.json.tmp", partition));
        std::fs::write(&tmp_path, content).map_err(|source| CoreError::FileWrite {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp_path);
            CoreError::FileWrite {
                path: path.clone(),
                source,
            }
        })?;

        debug!(path = %path.display(), "Partition written");
        Ok(())
    }
}

fn decode_value(value: serde_json::Value) -> Option<PrefValue> {
    match value {
        serde_json::Value::String(s) => Some(PrefValue::Text(s)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(PrefValue::Int),
        _ => None,
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, partition: &str, key: &str) -> Result<Option<PrefValue>> {
        self.read_entries(partition, |entries| entries.get(key).cloned())
    }

    fn commit(&self, partition: &str, changes: &[(String, PrefValue)]) -> Result<()> {
        validate_partition_name(partition)?;

        // Held across the file write so commits are serialized
        let mut cache = self.cache.write();
        let mut entries = match cache.get(partition) {
            Some(entries) => entries.clone(),
            None => Self::load(&self.partition_path(partition))?,
        };
        for (key, value) in changes {
            entries.insert(key.clone(), value.clone());
        }

        self.write_file(partition, &entries)?;
        cache.insert(partition.to_string(), entries);
        Ok(())
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>> {
        self.read_entries(partition, |entries| entries.keys().cloned().collect())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn text(s: &str) -> PrefValue {
        PrefValue::Text(s.to_string())
    }

    #[test]
    fn test_commit_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("nested").join("prefs");
        let store = JsonFileStore::new(&store_dir);

        store.commit("p", &[("title".into(), text("Alert"))]).unwrap();

        let path = store.partition_path("p");
        assert!(path.exists());
        assert!(!store_dir.join("p.json.tmp").exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["title"], "Alert");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = JsonFileStore::new(dir.path());
            store
                .commit(
                    "p",
                    &[
                        ("title".into(), text("Hello")),
                        ("displayFlag".into(), PrefValue::Int(1)),
                    ],
                )
                .unwrap();
        }

        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.get("p", "title").unwrap(), Some(text("Hello")));
        assert_eq!(store.get("p", "displayFlag").unwrap(), Some(PrefValue::Int(1)));
    }

    #[test]
    fn test_missing_file_is_empty_partition() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.get("p", "title").unwrap(), None);
        assert!(store.keys("p").unwrap().is_empty());
        assert!(!store.partition_path("p").exists());
    }

    #[test]
    fn test_corrupt_file_is_recovered_on_next_commit() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("p.json"), "{ not json").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.get("p", "title").unwrap(), None);

        store.commit("p", &[("title".into(), text("fixed"))]).unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get("p", "title").unwrap(), Some(text("fixed")));
    }

    #[test]
    fn test_undecodable_entry_keeps_the_rest_of_the_partition() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("p.json"),
            r#"{"title":"Hello","displayFlag":4294967296,"ratio":0.5,"on":true,"gone":null}"#,
        )
        .unwrap();

        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.get("p", "title").unwrap(), Some(text("Hello")));
        assert_eq!(store.get("p", "displayFlag").unwrap(), None);
        assert_eq!(store.keys("p").unwrap(), vec!["title"]);

        store
            .commit("p", &[("displayFlag".into(), PrefValue::Int(1))])
            .unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get("p", "title").unwrap(), Some(text("Hello")));
        assert_eq!(reopened.get("p", "displayFlag").unwrap(), Some(PrefValue::Int(1)));
    }

    #[test]
    fn test_non_object_file_is_empty_partition() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("p.json"), "[1, 2, 3]").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert!(store.keys("p").unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_cache_untouched() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.commit("p", &[("title".into(), text("old"))]).unwrap();

        // A directory where the temp file should go
        std::fs::create_dir(dir.path().join("p.json.tmp")).unwrap();

        let err = store.commit("p", &[("title".into(), text("new"))]).unwrap_err();
        assert!(matches!(err, CoreError::FileWrite { .. }));
        assert_eq!(store.get("p", "title").unwrap(), Some(text("old")));

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get("p", "title").unwrap(), Some(text("old")));
    }

    #[test]
    fn test_rejects_path_like_partition() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let err = store.commit("../escape", &[("k".into(), PrefValue::Int(1))]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPartition { .. }));
    }
}
