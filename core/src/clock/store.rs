use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A typed value held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClockValue {
    Timestamp(DateTime<Utc>),
    Integer(i64),
    Text(String),
    Guid(Uuid),
}

impl ClockValue {
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(id) => Some(*id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "timestamp",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Guid(_) => "guid",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write state file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable key-value storage. Last writer wins.
pub trait ClockStore: Send + Sync {
    fn get(&self, key: &str) -> Option<ClockValue>;

    /// Store a value. The value is visible to `get` even when persisting it fails.
    fn set(&self, key: &str, value: ClockValue) -> Result<(), StoreError>;
}

fn lock_entries(
    entries: &Mutex<BTreeMap<String, ClockValue>>,
) -> MutexGuard<'_, BTreeMap<String, ClockValue>> {
    // A panic mid-insert cannot leave a BTreeMap half-written, so a poisoned map is still usable
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Volatile store for tests and runs that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryClockStore {
    entries: Mutex<BTreeMap<String, ClockValue>>,
}

impl MemoryClockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClockStore for MemoryClockStore {
    fn get(&self, key: &str) -> Option<ClockValue> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: ClockValue) -> Result<(), StoreError> {
        lock_entries(&self.entries).insert(key.to_string(), value);
        Ok(())
    }
}

const STATE_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    entries: BTreeMap<String, ClockValue>,
}

/// Store backed by a single pretty-printed JSON file, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonClockStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, ClockValue>>,
}

impl JsonClockStore {
    /// Open the state file, starting empty if it doesn't exist or can't be parsed
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_disk(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> BTreeMap<String, ClockValue> {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<StateFile>(&content) {
                Ok(state) if state.version == STATE_VERSION => state.entries,
                Ok(state) => {
                    tracing::warn!(
                        path = %path.display(),
                        version = state.version,
                        "State file version mismatch, starting fresh"
                    );
                    BTreeMap::new()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse state file, starting fresh");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read state file, starting fresh");
                BTreeMap::new()
            }
        }
    }

    fn save_to_disk(&self, entries: &BTreeMap<String, ClockValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        let state = StateFile {
            version: STATE_VERSION,
            entries: entries.clone(),
        };
        let content = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ClockStore for JsonClockStore {
    fn get(&self, key: &str) -> Option<ClockValue> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: ClockValue) -> Result<(), StoreError> {
        let mut entries = lock_entries(&self.entries);
        entries.insert(key.to_string(), value);
        self.save_to_disk(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("stream-out-store-{}", Uuid::new_v4()))
            .join("state.json")
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let path = scratch_path();
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let id = Uuid::new_v4();

        {
            let store = JsonClockStore::open(&path);
            store.set("deaths_daily_next_reset", ClockValue::Timestamp(ts)).unwrap();
            store.set("deaths_baseline_daily", ClockValue::Integer(42)).unwrap();
            store.set("pvp_season", ClockValue::Guid(id)).unwrap();
            store.set("map_last_name", ClockValue::Text("Lion's Arch".into())).unwrap();
        }

        let reopened = JsonClockStore::open(&path);
        assert_eq!(
            reopened.get("deaths_daily_next_reset").and_then(|v| v.as_timestamp()),
            Some(ts)
        );
        assert_eq!(
            reopened.get("deaths_baseline_daily").and_then(|v| v.as_integer()),
            Some(42)
        );
        assert_eq!(reopened.get("pvp_season").and_then(|v| v.as_guid()), Some(id));
        assert_eq!(
            reopened.get("map_last_name").as_ref().and_then(|v| v.as_text()),
            Some("Lion's Arch")
        );

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_store_last_writer_wins() {
        let path = scratch_path();
        let store = JsonClockStore::open(&path);
        store.set("k", ClockValue::Integer(1)).unwrap();
        store.set("k", ClockValue::Integer(2)).unwrap();

        assert_eq!(JsonClockStore::open(&path).get("k"), Some(ClockValue::Integer(2)));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_state_file_starts_empty() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = JsonClockStore::open(&path);
        assert_eq!(store.get("anything"), None);

        // and is repaired by the next write
        store.set("k", ClockValue::Integer(7)).unwrap();
        assert_eq!(JsonClockStore::open(&path).get("k"), Some(ClockValue::Integer(7)));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_clock_value_wire_format() {
        let json = serde_json::to_string(&ClockValue::Integer(5)).unwrap();
        assert_eq!(json, r#"{"type":"integer","value":5}"#);
    }
}
