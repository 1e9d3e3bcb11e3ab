//! Session persistence.
//!
//! A session is stored as one JSON snapshot under a well-known key. Loading
//! never rejects a snapshot: it is migrated to the current schema, merged
//! onto a default-shaped snapshot so missing fields are backfilled, and any
//! field that still fails to decode is dropped back to its default.

use crate::sampler::SamplerSnapshot;
use crate::story::SessionState;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::fs;

/// Storage key for the session snapshot.
pub const STORAGE_KEY: &str = "museum_wakes_v2";

/// Current snapshot schema.
pub const SCHEMA_VERSION: u32 = 2;

/// Keys of the per-path counter sections that schema 1 kept at the top
/// level of the state.
const LEGACY_COUNTER_KEYS: [&str; 5] = ["search", "trial", "letters", "memory", "awakening"];

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value backend for snapshots.
pub trait SnapshotStorage: Send + Sync + fmt::Debug {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn write(&self, key: &str, data: &str) -> Result<(), PersistError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, data: &str) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, data: impl Into<String>) {
        self.lock().insert(key.into(), data.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, data: &str) -> Result<(), PersistError> {
        self.insert(key, data);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema the snapshot was written with.
    pub schema: u32,

    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,

    pub state: SessionState,

    pub sampler: SamplerSnapshot,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            schema: SCHEMA_VERSION,
            saved_at: None,
            state: SessionState::default(),
            sampler: SamplerSnapshot::default(),
        }
    }
}

impl Snapshot {
    pub fn new(state: SessionState, sampler: SamplerSnapshot) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            saved_at: Some(Utc::now()),
            state,
            sampler,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode stored text. Unparseable text yields the default snapshot.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                tracing::warn!(error = %e, "stored snapshot is not JSON, starting fresh");
                Self::default()
            }
        }
    }

    /// Migrate, backfill and salvage a parsed snapshot.
    pub fn from_value(value: Value) -> Self {
        let migrated = migrate(value);
        let mut merged = default_value();
        deep_merge(&mut merged, migrated);

        if let Ok(snapshot) = serde_json::from_value::<Snapshot>(merged.clone()) {
            return snapshot;
        }

        let mut sections = match merged {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            schema: SCHEMA_VERSION,
            saved_at: sections
                .remove("saved_at")
                .and_then(|v| serde_json::from_value(v).ok()),
            state: salvage("state", sections.remove("state")),
            sampler: salvage("sampler", sections.remove("sampler")),
        }
    }

    /// Write the snapshot to a JSON file.
    pub async fn export_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        fs::write(path, self.to_json()?).await?;
        Ok(())
    }

    /// Read a snapshot from a JSON file, migrating it as on load.
    pub async fn import_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let value: Value = serde_json::from_str(&content)?;
        Ok(Self::from_value(value))
    }
}

fn default_value() -> Value {
    serde_json::to_value(Snapshot::default()).unwrap_or(Value::Null)
}

/// Bring a stored snapshot up to [`SCHEMA_VERSION`].
///
/// Schema 1 stored the session state itself, with no wrapper, no sampler
/// section and the path counters at the top level. A snapshot without a
/// `schema` field is schema 2 if it has a `state` object and schema 1
/// otherwise. Non-object input migrates to an empty object.
pub fn migrate(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        tracing::warn!("stored snapshot is not an object, starting fresh");
        return Value::Object(Map::new());
    };

    let schema = map
        .get("schema")
        .and_then(Value::as_u64)
        .unwrap_or(if map.get("state").is_some_and(Value::is_object) { 2 } else { 1 });

    if schema < 2 {
        tracing::info!(from = schema, to = SCHEMA_VERSION, "migrating stored snapshot");
        map.remove("schema");
        let mut counters = Map::new();
        for key in LEGACY_COUNTER_KEYS {
            if let Some(section) = map.remove(key) {
                counters.insert(key.to_string(), section);
            }
        }
        if !counters.is_empty() {
            map.insert("counters".to_string(), Value::Object(counters));
        }
        let mut wrapped = Map::new();
        wrapped.insert("state".to_string(), Value::Object(map));
        map = wrapped;
    }

    map.insert("schema".to_string(), Value::from(SCHEMA_VERSION));
    Value::Object(map)
}

/// Recursively merge `source` into `target`.
///
/// Objects merge key by key; anything else in `source` replaces the target
/// value. Nulls in `source` are skipped so defaults survive.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        if !value.is_null() {
                            target.insert(key, value);
                        }
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Decode a section field by field, dropping fields that fail to decode.
fn salvage<T>(section: &str, value: Option<Value>) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    let Some(Value::Object(fields)) = value else {
        tracing::warn!(section, "snapshot section missing, using defaults");
        return T::default();
    };

    let mut good = match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, field) in fields {
        let mut candidate = good.clone();
        candidate.insert(key.clone(), field);
        if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
            good = candidate;
        } else {
            tracing::warn!(section, field = %key, "discarding corrupt snapshot field");
        }
    }

    serde_json::from_value(Value::Object(good)).unwrap_or_default()
}

/// Read and decode the snapshot under `key`.
///
/// Read failures are logged and treated as "no snapshot".
pub fn load_snapshot(storage: &dyn SnapshotStorage, key: &str) -> Option<Snapshot> {
    match storage.read(key) {
        Ok(Some(raw)) => Some(Snapshot::decode(&raw)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, key, "failed to read stored session");
            None
        }
    }
}

/// Encode and write `snapshot` under `key`.
pub fn save_snapshot(
    storage: &dyn SnapshotStorage,
    key: &str,
    snapshot: &Snapshot,
) -> Result<(), PersistError> {
    storage.write(key, &snapshot.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::Act;
    use crate::paths::{PathId, Register};
    use serde_json::json;

    #[test]
    fn test_round_trip_through_storage() {
        let storage = MemoryStorage::new();
        let mut state = SessionState::default();
        state.path_id = Some(PathId::Memory);
        state.act.current = Act::Crisis;
        let snapshot = Snapshot::new(state, SamplerSnapshot::default());

        save_snapshot(&storage, STORAGE_KEY, &snapshot).unwrap();
        let loaded = load_snapshot(&storage, STORAGE_KEY).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_missing_key_loads_nothing() {
        assert!(load_snapshot(&MemoryStorage::new(), STORAGE_KEY).is_none());
    }

    #[test]
    fn test_garbage_decodes_to_default() {
        assert_eq!(Snapshot::decode("{not json"), Snapshot::default());
        assert_eq!(Snapshot::decode("[1, 2]"), Snapshot::default());
    }

    #[test]
    fn test_missing_fields_are_backfilled() {
        let snapshot = Snapshot::from_value(json!({
            "schema": 2,
            "state": { "register": "teen", "act": { "current": 2 } }
        }));
        assert_eq!(snapshot.state.register, Register::Teen);
        assert_eq!(snapshot.state.act.current, Act::Descent);
        assert_eq!(snapshot.state.act.guide_emotional_state, "composed");
        assert_eq!(snapshot.state.counters.search.isis_state, "composed");
    }

    #[test]
    fn test_legacy_flat_state_is_migrated() {
        let snapshot = Snapshot::from_value(json!({
            "phase": "playing",
            "path_id": "trial",
            "trial": { "horus_evidence": ["Falcon"], "thoth_bias": "revealed" }
        }));
        assert_eq!(snapshot.schema, SCHEMA_VERSION);
        assert_eq!(snapshot.state.path_id, Some(PathId::Trial));
        assert_eq!(snapshot.state.counters.trial.horus_evidence, vec!["Falcon"]);
        assert!(snapshot.sampler.targets.is_empty());
    }

    #[test]
    fn test_corrupt_field_is_salvaged() {
        let snapshot = Snapshot::from_value(json!({
            "schema": 2,
            "state": {
                "register": "kid",
                "path_id": "labyrinth",
                "act": { "current": 9 },
                "path_progress": 40
            }
        }));
        assert_eq!(snapshot.state.register, Register::Kid);
        assert_eq!(snapshot.state.path_id, None);
        assert_eq!(snapshot.state.act.current, Act::Call);
        assert_eq!(snapshot.state.path_progress, 40);
    }

    #[test]
    fn test_nulls_keep_defaults() {
        let mut target = json!({ "a": 1, "b": { "c": 2 } });
        deep_merge(&mut target, json!({ "a": null, "b": { "c": 3, "d": null }, "e": [1] }));
        assert_eq!(target, json!({ "a": 1, "b": { "c": 3 }, "e": [1] }));
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("saves"));
        assert_eq!(storage.read("k").unwrap(), None);
        storage.write("k", "{}").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("{}"));
        assert!(storage.path_for("k").exists());
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.read("k").unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let mut state = SessionState::default();
        state.register = Register::Family;
        let snapshot = Snapshot::new(state, SamplerSnapshot::default());

        snapshot.export_json(&path).await.unwrap();
        let loaded = Snapshot::import_json(&path).await.unwrap();
        assert_eq!(loaded, snapshot);
    }
}
