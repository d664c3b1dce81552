//! Key-value settings stores.
//!
//! The extension keeps two areas: `sync` for user settings and `local` for
//! per-instance bookkeeping (`lastCallTime`). Both are a [`SettingsStore`].
//!
//! | Store | Backing |
//! |-------|---------|
//! | [`MemoryStore`] | In-process map |
//! | [`FileStore`] | JSON document on disk |

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Key-value entries read from or written to a store.
pub type Entries = Map<String, Value>;

// ============================================================================
// SettingsStore
// ============================================================================

/// Asynchronous key-value store.
///
/// `get` returns only the keys that are present; absent keys are simply
/// missing from the result. `set` merges entries into the store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the given keys.
    async fn get(&self, keys: &[&str]) -> Result<Entries>;

    /// Writes the given entries, replacing existing values.
    async fn set(&self, entries: Entries) -> Result<()>;
}

/// Reads `keys` and deserializes them into `T`.
///
/// # Errors
///
/// Propagates store failures; returns [`Error::Json`] if the stored values
/// do not fit `T`.
pub async fn load<T: DeserializeOwned>(store: &dyn SettingsStore, keys: &[&str]) -> Result<T> {
    let entries = store.get(keys).await?;
    Ok(serde_json::from_value(Value::Object(entries))?)
}

/// Serializes `value` as an object and writes every field.
///
/// # Errors
///
/// Returns [`Error::Store`] if `value` does not serialize to an object.
pub async fn save<T: Serialize>(store: &dyn SettingsStore, value: &T) -> Result<()> {
    match serde_json::to_value(value)? {
        Value::Object(entries) => store.set(entries).await,
        other => Err(Error::store(format!(
            "settings must serialize to an object, got {other}"
        ))),
    }
}

/// Writes a single key.
pub async fn set_one(store: &dyn SettingsStore, key: &str, value: impl Serialize) -> Result<()> {
    let mut entries = Entries::new();
    entries.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(entries).await
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<FxHashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: Entries) -> Self {
        Self {
            values: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Returns the number of stored keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries> {
        let values = self.values.read();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: Entries) -> Result<()> {
        trace!(count = entries.len(), "MemoryStore set");
        self.values.write().extend(entries);
        Ok(())
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// Store persisted as one JSON object on disk.
///
/// Writes go through a temporary file and a rename. Concurrent writers in
/// this process are serialized; other processes are not coordinated.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: AsyncMutex<()>,
}

impl FileStore {
    /// Opens (or lazily creates) the store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    /// Path of the backing document.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Entries> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(Error::store(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries> {
        let mut document = self.read_document().await?;
        Ok(keys
            .iter()
            .filter_map(|key| document.remove(*key).map(|v| ((*key).to_string(), v)))
            .collect())
    }

    async fn set(&self, entries: Entries) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        document.extend(entries);

        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::settings::{Settings, keys};

    #[tokio::test]
    async fn test_memory_get_returns_present_keys_only() {
        let store = MemoryStore::new();
        set_one(&store, keys::MODEL, "m").await.expect("set");

        let entries = store
            .get(&[keys::MODEL, keys::API_KEY])
            .await
            .expect("get");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get(keys::MODEL), Some(&json!("m")));
    }

    #[tokio::test]
    async fn test_save_then_load_settings() {
        let store = MemoryStore::new();
        let settings = Settings {
            api_key: Some("sk-or-1".to_string()),
            ..Settings::default()
        };
        save(&store, &settings).await.expect("save");

        let loaded: Settings = load(&store, keys::ALL).await.expect("load");
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_save_rejects_non_object() {
        let store = MemoryStore::new();
        let result = save(&store, &42).await;
        assert!(matches!(result, Err(Error::Store { .. })));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sync.json");

        let store = FileStore::new(&path);
        assert!(store.get(&[keys::MODEL]).await.expect("get").is_empty());

        set_one(&store, keys::MODEL, "a").await.expect("set");
        set_one(&store, keys::MESSAGE_TYPE, "friendly")
            .await
            .expect("set");

        let reopened = FileStore::new(&path);
        let entries = reopened
            .get(&[keys::MODEL, keys::MESSAGE_TYPE])
            .await
            .expect("get");
        assert_eq!(entries.get(keys::MODEL), Some(&json!("a")));
        assert_eq!(entries.get(keys::MESSAGE_TYPE), Some(&json!("friendly")));
    }

    #[tokio::test]
    async fn test_file_store_rejects_non_object_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sync.json");
        std::fs::write(&path, "[1, 2]").expect("write");

        let result = FileStore::new(&path).get(&[keys::MODEL]).await;
        assert!(matches!(result, Err(Error::Store { .. })));
    }
}
