//! Storage boundary for query text and settings
//!
//! Values are stored as JSON strings under fixed keys. Writes are
//! fire-and-forget from the store's point of view: failures are logged and
//! never change in-memory state.

use crate::core::settings::{SettingsPatch, VisualizerSettings};
use std::collections::HashMap;
use std::sync::Mutex;

pub const QUERY_STORAGE_KEY: &str = "sql-visualizer-query";
pub const SETTINGS_STORAGE_KEY: &str = "sql-visualizer-settings";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage is not available")]
    Unavailable,

    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },

    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    #[error("Stored value for '{key}' is corrupted: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value storage used to keep query text and settings across sessions
pub trait Persistence: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Storage that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl Persistence for NoPersistence {
    fn load(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.into(), value.into());
        }
        self
    }

    /// Raw stored value, mainly for inspection in tests
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let values = self.values.lock().map_err(|_| PersistenceError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.values.lock().map_err(|_| PersistenceError::Unavailable)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn load_json<T: serde::de::DeserializeOwned>(
    storage: &dyn Persistence,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match storage.load(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Load the stored query text, treating unreadable values as absent
pub fn load_query(storage: &dyn Persistence) -> Option<String> {
    match load_json::<String>(storage, QUERY_STORAGE_KEY) {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!("Ignoring stored query: {}", e);
            None
        }
    }
}

/// Load stored settings merged over `defaults`, treating unreadable values as absent
pub fn load_settings(storage: &dyn Persistence, defaults: VisualizerSettings) -> VisualizerSettings {
    match load_json::<SettingsPatch>(storage, SETTINGS_STORAGE_KEY) {
        Ok(Some(patch)) => defaults.merged(&patch),
        Ok(None) => defaults,
        Err(e) => {
            tracing::warn!("Ignoring stored settings: {}", e);
            defaults
        }
    }
}

pub fn save_query(storage: &dyn Persistence, query: &str) {
    save_json(storage, QUERY_STORAGE_KEY, query);
}

pub fn save_settings(storage: &dyn Persistence, settings: &VisualizerSettings) {
    save_json(storage, SETTINGS_STORAGE_KEY, settings);
}

fn save_json<T: serde::Serialize + ?Sized>(storage: &dyn Persistence, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(|e| PersistenceError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })
        .and_then(|json| storage.save(key, &json));
    if let Err(e) = result {
        tracing::warn!("Failed to persist '{}': {}", key, e);
    }
}
