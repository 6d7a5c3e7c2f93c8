//! Local key/value cache.
//!
//! The cache is a write-through mirror of engine state, not a source of truth.
//! Values are JSON blobs stored under namespaced keys (see [`CacheKey`]).
//! Any store offering `get`/`set`/`remove` can back the engine; the SQLite
//! implementation lives in [`crate::storage::CacheDb`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::date_key::DayKey;
use crate::error::CacheError;

/// Durable key -> blob store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Namespaced cache keys, one namespace per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Habits,
    Routines,
    Tasks,
    Transactions,
    Settings,
    /// Food entries for one day.
    Food(DayKey),
    /// Scalar health fields for one day.
    Day(DayKey),
}

impl CacheKey {
    pub fn as_key(&self) -> String {
        match self {
            CacheKey::Habits => "habits".to_string(),
            CacheKey::Routines => "routines".to_string(),
            CacheKey::Tasks => "tasks".to_string(),
            CacheKey::Transactions => "transactions".to_string(),
            CacheKey::Settings => "settings".to_string(),
            CacheKey::Food(day) => format!("food:{day}"),
            CacheKey::Day(day) => format!("day:{day}"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Read and decode a JSON value. A blob that fails to decode is reported as
/// [`CacheError::Corrupt`].
pub fn load_json<T, C>(cache: &C, key: &CacheKey) -> Result<Option<T>, CacheError>
where
    T: DeserializeOwned,
    C: CacheStore + ?Sized,
{
    let key = key.as_key();
    match cache.get(&key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                key,
                message: e.to_string(),
            }),
    }
}

/// Encode and write a JSON value.
pub fn store_json<T, C>(cache: &C, key: &CacheKey, value: &T) -> Result<(), CacheError>
where
    T: Serialize + ?Sized,
    C: CacheStore + ?Sized,
{
    let key = key.as_key();
    let raw = serde_json::to_string(value).map_err(|e| CacheError::Corrupt {
        key: key.clone(),
        message: e.to_string(),
    })?;
    cache.set(&key, &raw)
}

/// Like [`load_json`] but logs and falls back to the default on any failure.
/// Used at startup where a damaged cache must not block the session.
pub fn load_json_or_default<T, C>(cache: &C, key: &CacheKey) -> T
where
    T: DeserializeOwned + Default,
    C: CacheStore + ?Sized,
{
    match load_json(cache, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "ignoring unreadable cache entry");
            T::default()
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Locked)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Locked)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Locked)?;
        entries.remove(key);
        Ok(())
    }
}
