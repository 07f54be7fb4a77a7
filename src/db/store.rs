//! Key/value persistence port for state owned by the scheduler's callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::db::repositories::kv_repository::KvRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

pub trait StatePort: Send + Sync {
    fn load(&self, key: &str) -> AppResult<Option<JsonValue>>;

    fn save(&self, key: &str, value: &JsonValue) -> AppResult<()>;

    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> AppResult<bool>;
}

pub fn load_typed<T: DeserializeOwned>(port: &dyn StatePort, key: &str) -> AppResult<Option<T>> {
    port.load(key)?
        .map(serde_json::from_value)
        .transpose()
        .map_err(AppError::from)
}

pub fn save_typed<T: Serialize>(port: &dyn StatePort, key: &str, value: &T) -> AppResult<()> {
    let json = serde_json::to_value(value)?;
    port.save(key, &json)
}

#[derive(Clone)]
pub struct SqliteStatePort {
    pool: DbPool,
}

impl SqliteStatePort {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl StatePort for SqliteStatePort {
    fn load(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let row = self.pool.with_connection(|conn| KvRepository::get(conn, key))?;
        match row {
            Some(row) => Ok(Some(serde_json::from_str(&row.value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &JsonValue) -> AppResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.pool
            .with_connection(|conn| KvRepository::upsert(conn, key, &encoded))?;
        debug!(target: "app::db", key, bytes = encoded.len(), "state saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<bool> {
        self.pool.with_connection(|conn| KvRepository::delete(conn, key))
    }
}

/// Process-local store for tests and runs without a data directory.
#[derive(Clone, Default)]
pub struct MemoryStatePort {
    entries: Arc<Mutex<HashMap<String, JsonValue>>>,
}

impl MemoryStatePort {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, JsonValue>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::other("memory state lock poisoned"))
    }
}

impl StatePort for MemoryStatePort {
    fn load(&self, key: &str) -> AppResult<Option<JsonValue>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &JsonValue) -> AppResult<()> {
        self.entries()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries()?.remove(key).is_some())
    }
}
