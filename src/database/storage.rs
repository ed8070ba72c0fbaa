//! JSON key/value storage on top of the `storage` table.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::connection::Database;
use crate::types::errors::StorageError;

/// Key of the global settings record.
pub const SETTINGS_KEY: &str = "settings";
/// Key of the remembered per-URL settings.
pub const URL_MEMORY_KEY: &str = "urlMemory";
/// Key of the state snapshot written right before a restart.
pub const UPGRADE_KEY: &str = "upgrade";

/// Key/value store whose values are JSON documents.
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns the raw JSON stored under `key`, if any.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let raw: Option<String> = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| StorageError::SerializationError(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Returns the value under `key` deserialized as `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_value(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::SerializationError(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)
            .map_err(|e| StorageError::SerializationError(format!("{}: {}", key, e)))?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        self.db.connection().execute(
            "INSERT INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text, now],
        )?;
        Ok(())
    }

    /// Deletes `key`. Returns whether a value was present.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let affected = self
            .db
            .connection()
            .execute("DELETE FROM storage WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
