//! History mirror.
//!
//! Implements `HistoryManagerTrait`: recording visits reported by the host,
//! searching them, and deleting visits inside a time window, backed by SQLite
//! via `rusqlite`.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::types::errors::HistoryError;
use crate::types::history::HistoryEntry;

/// Trait defining history operations.
pub trait HistoryManagerTrait {
    fn record_visit(&mut self, url: &str, title: &str, visit_time: i64) -> Result<String, HistoryError>;
    fn search_history(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError>;
    fn delete_range(&mut self, start: i64, end: i64) -> Result<usize, HistoryError>;
    fn delete_entry(&mut self, id: &str) -> Result<(), HistoryError>;
    fn list_history(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
    fn is_recording_enabled(&self) -> bool;
    fn set_recording_enabled(&mut self, enabled: bool);
}

/// History manager backed by the shared database.
pub struct HistoryManager {
    db: Arc<Database>,
    recording_enabled: bool,
}

impl HistoryManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            recording_enabled: true,
        }
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            last_visit_time: row.get(3)?,
            visit_count: row.get(4)?,
        })
    }
}

impl HistoryManagerTrait for HistoryManager {
    /// Records a visit at `visit_time` (ms since epoch). A repeated URL bumps
    /// its visit count and last visit time. Returns the entry ID.
    fn record_visit(&mut self, url: &str, title: &str, visit_time: i64) -> Result<String, HistoryError> {
        if !self.recording_enabled {
            return Err(HistoryError::DatabaseError(
                "Recording is disabled (private mode)".to_string(),
            ));
        }

        let conn = self.db.connection();
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM history WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE history SET visit_count = visit_count + 1, visit_time = ?1, title = ?2 WHERE id = ?3",
                    params![visit_time, title, id],
                )
                .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;
                Ok(id)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO history (id, url, title, visit_time, visit_count) VALUES (?1, ?2, ?3, ?4, 1)",
                    params![id, url, title, visit_time],
                )
                .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;
                Ok(id)
            }
        }
    }

    /// Searches entries whose title or URL contains `query`, most recent first.
    fn search_history(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let pattern = format!("%{}%", query);
        let mut stmt = self
            .db
            .connection()
            .prepare(
                "SELECT id, url, title, visit_time, visit_count \
                 FROM history WHERE title LIKE ?1 OR url LIKE ?1 \
                 ORDER BY visit_time DESC LIMIT ?2",
            )
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], Self::row_to_entry)
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| HistoryError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    /// Deletes entries last visited within `[start, end]`. Returns how many were removed.
    fn delete_range(&mut self, start: i64, end: i64) -> Result<usize, HistoryError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM history WHERE visit_time >= ?1 AND visit_time <= ?2",
                params![start, end],
            )
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))
    }

    fn delete_entry(&mut self, id: &str) -> Result<(), HistoryError> {
        let affected = self
            .db
            .connection()
            .execute("DELETE FROM history WHERE id = ?1", params![id])
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_history(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self
            .db
            .connection()
            .prepare(
                "SELECT id, url, title, visit_time, visit_count \
                 FROM history ORDER BY visit_time DESC",
            )
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| HistoryError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn is_recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    /// Private windows must not leave visits behind.
    fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording_enabled = enabled;
    }
}
