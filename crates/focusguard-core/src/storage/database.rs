//! SQLite-backed persistence.
//!
//! Provides:
//! - The `kv` table backing the typed [`Store`](super::Store)
//! - Recorded page visits for analytics

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::data_dir;
use super::store::{KeyValue, StoreKey};
use crate::error::StoreError;
use crate::visits::{Category, VisitRecord};

/// SQLite database for the key-value store and visit log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> crate::error::Result<Self> {
        let path = data_dir()?.join("focusguard.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS visits (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                url          TEXT NOT NULL,
                title        TEXT NOT NULL DEFAULT '',
                category     TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                visited_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_visits_visited_at ON visits(visited_at);
            CREATE INDEX IF NOT EXISTS idx_visits_category ON visits(category);",
        )?;
        Ok(())
    }

    /// Get a value from the kv table.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv table.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Append a visit to the log.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_visit(&self, visit: &VisitRecord) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO visits (url, title, category, duration_secs, visited_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                visit.url,
                visit.title,
                visit.category.as_str(),
                visit.duration_secs,
                visit.visited_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Visits recorded at or after `since` (all visits when `None`), oldest first.
    pub fn visits(&self, since: Option<DateTime<Utc>>) -> Result<Vec<VisitRecord>, StoreError> {
        // RFC 3339 strings in UTC sort chronologically.
        let since = since
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let mut stmt = self.conn.prepare(
            "SELECT url, title, category, duration_secs, visited_at
             FROM visits
             WHERE visited_at >= ?1
             ORDER BY visited_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut visits = Vec::new();
        for row in rows {
            let (url, title, category, duration_secs, visited_at) = row?;
            let visited_at = match DateTime::parse_from_rfc3339(&visited_at) {
                Ok(t) => t.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(%visited_at, error = %e, "skipping visit with bad timestamp");
                    continue;
                }
            };
            visits.push(VisitRecord {
                url,
                title,
                category: category.parse().unwrap_or(Category::Unknown),
                duration_secs,
                visited_at,
            });
        }
        Ok(visits)
    }
}

impl KeyValue for Database {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.kv_get(key.as_str())?)
    }

    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        Ok(self.kv_set(key.as_str(), value)?)
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        Ok(self.kv_remove(key.as_str())?)
    }
}

/// One connection used both as the store backend and for the visit log.
pub type SharedDatabase = Arc<Mutex<Database>>;

impl KeyValue for SharedDatabase {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.get(key)
    }

    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.set(key, value)
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.remove(key)
    }
}
