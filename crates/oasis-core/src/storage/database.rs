//! SQLite-backed local storage.
//!
//! Provides persistent storage for:
//! - Key-value records (the preferences record, the auth session)
//! - A local history of completed focus sessions

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::preferences::{PreferencesBackend, PreferencesStore};

/// Finalized summary of a focus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub duration_minutes: u32,
    pub completed: bool,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn completed(duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            completed: true,
            completed_at: Utc::now(),
        }
    }
}

/// SQLite database for local state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/oasis/oasis.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()?.join("oasis.db");
        Self::open_at(&path)
    }

    /// Open a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
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

            CREATE TABLE IF NOT EXISTS focus_sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                duration_minutes INTEGER NOT NULL,
                completed        INTEGER NOT NULL,
                completed_at     TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_focus_sessions_completed_at
                ON focus_sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Append a session to the local history.
    pub fn record_session(&self, record: &SessionRecord) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_sessions (duration_minutes, completed, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                record.duration_minutes,
                record.completed,
                timestamp(record.completed_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sessions completed at or after `since`, oldest first.
    pub fn sessions_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT duration_minutes, completed, completed_at
             FROM focus_sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at ASC",
        )?;
        let rows = stmt.query_map(params![timestamp(since)], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (duration_minutes, completed, at) = row?;
            let completed_at = DateTime::parse_from_rfc3339(&at)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{at}': {e}")))?
                .with_timezone(&Utc);
            out.push(SessionRecord {
                duration_minutes,
                completed,
                completed_at,
            });
        }
        Ok(out)
    }

    /// Total minutes of completed sessions since `since`.
    pub fn minutes_since(&self, since: DateTime<Utc>) -> Result<u32, DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0)
             FROM focus_sessions
             WHERE completed = 1 AND completed_at >= ?1",
            params![timestamp(since)],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }
}

/// Fixed-width UTC timestamps so text comparison in SQL orders correctly.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl PreferencesBackend for Database {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.kv_get(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.kv_set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), DatabaseError> {
        self.kv_delete(key)
    }
}

impl PreferencesStore<Database> {
    /// Preferences kept in the default database under [`data_dir`].
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(Database::open()?)?)
    }

    /// Preferences kept in the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::open(Database::open_at(path)?)?)
    }
}
