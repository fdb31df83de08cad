//! SQLite-backed storage.
//!
//! One database file holds everything the application persists:
//! - The meditation and sequence catalog
//! - Completed session history and the statistics over it
//! - A key-value table for small application state (the persisted session
//!   length, the parked player session)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;

/// A completed meditation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub track_id: Option<String>,
    pub track_name: String,
    pub length_min: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_min: u64,
    pub today_sessions: u64,
    pub today_min: u64,
}

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/tempora/tempora.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()?.join("tempora.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meditations (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                text          TEXT NOT NULL,
                audio_url     TEXT NOT NULL,
                duration_secs INTEGER NOT NULL DEFAULT 0,
                is_public     INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sequences (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image_url   TEXT,
                is_public   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sequence_meditations (
                sequence_id   TEXT NOT NULL,
                meditation_id TEXT NOT NULL,
                position      INTEGER NOT NULL,
                PRIMARY KEY (sequence_id, meditation_id)
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                track_id     TEXT,
                track_name   TEXT NOT NULL DEFAULT '',
                length_min   INTEGER NOT NULL,
                started_at   TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_meditations_public ON meditations(is_public);
            CREATE INDEX IF NOT EXISTS idx_sequences_public ON sequences(is_public);",
        )?;
        Ok(())
    }

    /// Record a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        track_id: Option<&str>,
        track_name: &str,
        length_min: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (track_id, track_name, length_min, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                track_id,
                track_name,
                length_min,
                started_at.to_rfc3339(),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recently completed sessions, newest first.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, track_id, track_name, length_min, started_at, completed_at
             FROM sessions ORDER BY completed_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                track_id: row.get(1)?,
                track_name: row.get(2)?,
                length_min: row.get(3)?,
                started_at: parse_rfc3339(row.get::<_, String>(4)?, 4)?,
                completed_at: parse_rfc3339(row.get::<_, String>(5)?, 5)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Aggregate session statistics, all-time and for today.
    pub fn stats(&self) -> Result<Stats, DatabaseError> {
        let (total_sessions, total_min) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(length_min), 0) FROM sessions",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_min) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(length_min), 0) FROM sessions
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        Ok(Stats {
            total_sessions,
            total_min,
            today_sessions,
            today_min,
        })
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
}

/// Parse a stored RFC 3339 timestamp back into `DateTime<Utc>`.
pub(crate) fn parse_rfc3339(raw: String, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_aggregate() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(
            Some("m-1"),
            "Morning calm",
            20,
            now - chrono::Duration::minutes(20),
            now,
        )
        .unwrap();
        db.record_session(None, "", 5, now - chrono::Duration::minutes(5), now)
            .unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_min, 25);
        assert_eq!(stats.today_sessions, 2);
        assert_eq!(stats.today_min, 25);

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().any(|r| r.track_name == "Morning calm"));
        assert!(recent.iter().any(|r| r.track_id.is_none()));
    }

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("missing").unwrap().is_none());
        db.kv_set("session_length_ms", "1200000").unwrap();
        assert_eq!(
            db.kv_get("session_length_ms").unwrap().unwrap(),
            "1200000"
        );
        db.kv_set("session_length_ms", "300000").unwrap();
        assert_eq!(db.kv_get("session_length_ms").unwrap().unwrap(), "300000");
    }
}
