//! SQLite-based session history and key-value cache.
//!
//! Provides persistent storage for:
//! - Finished timer sessions (completed or stopped early)
//! - History statistics
//! - Key-value store for small client state such as recent searches

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::format;
use crate::protocol::ProtocolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Completed,
    Stopped,
}

impl SessionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::Stopped => "stopped",
        }
    }
}

impl FromStr for SessionOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SessionOutcome::Completed),
            "stopped" => Ok(SessionOutcome::Stopped),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

/// A finished session to be written to history.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_id: Uuid,
    pub kind: ProtocolKind,
    pub label: String,
    pub total_secs: u64,
    pub elapsed_secs: u64,
    pub outcome: SessionOutcome,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub session_id: Uuid,
    pub kind: ProtocolKind,
    pub label: String,
    pub total_secs: u64,
    pub elapsed_secs: u64,
    pub outcome: SessionOutcome,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub stopped_sessions: u64,
    pub total_elapsed_secs: u64,
    pub longest_completed_secs: u64,
    /// Completed share of all sessions, 0..=100.
    pub completion_pct: u8,
}

/// SQLite database for session history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/fitpace.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("fitpace.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
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

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id   TEXT NOT NULL UNIQUE,
                kind         TEXT NOT NULL,
                label        TEXT NOT NULL DEFAULT '',
                total_secs   INTEGER NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                outcome      TEXT NOT NULL,
                started_at   TEXT NOT NULL,
                ended_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);",
        )?;
        Ok(())
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including a duplicate session id).
    pub fn record_session(&self, session: &NewSession) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions
                (session_id, kind, label, total_secs, elapsed_secs, outcome, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.session_id.to_string(),
                session.kind.to_string(),
                session.label,
                session.total_secs,
                session.elapsed_secs,
                session.outcome.as_str(),
                session.started_at.to_rfc3339(),
                session.ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, kind, label, total_secs, elapsed_secs, outcome, started_at, ended_at
             FROM sessions
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], session_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<SessionStats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, COUNT(*), COALESCE(SUM(elapsed_secs), 0), COALESCE(MAX(elapsed_secs), 0)
             FROM sessions
             GROUP BY outcome",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = SessionStats::default();
        for row in rows {
            let (outcome, count, elapsed, longest) = row?;
            stats.total_sessions += count;
            stats.total_elapsed_secs += elapsed;
            match outcome.as_str() {
                "completed" => {
                    stats.completed_sessions += count;
                    stats.longest_completed_secs = longest;
                }
                "stopped" => stats.stopped_sessions += count,
                _ => {}
            }
        }
        stats.completion_pct = format::percent(stats.completed_sessions, stats.total_sessions);
        Ok(stats)
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

    /// Set a value in the kv store. Last write wins.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn parse_time(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e.to_string()))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let session_id: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let outcome: String = row.get(6)?;
    Ok(SessionRecord {
        id: row.get(0)?,
        session_id: Uuid::parse_str(&session_id).map_err(|e| conversion_error(1, e.to_string()))?,
        kind: kind.parse().map_err(|e: String| conversion_error(2, e))?,
        label: row.get(3)?,
        total_secs: row.get(4)?,
        elapsed_secs: row.get(5)?,
        outcome: outcome.parse().map_err(|e: String| conversion_error(6, e))?,
        started_at: parse_time(row, 7)?,
        ended_at: parse_time(row, 8)?,
    })
}
