//! SQLite-based session ledger.
//!
//! Provides persistent storage for:
//! - Finished focus sessions (completed and given up)
//! - The player profile (XP, gold, HP, streak)
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::reward::{gold_for_xp, level_for_xp, FocusStats, COMPLETION_HP_BONUS};
use crate::session::{FocusMode, OutcomeStatus, SessionOutcome, MAX_HP};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub mode: String,
    pub status: String,
    pub elapsed_secs: u64,
    pub xp_earned: u32,
    pub hp_remaining: u8,
    pub penalty_count: u32,
    pub forced: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn mode(&self) -> Option<FocusMode> {
        self.mode.parse().ok()
    }

    pub fn status(&self) -> Option<OutcomeStatus> {
        OutcomeStatus::parse(&self.status)
    }

    /// `None` filters match anything.
    pub fn matches(&self, mode: Option<FocusMode>, status: Option<OutcomeStatus>) -> bool {
        mode.map_or(true, |m| self.mode() == Some(m))
            && status.map_or(true, |s| self.status() == Some(s))
    }
}

/// Account-level progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub xp: u64,
    pub gold: u64,
    pub hp: u8,
    pub streak: u32,
    pub level: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            xp: 0,
            gold: 0,
            hp: MAX_HP,
            streak: 0,
            level: level_for_xp(0),
        }
    }
}

/// SQLite database for the focus ledger.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/focusarena.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusarena.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS focus_sessions (
                id            TEXT PRIMARY KEY,
                mode          TEXT NOT NULL,
                status        TEXT NOT NULL,
                elapsed_secs  INTEGER NOT NULL,
                xp_earned     INTEGER NOT NULL DEFAULT 0,
                hp_remaining  INTEGER NOT NULL,
                penalty_count INTEGER NOT NULL DEFAULT 0,
                forced        INTEGER NOT NULL DEFAULT 0,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profile (
                id         INTEGER PRIMARY KEY CHECK (id = 1),
                xp         INTEGER NOT NULL DEFAULT 0,
                gold       INTEGER NOT NULL DEFAULT 0,
                hp         INTEGER NOT NULL DEFAULT 100,
                streak     INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT ''
            );

            INSERT OR IGNORE INTO profile (id) VALUES (1);

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_focus_sessions_ended_at ON focus_sessions(ended_at);
            CREATE INDEX IF NOT EXISTS idx_focus_sessions_status ON focus_sessions(status);",
        )?;
        Ok(())
    }

    /// Record a finished session and settle the profile.
    ///
    /// Completed sessions credit XP, gold and streak and restore some HP.
    /// Given-up sessions zero the streak and persist the remaining HP.
    /// Recording the same session id twice is a no-op; returns whether the
    /// row was new.
    pub fn record_outcome(&self, outcome: &SessionOutcome) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO focus_sessions
                (id, mode, status, elapsed_secs, xp_earned, hp_remaining, penalty_count, forced, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                outcome.session_id.to_string(),
                outcome.mode.id(),
                outcome.status.as_str(),
                outcome.elapsed_secs,
                outcome.xp_earned,
                outcome.hp_remaining,
                outcome.penalty_count,
                outcome.forced,
                outcome.started_at.to_rfc3339(),
                outcome.ended_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        match outcome.status {
            OutcomeStatus::Completed => {
                let hp = outcome
                    .hp_remaining
                    .saturating_add(COMPLETION_HP_BONUS)
                    .min(MAX_HP);
                tx.execute(
                    "UPDATE profile
                     SET xp = xp + ?1, gold = gold + ?2, streak = streak + 1, hp = ?3, updated_at = ?4
                     WHERE id = 1",
                    params![
                        outcome.xp_earned,
                        gold_for_xp(outcome.xp_earned),
                        hp,
                        now
                    ],
                )?;
            }
            OutcomeStatus::GaveUp => {
                tx.execute(
                    "UPDATE profile SET streak = 0, hp = ?1, updated_at = ?2 WHERE id = 1",
                    params![outcome.hp_remaining, now],
                )?;
            }
        }
        tx.commit()?;
        Ok(true)
    }

    pub fn set_hp(&self, hp: u8) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE profile SET hp = ?1, updated_at = ?2 WHERE id = 1",
            params![hp.min(MAX_HP), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn profile(&self) -> Result<Profile, DatabaseError> {
        let profile = self
            .conn
            .query_row(
                "SELECT xp, gold, hp, streak FROM profile WHERE id = 1",
                [],
                |row| {
                    let xp: u64 = row.get(0)?;
                    Ok(Profile {
                        xp,
                        gold: row.get(1)?,
                        hp: row.get(2)?,
                        streak: row.get(3)?,
                        level: level_for_xp(xp),
                    })
                },
            )
            .optional()?;
        Ok(profile.unwrap_or_default())
    }

    /// Display counters: completed sessions, their total focus time, streak.
    pub fn focus_stats(&self) -> Result<FocusStats, DatabaseError> {
        let (sessions_completed, total_focus_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(elapsed_secs), 0)
             FROM focus_sessions
             WHERE status = 'completed'",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        let current_streak = self.profile()?.streak;
        Ok(FocusStats {
            sessions_completed,
            total_focus_secs,
            current_streak,
        })
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, status, elapsed_secs, xp_earned, hp_remaining, penalty_count, forced, started_at, ended_at
             FROM focus_sessions
             ORDER BY ended_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                mode: row.get(1)?,
                status: row.get(2)?,
                elapsed_secs: row.get(3)?,
                xp_earned: row.get(4)?,
                hp_remaining: row.get(5)?,
                penalty_count: row.get(6)?,
                forced: row.get(7)?,
                started_at: parse_ts(row.get::<_, String>(8)?),
                ended_at: parse_ts(row.get::<_, String>(9)?),
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
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

fn parse_ts(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
