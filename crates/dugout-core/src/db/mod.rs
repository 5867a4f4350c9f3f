// SQLite persistence layer: schema, batch upserts, and read-only queries.

mod ingest;
mod query;

pub use ingest::{IngestReport, IngestSkip};

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite-backed store for teams, schedule and team statistics.
///
/// Every public method locks the connection for the duration of one unit of
/// work (schema creation, one batch, one read) and releases it on return.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Create the `teams`, `schedule` and `statistics` tables if they are
    /// missing. Safe to call any number of times.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id     TEXT PRIMARY KEY,
                name   TEXT NOT NULL,
                market TEXT NOT NULL,
                abbr   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schedule (
                game_id        TEXT PRIMARY KEY,
                date           TEXT NOT NULL,
                scheduled_time TEXT NOT NULL,
                home_team_id   TEXT NOT NULL REFERENCES teams(id),
                away_team_id   TEXT NOT NULL REFERENCES teams(id),
                venue_name     TEXT NOT NULL,
                home_team_abbr TEXT NOT NULL,
                away_team_abbr TEXT NOT NULL,
                status         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS statistics (
                team_id          TEXT PRIMARY KEY REFERENCES teams(id),
                season_id        TEXT NOT NULL,
                year             INTEGER NOT NULL,
                season_type      TEXT NOT NULL,
                hitting_overall  TEXT NOT NULL,
                pitching_overall TEXT NOT NULL,
                fielding_overall TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_teams_abbr ON teams(abbr);
            CREATE INDEX IF NOT EXISTS idx_schedule_date ON schedule(date);
            ",
        )
        .context("failed to create database schema")?;
        Ok(())
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}
