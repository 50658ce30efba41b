// SQLite persistence: NBA stats cache and dashboard session state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::stats::{normalize_name, PlayerStats, StatLine};

/// SQLite-backed cache of per-season player stats plus key-value session
/// state (last league, category weights).
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
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS player_stats (
                season     TEXT NOT NULL,
                player_key TEXT NOT NULL,
                player_id  INTEGER,
                name       TEXT NOT NULL,
                team       TEXT NOT NULL,
                line       TEXT NOT NULL,
                PRIMARY KEY (season, player_key)
            );

            CREATE TABLE IF NOT EXISTS stats_fetches (
                season     TEXT PRIMARY KEY,
                source     TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection lock.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // -----------------------------------------------------------------------
    // Stats cache
    // -----------------------------------------------------------------------

    /// Replace the cached stats for `season` in a single transaction and
    /// record when and where they came from.
    pub fn store_player_stats(
        &self,
        season: &str,
        players: &[PlayerStats],
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin stats transaction")?;

        tx.execute("DELETE FROM player_stats WHERE season = ?1", params![season])
            .context("failed to clear cached stats")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO player_stats
                        (season, player_key, player_id, name, team, line)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .context("failed to prepare stats insert")?;
            for player in players {
                let line_json =
                    serde_json::to_string(&player.line).context("failed to serialize stat line")?;
                stmt.execute(params![
                    season,
                    normalize_name(&player.name),
                    player.player_id,
                    player.name,
                    player.team,
                    line_json,
                ])
                .with_context(|| format!("failed to cache stats for {}", player.name))?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO stats_fetches (season, source, fetched_at) VALUES (?1, ?2, ?3)",
            params![season, source, fetched_at.to_rfc3339()],
        )
        .context("failed to record stats fetch")?;

        tx.commit().context("failed to commit stats cache")?;
        Ok(())
    }

    /// Load every cached stat line for `season`, ordered by name.
    pub fn load_player_stats(&self, season: &str) -> Result<Vec<PlayerStats>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, name, team, line FROM player_stats
                 WHERE season = ?1 ORDER BY name",
            )
            .context("failed to prepare load_player_stats query")?;

        let rows = stmt
            .query_map(params![season], |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query cached stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map cached stat rows")?;

        rows.into_iter()
            .map(|(player_id, name, team, line_json)| {
                let line: StatLine = serde_json::from_str(&line_json)
                    .with_context(|| format!("corrupt cached stat line for {name}"))?;
                Ok(PlayerStats {
                    player_id,
                    name,
                    team,
                    line,
                })
            })
            .collect()
    }

    /// When stats for `season` were last stored, if ever.
    pub fn stats_fetched_at(&self, season: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT fetched_at FROM stats_fetches WHERE season = ?1",
                params![season],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query stats fetch time")?;

        match raw {
            Some(ts) => {
                let parsed = DateTime::parse_from_rfc3339(&ts)
                    .with_context(|| format!("invalid fetch timestamp {ts}"))?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }

    /// True when cached stats for `season` are younger than `ttl`.
    pub fn stats_are_fresh(&self, season: &str, ttl: Duration, now: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .stats_fetched_at(season)?
            .is_some_and(|fetched| now - fetched < ttl))
    }

    // -----------------------------------------------------------------------
    // Session state (key-value)
    // -----------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE so
    /// repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query session state")?;

        match raw {
            Some(json_str) => {
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
