// SPDX-License-Identifier: MIT
//! SQLite-backed persistence.
//!
//! One database file per deployment. The schema is bootstrapped with
//! `CREATE TABLE IF NOT EXISTS` on open, so a fresh data directory is
//! immediately usable and no migration files ship with the crate.
//!
//! The per-user progress snapshot is stored whole as a JSON document column
//! (document-store semantics: read, mutate in memory, write back in one
//! UPDATE — last write wins). Challenge definitions and instances are
//! ordinary rows.

use anyhow::{Context as _, Result};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

/// Upper bound for individual SQLite queries so a hung query cannot wedge a
/// request forever.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
pub(crate) async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Open (or create) the database with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding
    /// it are logged at WARN level. Set to 0 to disable.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("lingua.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = sqlx::ConnectOptions::log_slow_statements(
                opts,
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::bootstrap(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed). Feature
    /// stores (`ProgressStore`, `ChallengeStore`) share the same connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn bootstrap(pool: &SqlitePool) -> Result<()> {
        let ddl = [
            // The per-user snapshot document.
            "CREATE TABLE IF NOT EXISTS user_progress (
                user_id    TEXT PRIMARY KEY,
                doc        TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            // Idempotency ledger for client-supplied play-event ids.
            "CREATE TABLE IF NOT EXISTS play_events (
                user_id     TEXT NOT NULL,
                event_id    TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (user_id, event_id)
            )",
            // The day's scheduled challenge(s), written by the content feed.
            "CREATE TABLE IF NOT EXISTS challenge_defs (
                challenge_id   TEXT NOT NULL,
                challenge_date TEXT NOT NULL,
                title          TEXT NOT NULL,
                description    TEXT NOT NULL DEFAULT '',
                challenge_type TEXT NOT NULL DEFAULT '',
                target_value   INTEGER NOT NULL,
                xp_bonus       INTEGER NOT NULL DEFAULT 0,
                streak_bonus   INTEGER NOT NULL DEFAULT 0,
                is_active      INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (challenge_id, challenge_date)
            )",
            // Per-user, per-challenge, per-day progress rows.
            "CREATE TABLE IF NOT EXISTS challenge_progress (
                user_id           TEXT NOT NULL,
                challenge_id      TEXT NOT NULL,
                challenge_date    TEXT NOT NULL,
                target_value      INTEGER NOT NULL,
                current_progress  INTEGER NOT NULL DEFAULT 0,
                is_completed      INTEGER NOT NULL DEFAULT 0,
                completed_at      TEXT,
                rewards_claimed   INTEGER NOT NULL DEFAULT 0,
                rewards_claimed_at TEXT,
                metadata          TEXT,
                created_at        TEXT NOT NULL,
                updated_at        TEXT NOT NULL,
                PRIMARY KEY (user_id, challenge_id, challenge_date)
            )",
        ];
        for stmt in ddl {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("bootstrap schema")?;
        }
        Ok(())
    }

    /// Cheap probe used by the host's health endpoint.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
