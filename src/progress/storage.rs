// SPDX-License-Identifier: MIT
//! Snapshot persistence — the document read/write pair plus the play-event
//! idempotency ledger.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::model::ProgressSnapshot;
use crate::storage::with_timeout;

pub struct ProgressStore {
    pool: SqlitePool,
}

impl ProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the user's snapshot, creating a zeroed one on first touch.
    /// A missing snapshot is never an error.
    pub async fn load_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressSnapshot> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT doc FROM user_progress WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((doc,)) => serde_json::from_str(&doc)
                .with_context(|| format!("corrupt progress document for {user_id}")),
            None => {
                let snapshot = ProgressSnapshot::new(user_id, now);
                self.save(&snapshot).await?;
                Ok(snapshot)
            }
        }
    }

    /// Persist the whole document. Last write wins — callers serialize
    /// per-user writes through the engine's lock.
    pub async fn save(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        let doc = serde_json::to_string(snapshot).context("serialize progress document")?;
        with_timeout(async {
            sqlx::query(
                "INSERT INTO user_progress (user_id, doc, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(user_id) DO UPDATE SET
                   doc = excluded.doc,
                   updated_at = excluded.updated_at",
            )
            .bind(&snapshot.user_id)
            .bind(&doc)
            .bind(snapshot.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Record a client-supplied event id. Returns `false` when the id was
    /// already seen for this user — the caller then skips the event.
    pub async fn record_event_id(
        &self,
        user_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rows_affected = sqlx::query(
            "INSERT OR IGNORE INTO play_events (user_id, event_id, recorded_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("record play event id")?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
