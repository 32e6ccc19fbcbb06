// SPDX-License-Identifier: MIT
//! Challenge SQLite operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::model::{ChallengeDef, ChallengeInstance};

pub struct ChallengeStore {
    pool: SqlitePool,
}

impl ChallengeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Definitions ─────────────────────────────────────────────────────

    /// Upsert the day's scheduled challenge (content-feed write path).
    pub async fn upsert_def(&self, def: &ChallengeDef) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO challenge_defs
             (challenge_id, challenge_date, title, description, challenge_type,
              target_value, xp_bonus, streak_bonus, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&def.challenge_id)
        .bind(&def.challenge_date)
        .bind(&def.title)
        .bind(&def.description)
        .bind(&def.challenge_type)
        .bind(def.target_value)
        .bind(def.xp_bonus)
        .bind(def.streak_bonus)
        .bind(def.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_def(&self, challenge_id: &str, date: &str) -> Result<Option<ChallengeDef>> {
        Ok(sqlx::query_as(
            "SELECT * FROM challenge_defs
             WHERE challenge_id = ? AND challenge_date = ? AND is_active = 1",
        )
        .bind(challenge_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// The challenge scheduled for `date`, if any.
    pub async fn def_for_day(&self, date: &str) -> Result<Option<ChallengeDef>> {
        Ok(sqlx::query_as(
            "SELECT * FROM challenge_defs
             WHERE challenge_date = ? AND is_active = 1
             ORDER BY challenge_id ASC LIMIT 1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?)
    }

    // ─── Instances ───────────────────────────────────────────────────────

    pub async fn get_instance(
        &self,
        user_id: &str,
        challenge_id: &str,
        date: &str,
    ) -> Result<Option<ChallengeInstance>> {
        Ok(sqlx::query_as(
            "SELECT * FROM challenge_progress
             WHERE user_id = ? AND challenge_id = ? AND challenge_date = ?",
        )
        .bind(user_id)
        .bind(challenge_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Create a zeroed instance row from the day's definition.
    pub async fn create_instance(
        &self,
        user_id: &str,
        def: &ChallengeDef,
        now: DateTime<Utc>,
    ) -> Result<ChallengeInstance> {
        let now_str = now.to_rfc3339();
        let row = ChallengeInstance {
            user_id: user_id.to_string(),
            challenge_id: def.challenge_id.clone(),
            challenge_date: def.challenge_date.clone(),
            target_value: def.target_value,
            current_progress: 0,
            is_completed: false,
            completed_at: None,
            rewards_claimed: false,
            rewards_claimed_at: None,
            metadata: None,
            created_at: now_str.clone(),
            updated_at: now_str,
        };
        sqlx::query(
            "INSERT INTO challenge_progress
             (user_id, challenge_id, challenge_date, target_value, current_progress,
              is_completed, rewards_claimed, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, 0, 0, ?, ?)",
        )
        .bind(&row.user_id)
        .bind(&row.challenge_id)
        .bind(&row.challenge_date)
        .bind(row.target_value)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    /// Write back a mutated instance. The row is addressed by its full
    /// composite key; callers only mutate rows they just loaded.
    pub async fn update_instance(&self, row: &ChallengeInstance) -> Result<()> {
        sqlx::query(
            "UPDATE challenge_progress SET
               current_progress = ?, is_completed = ?, completed_at = ?,
               rewards_claimed = ?, rewards_claimed_at = ?, metadata = ?, updated_at = ?
             WHERE user_id = ? AND challenge_id = ? AND challenge_date = ?",
        )
        .bind(row.current_progress)
        .bind(row.is_completed)
        .bind(row.completed_at.as_deref())
        .bind(row.rewards_claimed)
        .bind(row.rewards_claimed_at.as_deref())
        .bind(row.metadata.as_deref())
        .bind(&row.updated_at)
        .bind(&row.user_id)
        .bind(&row.challenge_id)
        .bind(&row.challenge_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Dates (`YYYY-MM-DD`) on which the user completed a challenge.
    /// Feeds the walk-back challenge-streak computation.
    pub async fn completed_dates(&self, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT challenge_date FROM challenge_progress
             WHERE user_id = ? AND is_completed = 1
             ORDER BY challenge_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}
