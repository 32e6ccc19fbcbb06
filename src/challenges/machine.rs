// SPDX-License-Identifier: MIT
//! Daily challenge state machine.
//!
//! ```text
//! not_started ──update_progress──► in_progress ──(progress ≥ target)──► completed
//!                                                                          │
//!                                              rewards_claimed ◄──claim────┘
//! ```
//!
//! `update_progress` writes an absolute value (later writes overwrite, they
//! do not add) and is the only forward transition out of
//! not_started/in_progress. Completion is latched: `completed_at` is set
//! exactly once and survives later overwrites. `claim_rewards` is valid
//! only on a completed, unclaimed instance; afterwards the row is immutable.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::model::{ChallengeDef, ChallengeInstance};
use super::storage::ChallengeStore;
use crate::clock::{local_date, Clock};
use crate::error::EngineError;
use crate::progress::engine::ProgressEngine;

pub struct ChallengeEngine {
    store: ChallengeStore,
    progress: Arc<ProgressEngine>,
    clock: Arc<dyn Clock>,
    utc_offset_minutes: i32,
}

impl ChallengeEngine {
    pub fn new(
        pool: SqlitePool,
        progress: Arc<ProgressEngine>,
        clock: Arc<dyn Clock>,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            store: ChallengeStore::new(pool),
            progress,
            clock,
            utc_offset_minutes,
        }
    }

    fn today(&self) -> NaiveDate {
        local_date(self.clock.now_utc(), self.utc_offset_minutes)
    }

    /// Upsert the day's scheduled challenge definition.
    pub async fn schedule(&self, def: ChallengeDef) -> Result<ChallengeDef> {
        if def.target_value <= 0 {
            return Err(EngineError::Validation("targetValue must be positive".to_string()).into());
        }
        if def.challenge_date.parse::<NaiveDate>().is_err() {
            return Err(EngineError::Validation(format!(
                "challengeDate {:?} is not YYYY-MM-DD",
                def.challenge_date
            ))
            .into());
        }
        self.store.upsert_def(&def).await?;
        info!(challenge = %def.challenge_id, date = %def.challenge_date, "challenge scheduled");
        Ok(def)
    }

    /// Today's instance for the user, lazily created against the day's
    /// definition. `NotFound` when nothing is scheduled today.
    pub async fn today_instance(&self, user_id: &str) -> Result<ChallengeInstance> {
        let today = self.today().to_string();
        let def = self
            .store
            .def_for_day(&today)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("no challenge scheduled for {today}")))?;

        match self
            .store
            .get_instance(user_id, &def.challenge_id, &today)
            .await?
        {
            Some(instance) => Ok(instance),
            None => self.store.create_instance(user_id, &def, self.clock.now_utc()).await,
        }
    }

    /// Set the user's absolute progress on today's challenge, completing it
    /// when the target is reached. On the *first* transition to completed
    /// the day's entry in the user's snapshot is marked.
    pub async fn update_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        value: i64,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChallengeInstance> {
        if value < 0 {
            return Err(EngineError::Validation("progress value must be ≥ 0".to_string()).into());
        }

        let now = self.clock.now_utc();
        let today = self.today().to_string();
        let def = self
            .store
            .get_def(challenge_id, &today)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidState(format!(
                    "challenge {challenge_id} is not scheduled for {today}"
                ))
            })?;

        let mut instance = match self
            .store
            .get_instance(user_id, challenge_id, &today)
            .await?
        {
            Some(instance) => instance,
            None => self.store.create_instance(user_id, &def, now).await?,
        };

        if instance.rewards_claimed {
            return Err(EngineError::InvalidState(format!(
                "challenge {challenge_id} already claimed for {today}"
            ))
            .into());
        }

        instance.current_progress = value;
        if let Some(meta) = metadata {
            instance.metadata = Some(meta.to_string());
        }

        let newly_completed = !instance.is_completed && value >= instance.target_value;
        if newly_completed {
            instance.is_completed = true;
            instance.completed_at = Some(now.to_rfc3339());
            info!(user = %user_id, challenge = %challenge_id, "daily challenge completed");
        }
        instance.updated_at = now.to_rfc3339();
        self.store.update_instance(&instance).await?;

        if newly_completed {
            self.progress.note_challenge_completed(user_id).await?;
        }

        Ok(instance)
    }

    /// Claim the rewards of today's completed challenge. Guarded: the
    /// instance must exist, be completed, and not yet claimed. The reward
    /// side effects (bonus XP, streak bonus, daily XP roll-up) land in the
    /// user's progress snapshot.
    pub async fn claim_rewards(&self, user_id: &str, challenge_id: &str) -> Result<ChallengeInstance> {
        let now = self.clock.now_utc();
        let today = self.today().to_string();

        let mut instance = self
            .store
            .get_instance(user_id, challenge_id, &today)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "no progress for challenge {challenge_id} on {today}"
                ))
            })?;

        if !instance.is_completed {
            return Err(EngineError::InvalidState(
                "cannot claim rewards: challenge not completed".to_string(),
            )
            .into());
        }
        if instance.rewards_claimed {
            return Err(EngineError::InvalidState(
                "rewards already claimed".to_string(),
            )
            .into());
        }

        let def = self
            .store
            .get_def(challenge_id, &today)
            .await?
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "definition for {challenge_id} on {today} disappeared"
                ))
            })?;

        // Mark claimed first so a reward-side failure cannot grant XP twice.
        instance.rewards_claimed = true;
        instance.rewards_claimed_at = Some(now.to_rfc3339());
        instance.updated_at = now.to_rfc3339();
        self.store.update_instance(&instance).await?;

        self.progress
            .apply_challenge_rewards(
                user_id,
                def.xp_bonus.max(0) as u64,
                def.streak_bonus.max(0) as u32,
            )
            .await?;

        info!(user = %user_id, challenge = %challenge_id, "challenge rewards claimed");
        Ok(instance)
    }

    /// Consecutive days ending today on which the user completed a
    /// challenge. Stops at the first gap, so an incomplete today yields 0.
    pub async fn challenge_streak(&self, user_id: &str) -> Result<u32> {
        let completed: HashSet<NaiveDate> = self
            .store
            .completed_dates(user_id)
            .await?
            .into_iter()
            .filter_map(|d| d.parse().ok())
            .collect();

        let mut streak = 0u32;
        let mut day = self.today();
        while completed.contains(&day) {
            streak += 1;
            match day.pred_opt() {
                Some(previous) => day = previous,
                None => break,
            }
        }
        Ok(streak)
    }
}
