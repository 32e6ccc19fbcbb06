// SPDX-License-Identifier: MIT
//! The progress engine — orchestrates one read-modify-write cycle per
//! mutation: lock the user, load the snapshot, run the rule components,
//! persist once.
//!
//! Writes for the *same* user are serialized by an in-process async lock so
//! close-together updates cannot silently lose each other (the storage
//! write itself is whole-document, last-write-wins). Different users share
//! no mutable state and proceed fully in parallel.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::model::{PlayedGame, PlayedGameEvent, ProgressSnapshot, UnlockedAchievement};
use super::storage::ProgressStore;
use super::{leveling, stats, streak};
use crate::achievements::model::AchievementDefinition;
use crate::achievements::unlock;
use crate::clock::{local_date, Clock};
use crate::error::EngineError;
use crate::progress::model::{CategoryProgress, LevelProgress, StageProgress};
use crate::progress::streak::DailyDelta;

/// What one `progress.recordGame` call changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReport {
    pub xp_earned: u64,
    pub new_level: u32,
    pub level_up: bool,
    pub streak: u32,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// A completed lesson stage as submitted by the client.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCompletionEvent {
    pub level_name: String,
    #[serde(default)]
    pub level_type: String,
    pub stage_name: String,
    pub stage_number: u32,
    pub score: u32,
    pub max_score: u32,
    #[serde(default)]
    pub time_spent_seconds: u64,
    /// Total stages in the level, when the client knows it; otherwise the
    /// count of stages seen so far is used as the denominator.
    #[serde(default)]
    pub total_stages: Option<u32>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub name: String,
    #[serde(default)]
    pub category_type: String,
    pub total_lessons: u32,
}

impl StageCompletionEvent {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.score > self.max_score {
            return Err(EngineError::Validation(format!(
                "score {} exceeds maxScore {}",
                self.score, self.max_score
            )));
        }
        if self.level_name.is_empty() {
            return Err(EngineError::Validation("levelName required".to_string()));
        }
        Ok(())
    }
}

/// What one `progress.completeStage` call changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub level_completion_percentage: u8,
    pub level_completed: bool,
    pub category_completed: bool,
    pub streak: u32,
    pub unlocked: Vec<UnlockedAchievement>,
}

pub struct ProgressEngine {
    store: ProgressStore,
    catalog: Arc<Vec<AchievementDefinition>>,
    clock: Arc<dyn Clock>,
    utc_offset_minutes: i32,
    /// One async mutex per user id; taken for the whole load→mutate→save
    /// cycle. The map itself is guarded by a short-lived lock.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProgressEngine {
    pub fn new(
        pool: SqlitePool,
        catalog: Arc<Vec<AchievementDefinition>>,
        clock: Arc<dyn Clock>,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            store: ProgressStore::new(pool),
            catalog,
            clock,
            utc_offset_minutes,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &[AchievementDefinition] {
        &self.catalog
    }

    /// The user's current calendar day under the configured offset.
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now_utc(), self.utc_offset_minutes)
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record a finished game: aggregates → leveling → streak → unlock
    /// pass, persisted once.
    ///
    /// When `event_id` is supplied and was already seen for this user, the
    /// event is ignored and the current state is reported back unchanged.
    pub async fn record_played_game(
        &self,
        user_id: &str,
        event: PlayedGameEvent,
        event_id: Option<&str>,
    ) -> Result<PlayReport> {
        event.validate()?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now_utc();
        let today = local_date(now, self.utc_offset_minutes);

        if let Some(id) = event_id {
            if !self.store.record_event_id(user_id, id, now).await? {
                debug!(user = %user_id, event = %id, "duplicate play event ignored");
                let snapshot = self.store.load_or_create(user_id, now).await?;
                return Ok(PlayReport {
                    xp_earned: 0,
                    new_level: snapshot.level,
                    level_up: false,
                    streak: snapshot.streak,
                    unlocked: Vec::new(),
                });
            }
        }

        let mut snapshot = self.store.load_or_create(user_id, now).await?;

        let time_spent = event.time_spent_seconds;
        let xp_earned = stats::apply_game(&mut snapshot, event, now);
        let leveled = leveling::apply_xp(&mut snapshot, xp_earned, now);
        streak::touch_day(
            &mut snapshot,
            today,
            DailyDelta {
                xp_earned,
                games_played: 1,
                time_spent_seconds: time_spent,
                challenges_completed: 0,
            },
        );
        let unlocked = unlock::run_pass(&mut snapshot, &self.catalog, today, now);

        snapshot.updated_at = now;
        self.store.save(&snapshot).await?;

        info!(
            user = %user_id,
            xp = xp_earned,
            level = snapshot.level,
            streak = snapshot.streak,
            unlocked = unlocked.len(),
            "recorded game"
        );

        Ok(PlayReport {
            xp_earned,
            new_level: snapshot.level,
            level_up: leveled.is_some(),
            streak: snapshot.streak,
            unlocked,
        })
    }

    /// Record a completed lesson stage: level/stage/category structure,
    /// play-time totals, daily activity, then the unlock pass.
    pub async fn complete_stage(
        &self,
        user_id: &str,
        event: StageCompletionEvent,
    ) -> Result<StageReport> {
        event.validate()?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now_utc();
        let today = local_date(now, self.utc_offset_minutes);
        let mut snapshot = self.store.load_or_create(user_id, now).await?;

        // Find or create the level and its stage.
        let level_idx = match snapshot.levels.iter().position(|l| l.name == event.level_name) {
            Some(idx) => idx,
            None => {
                snapshot.levels.push(LevelProgress {
                    name: event.level_name.clone(),
                    level_type: event.level_type.clone(),
                    is_completed: false,
                    completion_percentage: 0,
                    stages: Vec::new(),
                });
                snapshot.levels.len() - 1
            }
        };
        let level = &mut snapshot.levels[level_idx];

        let stage_idx = match level.stages.iter().position(|s| s.number == event.stage_number) {
            Some(idx) => idx,
            None => {
                level.stages.push(StageProgress {
                    name: event.stage_name.clone(),
                    number: event.stage_number,
                    is_completed: false,
                    score: 0,
                    max_score: event.max_score,
                    attempts: 0,
                    completed_at: None,
                });
                level.stages.len() - 1
            }
        };
        let stage = &mut level.stages[stage_idx];

        stage.attempts += 1;
        stage.score = stage.score.max(event.score);
        stage.max_score = event.max_score;
        let newly_completed = !stage.is_completed;
        stage.is_completed = true;
        if stage.completed_at.is_none() {
            stage.completed_at = Some(now);
        }

        let completed = level.stages.iter().filter(|s| s.is_completed).count() as u32;
        let total = event
            .total_stages
            .unwrap_or(0)
            .max(level.stages.len() as u32);
        level.completion_percentage = (completed * 100 / total.max(1)).min(100) as u8;
        level.is_completed = completed >= total;
        let level_completion_percentage = level.completion_percentage;
        let level_completed = level.is_completed;

        // Category roll-up, when the stage belongs to one.
        let mut category_completed = false;
        if let Some(category_ref) = &event.category {
            let category_idx = match snapshot
                .categories
                .iter()
                .position(|c| c.name == category_ref.name)
            {
                Some(idx) => idx,
                None => {
                    snapshot.categories.push(CategoryProgress {
                        name: category_ref.name.clone(),
                        category_type: category_ref.category_type.clone(),
                        is_completed: false,
                        completion_percentage: 0,
                        total_lessons: category_ref.total_lessons,
                        completed_lessons: 0,
                        last_played: None,
                    });
                    snapshot.categories.len() - 1
                }
            };
            let category = &mut snapshot.categories[category_idx];

            category.total_lessons = category.total_lessons.max(category_ref.total_lessons);
            if newly_completed {
                category.completed_lessons =
                    (category.completed_lessons + 1).min(category.total_lessons);
            }
            category.completion_percentage = (category.completed_lessons * 100
                / category.total_lessons.max(1))
            .min(100) as u8;
            category.is_completed =
                category.total_lessons > 0 && category.completed_lessons == category.total_lessons;
            category.last_played = Some(now);
            category_completed = category.is_completed;
        }

        snapshot.statistics.total_play_time_seconds += event.time_spent_seconds;
        streak::touch_day(
            &mut snapshot,
            today,
            DailyDelta {
                xp_earned: 0,
                games_played: 0,
                time_spent_seconds: event.time_spent_seconds,
                challenges_completed: 0,
            },
        );
        let unlocked = unlock::run_pass(&mut snapshot, &self.catalog, today, now);

        snapshot.updated_at = now;
        self.store.save(&snapshot).await?;

        info!(
            user = %user_id,
            level = %event.level_name,
            stage = event.stage_number,
            pct = level_completion_percentage,
            "stage completed"
        );

        Ok(StageReport {
            level_completion_percentage,
            level_completed,
            category_completed,
            streak: snapshot.streak,
            unlocked,
        })
    }

    /// Standalone unlock pass, for when stats changed without a dedicated
    /// play event. Persists only when something unlocked.
    pub async fn check_achievements(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now_utc();
        let today = local_date(now, self.utc_offset_minutes);
        let mut snapshot = self.store.load_or_create(user_id, now).await?;

        let unlocked = unlock::run_pass(&mut snapshot, &self.catalog, today, now);
        if !unlocked.is_empty() {
            snapshot.updated_at = now;
            self.store.save(&snapshot).await?;
            info!(user = %user_id, unlocked = unlocked.len(), "achievement check unlocked");
        }
        Ok(unlocked)
    }

    /// The user's snapshot, lazily created on first read.
    pub async fn get_progress(&self, user_id: &str) -> Result<ProgressSnapshot> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        self.store
            .load_or_create(user_id, self.clock.now_utc())
            .await
    }

    /// The last `limit` played games, newest first.
    pub async fn recent_games(&self, user_id: &str, limit: usize) -> Result<Vec<PlayedGame>> {
        let snapshot = self.get_progress(user_id).await?;
        Ok(snapshot
            .games_played
            .into_iter()
            .rev()
            .take(limit)
            .collect())
    }

    /// Mark a daily challenge completed on today's entry. Called by the
    /// challenge machine on the first transition to completed.
    pub(crate) async fn note_challenge_completed(&self, user_id: &str) -> Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now_utc();
        let today = local_date(now, self.utc_offset_minutes);
        let mut snapshot = self.store.load_or_create(user_id, now).await?;

        streak::touch_day(
            &mut snapshot,
            today,
            DailyDelta {
                challenges_completed: 1,
                ..DailyDelta::default()
            },
        );
        snapshot.updated_at = now;
        self.store.save(&snapshot).await
    }

    /// Apply claimed challenge rewards: bonus XP (level-checked), streak
    /// bonus (with the best-streak high-water), and today's XP roll-up.
    pub(crate) async fn apply_challenge_rewards(
        &self,
        user_id: &str,
        xp_bonus: u64,
        streak_bonus: u32,
    ) -> Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now_utc();
        let today = local_date(now, self.utc_offset_minutes);
        let mut snapshot = self.store.load_or_create(user_id, now).await?;

        // Touch the day first: if the claim is the day's first activity the
        // streak decision runs now, and the bonus stacks on top of it.
        streak::touch_day(
            &mut snapshot,
            today,
            DailyDelta {
                xp_earned: xp_bonus,
                ..DailyDelta::default()
            },
        );
        leveling::apply_xp(&mut snapshot, xp_bonus, now);
        if streak_bonus > 0 {
            snapshot.streak += streak_bonus;
            snapshot.statistics.best_streak =
                snapshot.statistics.best_streak.max(snapshot.streak);
        }

        snapshot.updated_at = now;
        self.store.save(&snapshot).await?;
        info!(user = %user_id, xp_bonus, streak_bonus, "challenge rewards applied");
        Ok(())
    }
}
