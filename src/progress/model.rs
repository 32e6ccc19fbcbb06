// SPDX-License-Identifier: MIT
//! The per-user progress snapshot document.
//!
//! One document per user, stored whole as JSON and mutated in memory between
//! a load and a save. Wire field names are camelCase to match the mobile
//! client. Invariants (checked by [`ProgressSnapshot::validate`]):
//!
//! - `level == leveling::level_of(total_xp)` after every mutation
//! - `achievements` ids are unique; the list is append-only
//! - at most one `DailyEntry` per calendar day
//! - `total_correct_answers <= total_questions_answered`
//! - `best_streak` is a monotonic high-water mark of `streak`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub user_id: String,
    pub total_xp: u64,
    pub level: u32,
    /// Consecutive calendar days with recorded activity.
    pub streak: u32,
    #[serde(default)]
    pub levels: Vec<LevelProgress>,
    #[serde(default)]
    pub categories: Vec<CategoryProgress>,
    #[serde(default)]
    pub statistics: Statistics,
    /// Append-only; an achievement id appears at most once.
    #[serde(default)]
    pub achievements: Vec<UnlockedAchievement>,
    /// Append-only play history; recent-games queries and the
    /// consecutive-win lookback read from the tail.
    #[serde(default)]
    pub games_played: Vec<PlayedGame>,
    /// At most one entry per calendar day.
    #[serde(default)]
    pub daily_progress: Vec<DailyEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_play_time_seconds: u64,
    pub total_games_played: u64,
    /// Mean score over all games, rounded to the nearest integer.
    pub average_score: u32,
    /// Running sum backing `average_score` so the mean is O(1) per event
    /// while keeping the exact full-history rounding.
    #[serde(default)]
    pub score_sum: u64,
    pub best_streak: u32,
    pub perfect_scores: u64,
    pub total_correct_answers: u64,
    pub total_questions_answered: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub name: String,
    pub level_type: String,
    pub is_completed: bool,
    /// 0–100.
    pub completion_percentage: u8,
    #[serde(default)]
    pub stages: Vec<StageProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    pub name: String,
    pub number: u32,
    pub is_completed: bool,
    /// Best score across attempts.
    pub score: u32,
    pub max_score: u32,
    pub attempts: u32,
    /// Set exactly once, on the first completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub name: String,
    pub category_type: String,
    pub is_completed: bool,
    /// 0–100.
    pub completion_percentage: u8,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    pub points: u32,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedAchievement {
    pub fn from_definition(
        definition: &crate::achievements::model::AchievementDefinition,
        unlocked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            achievement_id: definition.achievement_id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            category: definition.category.clone(),
            icon: definition.icon.clone(),
            color: definition.color.clone(),
            rarity: definition.rarity.clone(),
            points: definition.points,
            unlocked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedGame {
    pub game_type: String,
    pub name: String,
    pub level_name: String,
    pub stage_name: String,
    pub score: u32,
    pub max_score: u32,
    pub time_spent_seconds: u64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub played_at: DateTime<Utc>,
}

impl PlayedGame {
    pub fn is_perfect(&self) -> bool {
        self.score == self.max_score
    }
}

/// A finished-game event as submitted by the client. The engine stamps
/// `played_at` from its clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedGameEvent {
    pub game_type: String,
    pub name: String,
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub stage_name: String,
    pub score: u32,
    pub max_score: u32,
    #[serde(default)]
    pub time_spent_seconds: u64,
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl PlayedGameEvent {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.correct_answers > self.total_questions {
            return Err(EngineError::Validation(format!(
                "correctAnswers {} exceeds totalQuestions {}",
                self.correct_answers, self.total_questions
            )));
        }
        if self.score > self.max_score {
            return Err(EngineError::Validation(format!(
                "score {} exceeds maxScore {}",
                self.score, self.max_score
            )));
        }
        Ok(())
    }

    pub fn into_played(self, played_at: DateTime<Utc>) -> PlayedGame {
        PlayedGame {
            game_type: self.game_type,
            name: self.name,
            level_name: self.level_name,
            stage_name: self.stage_name,
            score: self.score,
            max_score: self.max_score,
            time_spent_seconds: self.time_spent_seconds,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            played_at,
        }
    }
}

/// One calendar day's activity roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub xp_earned: u64,
    pub games_played: u32,
    pub time_spent_seconds: u64,
    pub challenges_completed: u32,
    /// An entry exists for the day means activity happened; this flag is
    /// what tomorrow's streak decision reads.
    pub streak_maintained: bool,
}

impl DailyEntry {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            xp_earned: 0,
            games_played: 0,
            time_spent_seconds: 0,
            challenges_completed: 0,
            streak_maintained: false,
        }
    }
}

impl ProgressSnapshot {
    /// A zeroed snapshot for a user seen for the first time.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_xp: 0,
            level: 1,
            streak: 0,
            levels: Vec::new(),
            categories: Vec::new(),
            statistics: Statistics::default(),
            achievements: Vec::new(),
            games_played: Vec::new(),
            daily_progress: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements
            .iter()
            .any(|a| a.achievement_id == achievement_id)
    }

    pub fn daily_entry(&self, date: NaiveDate) -> Option<&DailyEntry> {
        self.daily_progress.iter().find(|e| e.date == date)
    }

    pub fn daily_entry_mut(&mut self, date: NaiveDate) -> Option<&mut DailyEntry> {
        self.daily_progress.iter_mut().find(|e| e.date == date)
    }

    /// Check the document invariants. Run after mutations in tests and
    /// before persisting when debugging storage issues.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.level != crate::progress::leveling::level_of(self.total_xp) {
            return Err(EngineError::Validation(format!(
                "level {} does not match totalXp {}",
                self.level, self.total_xp
            )));
        }
        if self.statistics.total_correct_answers > self.statistics.total_questions_answered {
            return Err(EngineError::Validation(
                "totalCorrectAnswers exceeds totalQuestionsAnswered".to_string(),
            ));
        }
        if self.statistics.best_streak < self.streak {
            return Err(EngineError::Validation(
                "bestStreak below current streak".to_string(),
            ));
        }
        let mut ids = HashSet::new();
        for achievement in &self.achievements {
            if !ids.insert(achievement.achievement_id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate achievement id {}",
                    achievement.achievement_id
                )));
            }
        }
        let mut days = HashSet::new();
        for entry in &self.daily_progress {
            if !days.insert(entry.date) {
                return Err(EngineError::Validation(format!(
                    "duplicate daily entry for {}",
                    entry.date
                )));
            }
        }
        for category in &self.categories {
            if category.completed_lessons > category.total_lessons {
                return Err(EngineError::Validation(format!(
                    "category {} has more completed than total lessons",
                    category.name
                )));
            }
            if category.completion_percentage > 100 {
                return Err(EngineError::Validation(format!(
                    "category {} completion above 100%",
                    category.name
                )));
            }
        }
        for level in &self.levels {
            if level.completion_percentage > 100 {
                return Err(EngineError::Validation(format!(
                    "level {} completion above 100%",
                    level.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn new_snapshot_is_zeroed_and_valid() {
        let snapshot = ProgressSnapshot::new("user-1", now());
        assert_eq!(snapshot.total_xp, 0);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.streak, 0);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn snapshot_roundtrip_uses_camel_case() {
        let snapshot = ProgressSnapshot::new("user-1", now());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"totalXp\""));
        assert!(json.contains("\"dailyProgress\""));
        let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id, "user-1");
    }

    #[test]
    fn event_validation_rejects_inconsistent_counts() {
        let mut event = PlayedGameEvent {
            game_type: "quiz".to_string(),
            name: "Animals".to_string(),
            level_name: String::new(),
            stage_name: String::new(),
            score: 80,
            max_score: 100,
            time_spent_seconds: 60,
            correct_answers: 8,
            total_questions: 10,
        };
        assert!(event.validate().is_ok());
        event.correct_answers = 11;
        assert!(event.validate().is_err());
        event.correct_answers = 8;
        event.score = 101;
        assert!(event.validate().is_err());
    }

    #[test]
    fn validate_catches_duplicate_achievement_ids() {
        let mut snapshot = ProgressSnapshot::new("user-1", now());
        for _ in 0..2 {
            snapshot.achievements.push(UnlockedAchievement {
                achievement_id: "first_game".to_string(),
                name: "First Steps".to_string(),
                description: String::new(),
                category: "getting_started".to_string(),
                icon: None,
                color: None,
                rarity: None,
                points: 10,
                unlocked_at: now(),
            });
        }
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn validate_catches_duplicate_daily_entries() {
        let mut snapshot = ProgressSnapshot::new("user-1", now());
        let day = now().date_naive();
        snapshot.daily_progress.push(DailyEntry::empty(day));
        snapshot.daily_progress.push(DailyEntry::empty(day));
        assert!(snapshot.validate().is_err());
    }
}
