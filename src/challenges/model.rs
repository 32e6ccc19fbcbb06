// SPDX-License-Identifier: MIT
//! Daily challenge data model.
//!
//! A `ChallengeDef` is the day's scheduled challenge (written by the content
//! feed); a `ChallengeInstance` is one user's progress against it. Dates are
//! stored as `YYYY-MM-DD` strings, timestamps as RFC 3339.

use serde::{Deserialize, Serialize};

/// One scheduled challenge for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDef {
    pub challenge_id: String,
    pub challenge_date: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub challenge_type: String,
    pub target_value: i64,
    #[serde(default)]
    pub xp_bonus: i64,
    #[serde(default)]
    pub streak_bonus: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One user's progress against one day's challenge.
///
/// `target_value` is copied from the definition at creation so the row
/// stays self-contained once the definition rotates out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInstance {
    pub user_id: String,
    pub challenge_id: String,
    pub challenge_date: String,
    pub target_value: i64,
    pub current_progress: i64,
    pub is_completed: bool,
    /// Set exactly once, on the transition to completed.
    pub completed_at: Option<String>,
    /// Can only become true after `is_completed`; the row is immutable
    /// afterwards.
    pub rewards_claimed: bool,
    pub rewards_claimed_at: Option<String>,
    /// Opaque client JSON (e.g. which words were practised).
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Derived lifecycle state: not_started → in_progress → completed →
/// rewards_claimed (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    NotStarted,
    InProgress,
    Completed,
    RewardsClaimed,
}

impl std::fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChallengeState::NotStarted => write!(f, "not_started"),
            ChallengeState::InProgress => write!(f, "in_progress"),
            ChallengeState::Completed => write!(f, "completed"),
            ChallengeState::RewardsClaimed => write!(f, "rewards_claimed"),
        }
    }
}

impl ChallengeInstance {
    pub fn state(&self) -> ChallengeState {
        if self.rewards_claimed {
            ChallengeState::RewardsClaimed
        } else if self.is_completed {
            ChallengeState::Completed
        } else if self.current_progress > 0 {
            ChallengeState::InProgress
        } else {
            ChallengeState::NotStarted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> ChallengeInstance {
        ChallengeInstance {
            user_id: "user-1".to_string(),
            challenge_id: "daily-words".to_string(),
            challenge_date: "2026-03-10".to_string(),
            target_value: 5,
            current_progress: 0,
            is_completed: false,
            completed_at: None,
            rewards_claimed: false,
            rewards_claimed_at: None,
            metadata: None,
            created_at: "2026-03-10T08:00:00+00:00".to_string(),
            updated_at: "2026-03-10T08:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn state_progression() {
        let mut row = instance();
        assert_eq!(row.state(), ChallengeState::NotStarted);
        row.current_progress = 3;
        assert_eq!(row.state(), ChallengeState::InProgress);
        row.is_completed = true;
        assert_eq!(row.state(), ChallengeState::Completed);
        row.rewards_claimed = true;
        assert_eq!(row.state(), ChallengeState::RewardsClaimed);
    }

    #[test]
    fn state_serialises_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChallengeState::RewardsClaimed).unwrap(),
            "\"rewards_claimed\""
        );
        assert_eq!(ChallengeState::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn def_is_active_defaults_true() {
        let def: ChallengeDef = serde_json::from_str(
            r#"{
                "challengeId": "daily-words",
                "challengeDate": "2026-03-10",
                "title": "Learn 5 words",
                "targetValue": 5
            }"#,
        )
        .unwrap();
        assert!(def.is_active);
        assert_eq!(def.xp_bonus, 0);
    }
}
