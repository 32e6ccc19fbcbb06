// SPDX-License-Identifier: MIT
//! Achievement definition types.
//!
//! The catalog is an immutable input to the engine — the unlock pass never
//! fetches it itself. Unknown criterion types and operators deserialize to
//! explicit `Unknown` variants that always evaluate to `false`: a malformed
//! catalog row can never unlock anything.

use serde::{Deserialize, Serialize};

/// Comparison operator in an achievement criterion, `actual <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    /// Any operator string the engine does not recognise. Never matches.
    #[serde(other)]
    Unknown,
}

impl Operator {
    pub fn compare(self, actual: i64, threshold: i64) -> bool {
        match self {
            Operator::Gte => actual >= threshold,
            Operator::Gt => actual > threshold,
            Operator::Eq => actual == threshold,
            Operator::Lt => actual < threshold,
            Operator::Lte => actual <= threshold,
            Operator::Unknown => false,
        }
    }
}

/// The aggregate a criterion reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionType {
    TotalXp,
    LevelReached,
    StreakDays,
    GamesPlayed,
    PerfectScores,
    TotalPlayTime,
    CorrectAnswers,
    CategoriesCompleted,
    /// Perfect scores among the last 5 games.
    ConsecutiveWins,
    /// At least one game played; ignores operator and value.
    FirstGame,
    /// Played both today and yesterday; ignores operator and value.
    DailyPlayer,
    /// Games finished in under two minutes.
    SpeedDemon,
    /// Perfect scores among the last 10 games.
    Perfectionist,
    /// Any criterion type the engine does not recognise. Never matches.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    pub value: i64,
    pub operator: Operator,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRewards {
    /// XP granted to the user when the achievement unlocks.
    #[serde(default)]
    pub xp_bonus: u64,
}

/// One row of the achievement catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
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
    pub criteria: Criterion,
    pub points: u32,
    /// Achievement ids that must already be unlocked before this one is
    /// considered.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub rewards: AchievementRewards,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_table() {
        assert!(Operator::Gte.compare(5, 5));
        assert!(Operator::Gt.compare(6, 5));
        assert!(!Operator::Gt.compare(5, 5));
        assert!(Operator::Eq.compare(5, 5));
        assert!(Operator::Lt.compare(4, 5));
        assert!(Operator::Lte.compare(5, 5));
        assert!(!Operator::Unknown.compare(100, 0));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let op: Operator = serde_json::from_str("\"~=\"").unwrap();
        assert_eq!(op, Operator::Unknown);
        assert!(!op.compare(10, 1));
    }

    #[test]
    fn unknown_criterion_type_fails_closed() {
        let ct: CriterionType = serde_json::from_str("\"moon_phase\"").unwrap();
        assert_eq!(ct, CriterionType::Unknown);
    }

    #[test]
    fn definition_roundtrip_json() {
        let def = AchievementDefinition {
            achievement_id: "streak_7".to_string(),
            name: "Week Streak".to_string(),
            description: "Played seven days in a row.".to_string(),
            category: "streak".to_string(),
            icon: Some("flame".to_string()),
            color: None,
            rarity: Some("rare".to_string()),
            criteria: Criterion {
                criterion_type: CriterionType::StreakDays,
                value: 7,
                operator: Operator::Gte,
            },
            points: 70,
            prerequisites: vec!["streak_3".to_string()],
            rewards: AchievementRewards { xp_bonus: 200 },
            is_active: true,
        };
        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains("\"achievementId\""));
        assert!(json.contains("\"type\":\"streak_days\""));
        assert!(json.contains("\">=\""));
        let back: AchievementDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.achievement_id, "streak_7");
        assert_eq!(back.criteria.criterion_type, CriterionType::StreakDays);
        assert_eq!(back.rewards.xp_bonus, 200);
    }

    #[test]
    fn is_active_defaults_to_true() {
        let def: AchievementDefinition = serde_json::from_str(
            r#"{
                "achievementId": "a",
                "name": "A",
                "description": "",
                "category": "misc",
                "criteria": {"type": "total_xp", "value": 1, "operator": ">="},
                "points": 5
            }"#,
        )
        .unwrap();
        assert!(def.is_active);
        assert!(def.prerequisites.is_empty());
        assert_eq!(def.rewards.xp_bonus, 0);
    }
}
