// SPDX-License-Identifier: MIT
//! Built-in achievement catalog.
//!
//! This list is the canonical source of truth for the shipped badges; the
//! mobile client renders each one via `achievements.list` (earned = full
//! color, unearned = grayscale). Ids are stable snake_case strings and must
//! never be renamed once released — unlocked records reference them forever.
//!
//! Hosts may replace or extend the catalog at wiring time; the engine only
//! ever sees it as an immutable slice.

use super::model::{
    AchievementDefinition, AchievementRewards, Criterion, CriterionType, Operator,
};

fn def(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    criterion_type: CriterionType,
    value: i64,
    points: u32,
) -> AchievementDefinition {
    AchievementDefinition {
        achievement_id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        icon: None,
        color: None,
        rarity: None,
        criteria: Criterion {
            criterion_type,
            value,
            operator: Operator::Gte,
        },
        points,
        prerequisites: Vec::new(),
        rewards: AchievementRewards::default(),
        is_active: true,
    }
}

/// All shipped achievement definitions, in unlock-pass order.
///
/// Prerequisite chains are ordered so a chain can resolve within a single
/// pass (the pass is one linear sweep; see `unlock::run_pass`).
pub fn builtin() -> Vec<AchievementDefinition> {
    vec![
        AchievementDefinition {
            rarity: Some("common".to_string()),
            ..def(
                "first_game",
                "First Steps",
                "Finished your first game. The journey begins.",
                "getting_started",
                CriterionType::FirstGame,
                1,
                10,
            )
        },
        AchievementDefinition {
            prerequisites: vec!["first_game".to_string()],
            ..def(
                "games_10",
                "Getting Warmed Up",
                "Played 10 games.",
                "dedication",
                CriterionType::GamesPlayed,
                10,
                25,
            )
        },
        AchievementDefinition {
            prerequisites: vec!["games_10".to_string()],
            rewards: AchievementRewards { xp_bonus: 250 },
            ..def(
                "games_50",
                "Marathoner",
                "Played 50 games.",
                "dedication",
                CriterionType::GamesPlayed,
                50,
                75,
            )
        },
        def(
            "perfect_1",
            "Flawless",
            "Scored a perfect game.",
            "mastery",
            CriterionType::PerfectScores,
            1,
            20,
        ),
        AchievementDefinition {
            prerequisites: vec!["perfect_1".to_string()],
            rewards: AchievementRewards { xp_bonus: 250 },
            rarity: Some("rare".to_string()),
            ..def(
                "perfect_10",
                "Perfection Habit",
                "Scored 10 perfect games.",
                "mastery",
                CriterionType::PerfectScores,
                10,
                100,
            )
        },
        def(
            "streak_3",
            "Warming Up",
            "Played three days in a row.",
            "streak",
            CriterionType::StreakDays,
            3,
            30,
        ),
        AchievementDefinition {
            prerequisites: vec!["streak_3".to_string()],
            rewards: AchievementRewards { xp_bonus: 200 },
            ..def(
                "streak_7",
                "Week Streak",
                "Played seven days in a row.",
                "streak",
                CriterionType::StreakDays,
                7,
                70,
            )
        },
        AchievementDefinition {
            prerequisites: vec!["streak_7".to_string()],
            rewards: AchievementRewards { xp_bonus: 1000 },
            rarity: Some("epic".to_string()),
            ..def(
                "streak_30",
                "Monthly Devotion",
                "Played thirty days in a row.",
                "streak",
                CriterionType::StreakDays,
                30,
                300,
            )
        },
        def(
            "xp_1000",
            "Rising Star",
            "Earned 1,000 XP.",
            "experience",
            CriterionType::TotalXp,
            1_000,
            50,
        ),
        AchievementDefinition {
            rewards: AchievementRewards { xp_bonus: 500 },
            ..def(
                "xp_10000",
                "XP Collector",
                "Earned 10,000 XP.",
                "experience",
                CriterionType::TotalXp,
                10_000,
                150,
            )
        },
        def(
            "scholar",
            "Scholar",
            "Reached level 5.",
            "experience",
            CriterionType::LevelReached,
            5,
            100,
        ),
        def(
            "correct_100",
            "Century of Answers",
            "Answered 100 questions correctly.",
            "mastery",
            CriterionType::CorrectAnswers,
            100,
            60,
        ),
        def(
            "hour_played",
            "Invested Hour",
            "Played for a total of one hour.",
            "dedication",
            CriterionType::TotalPlayTime,
            3_600,
            40,
        ),
        def(
            "daily_double",
            "Daily Double",
            "Played today and yesterday.",
            "streak",
            CriterionType::DailyPlayer,
            1,
            30,
        ),
        def(
            "win_streak_5",
            "On Fire",
            "Five perfect games in a row.",
            "mastery",
            CriterionType::ConsecutiveWins,
            5,
            80,
        ),
        def(
            "speed_demon",
            "Speed Demon",
            "Finished 10 games in under two minutes each.",
            "mastery",
            CriterionType::SpeedDemon,
            10,
            90,
        ),
        AchievementDefinition {
            rewards: AchievementRewards { xp_bonus: 300 },
            rarity: Some("rare".to_string()),
            ..def(
                "perfectionist",
                "Perfectionist",
                "Your last 10 games were all perfect.",
                "mastery",
                CriterionType::Perfectionist,
                10,
                120,
            )
        },
        AchievementDefinition {
            rewards: AchievementRewards { xp_bonus: 400 },
            ..def(
                "explorer",
                "Explorer",
                "Completed three whole categories.",
                "exploration",
                CriterionType::CategoriesCompleted,
                3,
                150,
            )
        },
    ]
}
