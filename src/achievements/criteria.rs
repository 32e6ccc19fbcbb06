// SPDX-License-Identifier: MIT
//! Criterion evaluation — pure, total, never errors.
//!
//! Every arm reads one aggregate from the snapshot and compares it with the
//! criterion's operator. Unknown criterion types and operators evaluate to
//! `false` so a misconfigured catalog row can never unlock.

use chrono::NaiveDate;

use super::model::{Criterion, CriterionType};
use crate::progress::model::ProgressSnapshot;

/// Lookback window for `consecutive_wins`.
const CONSECUTIVE_WIN_WINDOW: usize = 5;
/// Lookback window for `perfectionist`.
const PERFECTIONIST_WINDOW: usize = 10;
/// A game counts for `speed_demon` when it finished in under this long.
const SPEED_DEMON_MAX_SECS: u64 = 120;

pub fn evaluate(criterion: &Criterion, snapshot: &ProgressSnapshot, today: NaiveDate) -> bool {
    let operator = criterion.operator;
    let threshold = criterion.value;
    let stats = &snapshot.statistics;

    match criterion.criterion_type {
        CriterionType::TotalXp => operator.compare(snapshot.total_xp as i64, threshold),
        CriterionType::LevelReached => operator.compare(snapshot.level as i64, threshold),
        CriterionType::StreakDays => operator.compare(snapshot.streak as i64, threshold),
        CriterionType::GamesPlayed => {
            operator.compare(stats.total_games_played as i64, threshold)
        }
        CriterionType::PerfectScores => operator.compare(stats.perfect_scores as i64, threshold),
        CriterionType::TotalPlayTime => {
            operator.compare(stats.total_play_time_seconds as i64, threshold)
        }
        CriterionType::CorrectAnswers => {
            operator.compare(stats.total_correct_answers as i64, threshold)
        }
        CriterionType::CategoriesCompleted => {
            let completed = snapshot.categories.iter().filter(|c| c.is_completed).count();
            operator.compare(completed as i64, threshold)
        }
        CriterionType::ConsecutiveWins => {
            operator.compare(perfect_in_tail(snapshot, CONSECUTIVE_WIN_WINDOW), threshold)
        }
        // Boolean checks: operator and value are ignored.
        CriterionType::FirstGame => stats.total_games_played >= 1,
        CriterionType::DailyPlayer => played_today_and_yesterday(snapshot, today),
        CriterionType::SpeedDemon => {
            let fast = snapshot
                .games_played
                .iter()
                .filter(|g| g.time_spent_seconds < SPEED_DEMON_MAX_SECS)
                .count();
            operator.compare(fast as i64, threshold)
        }
        CriterionType::Perfectionist => {
            operator.compare(perfect_in_tail(snapshot, PERFECTIONIST_WINDOW), threshold)
        }
        CriterionType::Unknown => false,
    }
}

fn perfect_in_tail(snapshot: &ProgressSnapshot, window: usize) -> i64 {
    snapshot
        .games_played
        .iter()
        .rev()
        .take(window)
        .filter(|g| g.is_perfect())
        .count() as i64
}

fn played_today_and_yesterday(snapshot: &ProgressSnapshot, today: NaiveDate) -> bool {
    let played_on = |date: NaiveDate| {
        snapshot
            .daily_entry(date)
            .map(|e| e.games_played > 0)
            .unwrap_or(false)
    };
    match today.pred_opt() {
        Some(yesterday) => played_on(today) && played_on(yesterday),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::model::Operator;
    use crate::progress::model::{DailyEntry, PlayedGame};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> ProgressSnapshot {
        ProgressSnapshot::new("user-1", Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap())
    }

    fn criterion(criterion_type: CriterionType, value: i64, operator: Operator) -> Criterion {
        Criterion {
            criterion_type,
            value,
            operator,
        }
    }

    fn game(score: u32, max_score: u32, secs: u64) -> PlayedGame {
        PlayedGame {
            game_type: "quiz".to_string(),
            name: "Animals".to_string(),
            level_name: "A1".to_string(),
            stage_name: "1".to_string(),
            score,
            max_score,
            time_spent_seconds: secs,
            correct_answers: score / 10,
            total_questions: max_score / 10,
            played_at: Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        "2026-03-10".parse().unwrap()
    }

    #[test]
    fn total_xp_respects_operator() {
        let mut s = snapshot();
        s.total_xp = 1_000;
        assert!(evaluate(
            &criterion(CriterionType::TotalXp, 1_000, Operator::Gte),
            &s,
            today()
        ));
        assert!(!evaluate(
            &criterion(CriterionType::TotalXp, 1_000, Operator::Gt),
            &s,
            today()
        ));
        assert!(evaluate(
            &criterion(CriterionType::TotalXp, 2_000, Operator::Lt),
            &s,
            today()
        ));
    }

    #[test]
    fn first_game_ignores_operator_and_value() {
        let mut s = snapshot();
        assert!(!evaluate(
            &criterion(CriterionType::FirstGame, 999, Operator::Unknown),
            &s,
            today()
        ));
        s.statistics.total_games_played = 1;
        assert!(evaluate(
            &criterion(CriterionType::FirstGame, 999, Operator::Unknown),
            &s,
            today()
        ));
    }

    #[test]
    fn consecutive_wins_only_looks_at_last_five() {
        let mut s = snapshot();
        // Five perfects followed by one miss: only 4 perfects in the window.
        for _ in 0..5 {
            s.games_played.push(game(100, 100, 90));
        }
        s.games_played.push(game(50, 100, 90));
        assert!(!evaluate(
            &criterion(CriterionType::ConsecutiveWins, 5, Operator::Gte),
            &s,
            today()
        ));
        // One more perfect pushes the miss toward the edge: still only 4.
        s.games_played.push(game(100, 100, 90));
        assert!(evaluate(
            &criterion(CriterionType::ConsecutiveWins, 4, Operator::Gte),
            &s,
            today()
        ));
    }

    #[test]
    fn perfectionist_window_is_ten() {
        let mut s = snapshot();
        for _ in 0..10 {
            s.games_played.push(game(100, 100, 90));
        }
        assert!(evaluate(
            &criterion(CriterionType::Perfectionist, 10, Operator::Gte),
            &s,
            today()
        ));
        s.games_played.push(game(10, 100, 90));
        assert!(!evaluate(
            &criterion(CriterionType::Perfectionist, 10, Operator::Gte),
            &s,
            today()
        ));
    }

    #[test]
    fn speed_demon_counts_fast_games() {
        let mut s = snapshot();
        for _ in 0..3 {
            s.games_played.push(game(50, 100, 119));
        }
        s.games_played.push(game(50, 100, 120));
        assert!(evaluate(
            &criterion(CriterionType::SpeedDemon, 3, Operator::Eq),
            &s,
            today()
        ));
    }

    #[test]
    fn daily_player_needs_both_days_with_games() {
        let mut s = snapshot();
        let mut today_entry = DailyEntry::empty(today());
        today_entry.games_played = 1;
        s.daily_progress.push(today_entry);
        assert!(!evaluate(
            &criterion(CriterionType::DailyPlayer, 1, Operator::Gte),
            &s,
            today()
        ));

        let mut yesterday_entry = DailyEntry::empty(today().pred_opt().unwrap());
        yesterday_entry.games_played = 2;
        s.daily_progress.push(yesterday_entry);
        assert!(evaluate(
            &criterion(CriterionType::DailyPlayer, 1, Operator::Gte),
            &s,
            today()
        ));
    }

    #[test]
    fn daily_player_rejects_entry_without_games() {
        let mut s = snapshot();
        let mut today_entry = DailyEntry::empty(today());
        today_entry.games_played = 1;
        s.daily_progress.push(today_entry);
        // Yesterday exists (e.g. challenge-only activity) but had no games.
        s.daily_progress
            .push(DailyEntry::empty(today().pred_opt().unwrap()));
        assert!(!evaluate(
            &criterion(CriterionType::DailyPlayer, 1, Operator::Gte),
            &s,
            today()
        ));
    }

    #[test]
    fn categories_completed_counts_completed_only() {
        let mut s = snapshot();
        for (name, done) in [("animals", true), ("food", true), ("travel", false)] {
            s.categories.push(crate::progress::model::CategoryProgress {
                name: name.to_string(),
                category_type: "vocabulary".to_string(),
                is_completed: done,
                completion_percentage: if done { 100 } else { 40 },
                total_lessons: 10,
                completed_lessons: if done { 10 } else { 4 },
                last_played: None,
            });
        }
        assert!(evaluate(
            &criterion(CriterionType::CategoriesCompleted, 2, Operator::Eq),
            &s,
            today()
        ));
    }

    #[test]
    fn unknown_type_and_operator_fail_closed() {
        let mut s = snapshot();
        s.total_xp = 1_000_000;
        assert!(!evaluate(
            &criterion(CriterionType::Unknown, 0, Operator::Gte),
            &s,
            today()
        ));
        assert!(!evaluate(
            &criterion(CriterionType::TotalXp, 0, Operator::Unknown),
            &s,
            today()
        ));
    }
}
