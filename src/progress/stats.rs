// SPDX-License-Identifier: MIT
//! Aggregate statistics updater.
//!
//! Applies one finished-game event to the rolling aggregates and appends it
//! to the play history. XP routing (and the level check that follows) is the
//! caller's job via `leveling::apply_xp` — this module only computes the
//! amount earned.

use chrono::{DateTime, Utc};

use super::model::{PlayedGameEvent, ProgressSnapshot};

pub const XP_PER_CORRECT_ANSWER: u64 = 10;
pub const PERFECT_SCORE_BONUS: u64 = 50;

/// XP earned by a single game: 10 per correct answer, +50 flat on a perfect
/// score.
pub fn xp_for_game(event: &PlayedGameEvent) -> u64 {
    let mut xp = event.correct_answers as u64 * XP_PER_CORRECT_ANSWER;
    if event.score == event.max_score {
        xp += PERFECT_SCORE_BONUS;
    }
    xp
}

/// Fold one event into the aggregates and history. Returns the XP earned.
///
/// The event is appended to `games_played` unconditionally — recent-games
/// queries and the consecutive-win lookback depend on the full history.
pub fn apply_game(
    snapshot: &mut ProgressSnapshot,
    event: PlayedGameEvent,
    played_at: DateTime<Utc>,
) -> u64 {
    let xp = xp_for_game(&event);

    let stats = &mut snapshot.statistics;
    stats.total_games_played += 1;
    stats.total_play_time_seconds += event.time_spent_seconds;
    stats.total_correct_answers += event.correct_answers as u64;
    stats.total_questions_answered += event.total_questions as u64;
    stats.score_sum += event.score as u64;
    // Same result as re-averaging the whole history, kept O(1) by the
    // running sum. Round-to-nearest, matching the client's display math.
    stats.average_score =
        (stats.score_sum as f64 / stats.total_games_played as f64).round() as u32;
    if event.score == event.max_score {
        stats.perfect_scores += 1;
    }

    snapshot.games_played.push(event.into_played(played_at));
    xp
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(score: u32, max_score: u32, correct: u32, total: u32) -> PlayedGameEvent {
        PlayedGameEvent {
            game_type: "quiz".to_string(),
            name: "Animals".to_string(),
            level_name: "A1".to_string(),
            stage_name: "1".to_string(),
            score,
            max_score,
            time_spent_seconds: 75,
            correct_answers: correct,
            total_questions: total,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn xp_is_ten_per_correct_plus_perfect_bonus() {
        assert_eq!(xp_for_game(&event(80, 100, 8, 10)), 80);
        assert_eq!(xp_for_game(&event(100, 100, 6, 10)), 110);
        assert_eq!(xp_for_game(&event(0, 100, 0, 10)), 0);
    }

    #[test]
    fn aggregates_accumulate() {
        let mut snapshot = ProgressSnapshot::new("user-1", now());
        apply_game(&mut snapshot, event(80, 100, 8, 10), now());
        apply_game(&mut snapshot, event(100, 100, 10, 10), now());

        let stats = &snapshot.statistics;
        assert_eq!(stats.total_games_played, 2);
        assert_eq!(stats.total_play_time_seconds, 150);
        assert_eq!(stats.total_correct_answers, 18);
        assert_eq!(stats.total_questions_answered, 20);
        assert_eq!(stats.perfect_scores, 1);
        assert_eq!(snapshot.games_played.len(), 2);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let mut snapshot = ProgressSnapshot::new("user-1", now());
        apply_game(&mut snapshot, event(70, 100, 7, 10), now());
        apply_game(&mut snapshot, event(75, 100, 7, 10), now());
        // mean 72.5 rounds up
        assert_eq!(snapshot.statistics.average_score, 73);
        apply_game(&mut snapshot, event(70, 100, 7, 10), now());
        // mean 71.67 rounds to 72
        assert_eq!(snapshot.statistics.average_score, 72);
    }

    #[test]
    fn history_appends_even_for_zero_score() {
        let mut snapshot = ProgressSnapshot::new("user-1", now());
        let xp = apply_game(&mut snapshot, event(0, 100, 0, 10), now());
        assert_eq!(xp, 0);
        assert_eq!(snapshot.games_played.len(), 1);
        assert!(!snapshot.games_played[0].is_perfect());
    }
}
