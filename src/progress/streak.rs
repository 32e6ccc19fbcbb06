// SPDX-License-Identifier: MIT
//! Streak calculator.
//!
//! The continuity decision is made exactly once per calendar day — on the
//! first activity that creates the day's entry — and depends only on
//! yesterday's recorded `streak_maintained` flag. Touching the same day
//! again adds deltas to the entry but never re-decides the streak, so a
//! user playing five times on Tuesday still counts Tuesday once.

use chrono::NaiveDate;

use super::model::{DailyEntry, ProgressSnapshot};

/// Per-event contribution to today's entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyDelta {
    pub xp_earned: u64,
    pub games_played: u32,
    pub time_spent_seconds: u64,
    pub challenges_completed: u32,
}

/// Record activity for `today`: find or create the day's entry, fold in the
/// deltas, and (only when the entry is new) update the streak.
///
/// Streak rule: yesterday maintained ⇒ `streak + 1`; otherwise the streak
/// resets to 1 — today itself still counts as day one. `best_streak` is
/// raised to match when the new streak exceeds it.
pub fn touch_day(snapshot: &mut ProgressSnapshot, today: NaiveDate, delta: DailyDelta) {
    if snapshot.daily_entry(today).is_none() {
        snapshot.daily_progress.push(DailyEntry::empty(today));

        let yesterday_maintained = today
            .pred_opt()
            .and_then(|yesterday| snapshot.daily_entry(yesterday))
            .map(|entry| entry.streak_maintained)
            .unwrap_or(false);
        snapshot.streak = if yesterday_maintained {
            snapshot.streak + 1
        } else {
            1
        };
        snapshot.statistics.best_streak = snapshot.statistics.best_streak.max(snapshot.streak);
    }

    if let Some(entry) = snapshot.daily_entry_mut(today) {
        entry.xp_earned += delta.xp_earned;
        entry.games_played += delta.games_played;
        entry.time_spent_seconds += delta.time_spent_seconds;
        entry.challenges_completed += delta.challenges_completed;
        entry.streak_maintained = true;
    }
}
