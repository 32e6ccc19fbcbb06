// SPDX-License-Identifier: MIT
//! Leveling: cumulative XP → level, with level-up achievement emission.
//!
//! Every XP mutation in the engine flows through [`apply_xp`] so the
//! `level == level_of(total_xp)` invariant holds after play events, unlock
//! bonuses, and challenge rewards alike.

use chrono::{DateTime, Utc};

use super::model::{ProgressSnapshot, UnlockedAchievement};

pub const XP_PER_LEVEL: u64 = 1_000;
const LEVEL_POINTS_MULTIPLIER: u32 = 100;

/// `floor(total_xp / 1000) + 1`. Pure, total, monotonic non-decreasing.
pub fn level_of(total_xp: u64) -> u32 {
    (total_xp / XP_PER_LEVEL) as u32 + 1
}

/// Add XP and recompute the level. On a level increase, append a
/// `level_<N>` achievement (N = the new level, points N*100) unless that id
/// is already present. Returns the new level when it increased.
///
/// Level-up achievements live in the same append-only list as catalog
/// unlocks so no catalog entry is needed for every possible level.
pub fn apply_xp(
    snapshot: &mut ProgressSnapshot,
    xp: u64,
    now: DateTime<Utc>,
) -> Option<u32> {
    snapshot.total_xp += xp;
    let new_level = level_of(snapshot.total_xp);
    if new_level <= snapshot.level {
        return None;
    }
    snapshot.level = new_level;

    let achievement_id = format!("level_{new_level}");
    if !snapshot.has_achievement(&achievement_id) {
        snapshot.achievements.push(UnlockedAchievement {
            achievement_id,
            name: format!("Level {new_level}"),
            description: format!("Reached level {new_level}."),
            category: "level".to_string(),
            icon: None,
            color: None,
            rarity: None,
            points: new_level * LEVEL_POINTS_MULTIPLIER,
            unlocked_at: now,
        });
    }
    Some(new_level)
}
