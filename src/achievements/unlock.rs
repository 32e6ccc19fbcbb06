// SPDX-License-Identifier: MIT
//! The achievement unlock pass.
//!
//! One linear sweep over the catalog in order. The central correctness
//! property: running the pass twice on an unchanged snapshot is a no-op
//! the second time — every unlock is recorded in the snapshot's append-only
//! list, and already-present ids are skipped.
//!
//! Criteria are evaluated against a frozen pre-pass view of the snapshot, so
//! XP bonuses granted by this pass cannot satisfy a later `total_xp`
//! criterion within the same sweep. Prerequisites, in contrast, read the
//! live unlocked list: an achievement unlocked earlier in this sweep counts.
//! A dependent ordered *before* its prerequisite therefore waits for the
//! next pass — an inherited catalog-order dependency, exercised by tests.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use super::criteria;
use super::model::AchievementDefinition;
use crate::progress::leveling;
use crate::progress::model::{ProgressSnapshot, UnlockedAchievement};

/// Sweep the catalog against the snapshot, appending newly unlocked
/// achievements and applying their XP bonuses. Returns everything appended
/// during the pass, including `level_<N>` records emitted by bonus XP.
pub fn run_pass(
    snapshot: &mut ProgressSnapshot,
    catalog: &[AchievementDefinition],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<UnlockedAchievement> {
    let frozen = snapshot.clone();
    let already_unlocked = snapshot.achievements.len();

    for definition in catalog.iter().filter(|d| d.is_active) {
        if snapshot.has_achievement(&definition.achievement_id) {
            continue;
        }

        if let Some(missing) = definition
            .prerequisites
            .iter()
            .find(|id| !snapshot.has_achievement(id))
        {
            if !catalog.iter().any(|d| &d.achievement_id == missing) {
                // Catalog references an id that does not exist. Fail closed:
                // the prerequisite stays unsatisfied, the pass continues.
                warn!(
                    achievement = %definition.achievement_id,
                    prerequisite = %missing,
                    "prerequisite missing from catalog"
                );
            }
            continue;
        }

        if !criteria::evaluate(&definition.criteria, &frozen, today) {
            continue;
        }

        debug!(achievement = %definition.achievement_id, "achievement unlocked");
        snapshot
            .achievements
            .push(UnlockedAchievement::from_definition(definition, now));
        if definition.rewards.xp_bonus > 0 {
            leveling::apply_xp(snapshot, definition.rewards.xp_bonus, now);
        }
    }

    snapshot.achievements[already_unlocked..].to_vec()
}
