// SPDX-License-Identifier: MIT
//! Achievement RPC handlers.
//!
//! Dispatch entries (see `rpc::dispatch`):
//!
//! ```text
//! "achievements.list"  => achievements::handlers::list(params, ctx).await,
//! "achievements.check" => achievements::handlers::check(params, ctx).await,
//! ```

use anyhow::Result;
use serde_json::{json, Value};

use crate::AppContext;

/// `achievements.list` — the full catalog merged with the user's unlock
/// state. The client renders earned badges in full color, unearned ones
/// grayscale.
///
/// Params: `{ "userId": "user-123" }`
///
/// Response:
/// ```json
/// [
///   { "achievementId": "first_game", "name": "First Steps", "points": 10,
///     "unlocked": true, "unlockedAt": "2026-03-10T09:00:00+00:00" },
///   …
/// ]
/// ```
pub async fn list(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;

    let snapshot = ctx.engine.get_progress(user_id).await?;

    let result: Vec<Value> = ctx
        .engine
        .catalog()
        .iter()
        .filter(|d| d.is_active)
        .map(|definition| {
            let unlocked = snapshot
                .achievements
                .iter()
                .find(|a| a.achievement_id == definition.achievement_id);
            json!({
                "achievementId": definition.achievement_id,
                "name":          definition.name,
                "description":   definition.description,
                "category":      definition.category,
                "points":        definition.points,
                "rarity":        definition.rarity,
                "unlocked":      unlocked.is_some(),
                "unlockedAt":    unlocked.map(|a| a.unlocked_at),
            })
        })
        .collect();

    Ok(Value::Array(result))
}

/// `achievements.check` — run the unlock pass without a play event, for
/// externally-driven stat changes.
///
/// Params: `{ "userId": "user-123" }`
///
/// Response: `{ "unlocked": [ … ] }` (empty when nothing new).
pub async fn check(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;

    let unlocked = ctx.engine.check_achievements(user_id).await?;
    Ok(json!({ "unlocked": unlocked }))
}
