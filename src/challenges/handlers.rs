// SPDX-License-Identifier: MIT
//! Daily challenge RPC handlers.
//!
//! Dispatch entries (see `rpc::dispatch`):
//!
//! ```text
//! "challenge.get"            => challenges::handlers::get(params, ctx).await,
//! "challenge.updateProgress" => challenges::handlers::update_progress(params, ctx).await,
//! "challenge.claimRewards"   => challenges::handlers::claim_rewards(params, ctx).await,
//! "challenge.streak"         => challenges::handlers::streak(params, ctx).await,
//! "challenge.schedule"       => challenges::handlers::schedule(params, ctx).await,
//! ```

use anyhow::Result;
use serde_json::{json, Value};

use super::model::ChallengeDef;
use crate::error::EngineError;
use crate::AppContext;

fn instance_json(instance: &super::model::ChallengeInstance) -> Result<Value> {
    let mut value = serde_json::to_value(instance)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("state".to_string(), json!(instance.state()));
    }
    Ok(value)
}

/// `challenge.get` — today's challenge instance for the user, lazily
/// created against the day's scheduled definition.
///
/// Params: `{ "userId": "user-123" }`
pub async fn get(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;

    let instance = ctx.challenges.today_instance(user_id).await?;
    instance_json(&instance)
}

/// `challenge.updateProgress` — set the user's absolute progress on
/// today's challenge.
///
/// Params:
/// ```json
/// { "userId": "user-123", "challengeId": "daily-words",
///   "progress": 5, "metadata": { "words": ["cat", "dog"] } }
/// ```
pub async fn update_progress(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;
    let challenge_id = params
        .get("challengeId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("challengeId required"))?;
    let progress = params
        .get("progress")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow::anyhow!("progress required"))?;
    let metadata = params.get("metadata").cloned();

    let instance = ctx
        .challenges
        .update_progress(user_id, challenge_id, progress, metadata)
        .await?;
    instance_json(&instance)
}

/// `challenge.claimRewards` — claim a completed challenge's rewards.
/// Rejected with `invalid state` when not completed or already claimed.
///
/// Params: `{ "userId": "user-123", "challengeId": "daily-words" }`
pub async fn claim_rewards(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;
    let challenge_id = params
        .get("challengeId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("challengeId required"))?;

    let instance = ctx.challenges.claim_rewards(user_id, challenge_id).await?;
    instance_json(&instance)
}

/// `challenge.streak` — consecutive days ending today with a completed
/// challenge.
///
/// Params: `{ "userId": "user-123" }`
/// Response: `{ "streak": 4 }`
pub async fn streak(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;

    let streak = ctx.challenges.challenge_streak(user_id).await?;
    Ok(json!({ "streak": streak }))
}

/// `challenge.schedule` — upsert the day's challenge definition (the
/// content feed's write path).
///
/// Params:
/// ```json
/// { "challenge": { "challengeId": "daily-words", "challengeDate": "2026-03-10",
///                  "title": "Learn 5 words", "targetValue": 5,
///                  "xpBonus": 100, "streakBonus": 0 } }
/// ```
pub async fn schedule(params: Value, ctx: &AppContext) -> Result<Value> {
    let challenge = params
        .get("challenge")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("challenge required"))?;
    let def: ChallengeDef = serde_json::from_value(challenge)
        .map_err(|e| EngineError::Validation(format!("invalid challenge definition: {e}")))?;

    let def = ctx.challenges.schedule(def).await?;
    Ok(serde_json::to_value(def)?)
}
