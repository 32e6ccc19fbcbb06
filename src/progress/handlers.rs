// SPDX-License-Identifier: MIT
//! Progress RPC handlers.
//!
//! Dispatch entries (see `rpc::dispatch`):
//!
//! ```text
//! "progress.recordGame"    => progress::handlers::record_game(params, ctx).await,
//! "progress.get"           => progress::handlers::get(params, ctx).await,
//! "progress.recentGames"   => progress::handlers::recent_games(params, ctx).await,
//! "progress.completeStage" => progress::handlers::complete_stage(params, ctx).await,
//! ```

use anyhow::Result;
use serde_json::{json, Value};

use super::engine::StageCompletionEvent;
use super::model::PlayedGameEvent;
use crate::error::EngineError;
use crate::observability::LatencyTracker;
use crate::AppContext;

/// `progress.recordGame` — record one finished game.
///
/// Params:
/// ```json
/// {
///   "userId":  "user-123",
///   "eventId": "client-uuid",          // optional idempotency key
///   "game": {
///     "gameType": "quiz", "name": "Animals",
///     "levelName": "A1", "stageName": "3",
///     "score": 80, "maxScore": 100, "timeSpentSeconds": 75,
///     "correctAnswers": 8, "totalQuestions": 10
///   }
/// }
/// ```
///
/// Response:
/// ```json
/// { "xpEarned": 80, "newLevel": 1, "levelUp": false, "streak": 3, "unlocked": [ … ] }
/// ```
pub async fn record_game(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;
    let event_id = params.get("eventId").and_then(|v| v.as_str());
    let game = params
        .get("game")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("game required"))?;
    let event: PlayedGameEvent = serde_json::from_value(game)
        .map_err(|e| EngineError::Validation(format!("invalid game event: {e}")))?;

    let tracker = LatencyTracker::start("progress.recordGame");
    let report = ctx
        .engine
        .record_played_game(user_id, event, event_id)
        .await?;
    tracker.finish();

    Ok(serde_json::to_value(report)?)
}

/// `progress.get` — the user's full snapshot, lazily created.
///
/// Params: `{ "userId": "user-123" }`
pub async fn get(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;

    let snapshot = ctx.engine.get_progress(user_id).await?;
    Ok(serde_json::to_value(snapshot)?)
}

/// `progress.recentGames` — the last N games, newest first.
///
/// Params:
/// ```json
/// { "userId": "user-123", "limit": 10 }
/// ```
/// `limit` defaults to the configured `recent_games_limit`.
pub async fn recent_games(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .unwrap_or(ctx.config.recent_games_limit);

    let games = ctx.engine.recent_games(user_id, limit).await?;
    Ok(json!({ "games": games }))
}

/// `progress.completeStage` — record a completed lesson stage.
///
/// Params:
/// ```json
/// {
///   "userId": "user-123",
///   "stage": {
///     "levelName": "A1", "levelType": "beginner",
///     "stageName": "Greetings", "stageNumber": 3,
///     "score": 90, "maxScore": 100, "timeSpentSeconds": 140,
///     "totalStages": 8,
///     "category": { "name": "basics", "categoryType": "vocabulary", "totalLessons": 12 }
///   }
/// }
/// ```
pub async fn complete_stage(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("userId required"))?;
    let stage = params
        .get("stage")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("stage required"))?;
    let event: StageCompletionEvent = serde_json::from_value(stage)
        .map_err(|e| EngineError::Validation(format!("invalid stage event: {e}")))?;

    let tracker = LatencyTracker::start("progress.completeStage");
    let report = ctx.engine.complete_stage(user_id, event).await?;
    tracker.finish();

    Ok(serde_json::to_value(report)?)
}
