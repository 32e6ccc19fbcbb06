// SPDX-License-Identifier: MIT
//! JSON-RPC 2.0 dispatch.
//!
//! Transport-agnostic: the host server (WebSocket, HTTP, a test harness)
//! reads a frame, hands the text to [`dispatch_text`], and writes the
//! returned string back. Sockets, auth, and connection lifecycle live in
//! the host, not here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::EngineError;
use crate::{achievements, challenges, progress, AppContext};

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

// ─── Error codes — must match LinguaError in the client's rpc.dart ──────────
//
// notFound      = -32001  (challenge/definition missing for the given key)
// invalidState  = -32002  (claim guard, challenge not scheduled today)
// validation    = -32003  (inconsistent counts, malformed event)
// configuration = -32004  (catalog/schedule misconfiguration)

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
const NOT_FOUND: i32 = -32001;
const INVALID_STATE: i32 = -32002;
const VALIDATION_FAILED: i32 = -32003;
const CONFIGURATION_ERROR: i32 = -32004;

/// Parse one JSON-RPC frame, dispatch it, and serialise the response.
pub async fn dispatch_text(text: &str, ctx: &AppContext) -> String {
    let req: RpcRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(_) => {
            return error_response(Value::Null, PARSE_ERROR, "Parse error");
        }
    };

    if req.jsonrpc != "2.0" {
        return error_response(
            req.id.unwrap_or(Value::Null),
            INVALID_REQUEST,
            "Invalid Request",
        );
    }

    let id = req.id.unwrap_or(Value::Null);
    let params = req.params.unwrap_or(Value::Null);

    debug!(method = %req.method, "rpc dispatch");

    match dispatch(&req.method, params, ctx).await {
        Ok(value) => {
            let resp = RpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&resp).unwrap_or_default()
        }
        Err(e) => {
            let (code, msg) = classify_error(&e);
            error_response(id, code, &msg)
        }
    }
}

async fn dispatch(method: &str, params: Value, ctx: &AppContext) -> anyhow::Result<Value> {
    match method {
        "progress.recordGame" => progress::handlers::record_game(params, ctx).await,
        "progress.get" => progress::handlers::get(params, ctx).await,
        "progress.recentGames" => progress::handlers::recent_games(params, ctx).await,
        "progress.completeStage" => progress::handlers::complete_stage(params, ctx).await,
        "achievements.list" => achievements::handlers::list(params, ctx).await,
        "achievements.check" => achievements::handlers::check(params, ctx).await,
        "challenge.get" => challenges::handlers::get(params, ctx).await,
        "challenge.updateProgress" => challenges::handlers::update_progress(params, ctx).await,
        "challenge.claimRewards" => challenges::handlers::claim_rewards(params, ctx).await,
        "challenge.streak" => challenges::handlers::streak(params, ctx).await,
        "challenge.schedule" => challenges::handlers::schedule(params, ctx).await,
        _ => Err(anyhow::anyhow!("METHOD_NOT_FOUND:{}", method)),
    }
}

fn classify_error(e: &anyhow::Error) -> (i32, String) {
    if let Some(engine_error) = e.downcast_ref::<EngineError>() {
        let code = match engine_error {
            EngineError::NotFound(_) => NOT_FOUND,
            EngineError::InvalidState(_) => INVALID_STATE,
            EngineError::Validation(_) => VALIDATION_FAILED,
            EngineError::Configuration(_) => CONFIGURATION_ERROR,
        };
        return (code, engine_error.to_string());
    }

    let msg = e.to_string();
    if msg.starts_with("METHOD_NOT_FOUND:") {
        return (METHOD_NOT_FOUND, "Method not found".to_string());
    }
    if msg.ends_with(" required") || msg.contains("missing field") || msg.contains("invalid type") {
        return (INVALID_PARAMS, format!("Invalid params: {msg}"));
    }
    error!(err = %e, "internal error");
    (INTERNAL_ERROR, "Internal error".to_string())
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    let resp = RpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&resp).unwrap_or_default()
}
