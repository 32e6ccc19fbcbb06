// SPDX-License-Identifier: MIT
//! linguad — the Lingua progress & achievement engine.
//!
//! Ingests raw play events (a finished game, a completed lesson stage, a
//! daily-challenge tick) and derives the user's durable state: XP, level,
//! streak continuity, per-category/per-level completion, and newly unlocked
//! achievements. The host transport calls [`rpc::dispatch_text`] (or the
//! typed handlers directly); persistence is a single SQLite file.

pub mod achievements;
pub mod challenges;
pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod progress;
pub mod rpc;
pub mod storage;

use std::sync::Arc;

use achievements::model::AchievementDefinition;
use challenges::machine::ChallengeEngine;
use clock::Clock;
use config::EngineConfig;
use progress::engine::ProgressEngine;
use storage::Storage;

/// Shared application state passed to every RPC handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<EngineConfig>,
    pub storage: Arc<Storage>,
    pub engine: Arc<ProgressEngine>,
    pub challenges: Arc<ChallengeEngine>,
}

impl AppContext {
    /// Wire the engine together over an opened storage.
    ///
    /// The achievement catalog is handed in explicitly — the engine never
    /// fetches it itself, which keeps the unlock pass pure and testable
    /// against any catalog.
    pub fn new(
        config: Arc<EngineConfig>,
        storage: Arc<Storage>,
        catalog: Vec<AchievementDefinition>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let engine = Arc::new(ProgressEngine::new(
            storage.pool(),
            catalog,
            clock.clone(),
            config.utc_offset_minutes,
        ));
        let challenges = Arc::new(ChallengeEngine::new(
            storage.pool(),
            engine.clone(),
            clock,
            config.utc_offset_minutes,
        ));
        Self {
            config,
            storage,
            engine,
            challenges,
        }
    }
}
