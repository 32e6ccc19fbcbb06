// SPDX-License-Identifier: MIT
//! Engine configuration (`config.toml`).
//!
//! Everything has a serde default so an absent or partial file still yields
//! a working engine. The host process decides where the file lives.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LOG: &str = "info";
const DEFAULT_SLOW_QUERY_MS: u64 = 250;
const DEFAULT_RECENT_GAMES_LIMIT: usize = 20;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,

    /// Log filter, e.g. `"info"` or `"linguad=debug"`.
    pub log: String,

    /// Write logs to this file path (rotated daily). None = stderr only.
    pub log_file: Option<PathBuf>,

    /// Minutes added to UTC before truncating a timestamp to a calendar day.
    /// This is the app's notion of "the user's day", injected explicitly so
    /// streak computation never depends on the host's local timezone.
    pub utc_offset_minutes: i32,

    /// Queries slower than this are logged at WARN. 0 disables.
    pub slow_query_ms: u64,

    /// Default page size for `progress.recentGames`.
    pub recent_games_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log: DEFAULT_LOG.to_string(),
            log_file: None,
            utc_offset_minutes: 0,
            slow_query_ms: DEFAULT_SLOW_QUERY_MS,
            recent_games_limit: DEFAULT_RECENT_GAMES_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }
}
