// SPDX-License-Identifier: MIT
//! Typed engine errors.
//!
//! Every fallible engine operation surfaces one of these variants through
//! `anyhow`; the RPC layer downcasts and maps them to stable error codes.
//! Nothing here is fatal to the process — the worst outcome of a rule-engine
//! bug is a missed achievement, which `achievements.check` re-derives.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested challenge instance or definition does not exist.
    ///
    /// Progress snapshot reads never produce this — a missing snapshot is
    /// created lazily with zeroed counters.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not valid in the entity's current state, e.g.
    /// claiming rewards on a challenge that is not completed, or updating
    /// a challenge that is not scheduled for today.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The input failed validation (inconsistent counts, malformed event).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The achievement catalog or challenge schedule is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),
}
