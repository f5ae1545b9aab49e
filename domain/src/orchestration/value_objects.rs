//! Orchestration value objects

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on debate rounds per run
pub const MAX_DEBATE_ROUNDS: u32 = 3;

/// Per-run options chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// 0 disables the debate phase
    pub debate_rounds: u32,
    /// Global run deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            debate_rounds: 1,
            timeout_ms: 300_000,
        }
    }
}

impl RunOptions {
    pub fn new(debate_rounds: u32, timeout_ms: u64) -> Self {
        Self {
            debate_rounds,
            timeout_ms,
        }
        .normalized()
    }

    /// Clamp debate rounds to [`MAX_DEBATE_ROUNDS`] and the timeout to at least 1ms.
    pub fn normalized(self) -> Self {
        Self {
            debate_rounds: self.debate_rounds.min(MAX_DEBATE_ROUNDS),
            timeout_ms: self.timeout_ms.max(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
