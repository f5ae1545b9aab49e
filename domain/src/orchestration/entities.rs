//! Orchestration domain entities

use serde::{Deserialize, Serialize};

/// Phase of an orchestration run
///
/// ```text
/// Idle → Analyzing → Debating (optional) → Synthesizing → Done
///           │            │                     │
///           └────────────┴─────────────────────┴──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Analyzing,
    Debating,
    Synthesizing,
    Done,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Analyzing => "analyzing",
            RunPhase::Debating => "debating",
            RunPhase::Synthesizing => "synthesizing",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            RunPhase::Idle => "Idle",
            RunPhase::Analyzing => "Analysis",
            RunPhase::Debating => "Debate",
            RunPhase::Synthesizing => "Synthesis",
            RunPhase::Done => "Done",
            RunPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, Analyzing)
                | (Analyzing, Debating)
                | (Analyzing, Synthesizing)
                | (Debating, Synthesizing)
                | (Synthesizing, Done)
                | (Idle | Analyzing | Debating | Synthesizing, Failed)
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
