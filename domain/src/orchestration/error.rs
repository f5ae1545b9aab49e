//! Orchestration failures

use thiserror::Error;

/// Why a run produced no plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    #[error("No directors selected")]
    NoDirectors,

    #[error("Unknown directors: {}", .0.join(", "))]
    UnknownDirectors(Vec<String>),

    #[error("No plan could be generated: every director failed ({})", .0.join("; "))]
    AllAgentsFailed(Vec<String>),

    #[error("Run canceled")]
    Canceled,

    #[error("Run deadline exceeded before any director finished")]
    DeadlineExceeded,

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The orchestration task itself died, e.g. by panicking.
    #[error("Orchestration aborted: {0}")]
    Aborted(String),
}

impl OrchestrationError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, OrchestrationError::Canceled)
    }
}
