//! Run events shared by the plan graph, progress feeds and event logs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::orchestration::RunPhase;
use crate::plan::{DebateMessage, ReportStatus};
use crate::tool::ToolError;

/// Run-scoped handle of one concurrently running agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchKey(pub String);

impl BranchKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates `StepStarted` with its completion. Unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(pub u64);

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        prompt: String,
    },
    PhaseChanged {
        phase: RunPhase,
    },
    BranchStarted {
        branch: BranchKey,
        director_id: String,
        label: String,
        description: String,
    },
    BranchEnded {
        branch: BranchKey,
        status: ReportStatus,
        note: String,
    },
    StepStarted {
        invocation: InvocationId,
        /// `None` when the call came from outside any agent branch
        branch: Option<BranchKey>,
        tool_name: String,
        arguments: Value,
    },
    StepCompleted {
        invocation: InvocationId,
        result: String,
    },
    StepFailed {
        invocation: InvocationId,
        error: ToolError,
    },
    Debate {
        message: DebateMessage,
    },
}

impl RunEvent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::RunStarted { .. } => "run_started",
            RunEvent::PhaseChanged { .. } => "phase_changed",
            RunEvent::BranchStarted { .. } => "branch_started",
            RunEvent::BranchEnded { .. } => "branch_ended",
            RunEvent::StepStarted { .. } => "step_started",
            RunEvent::StepCompleted { .. } => "step_completed",
            RunEvent::StepFailed { .. } => "step_failed",
            RunEvent::Debate { .. } => "debate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RunEvent::StepStarted {
            invocation: InvocationId(3),
            branch: Some(BranchKey::new("pacing")),
            tool_name: "list_clips".to_string(),
            arguments: serde_json::json!({}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "step_started");
        assert_eq!(json["invocation"], 3);
        assert_eq!(json["branch"], "pacing");
        assert_eq!(event.kind(), "step_started");
    }
}
