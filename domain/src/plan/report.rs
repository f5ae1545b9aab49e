//! Per-agent analysis reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::step::{Step, clamp_confidence};
use crate::tool::{ToolError, ToolOutput};

/// Why an agent produced no usable report.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AgentFailure {
    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("iteration budget of {0} exhausted without a report")]
    BudgetExhausted(usize),

    #[error("degenerate report: {0}")]
    Degenerate(String),

    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

/// Terminal state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Structured report with at least one step
    Complete,
    /// Summary only; valid but contributes no steps
    Degenerate,
    /// Excluded from synthesis
    Failed,
}

/// Outcome of one recorded tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success { payload: Value, duration_ms: u64 },
    Failure { error: ToolError },
}

/// One entry of an agent's tool transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: Value,
    pub outcome: InvocationOutcome,
}

impl ToolInvocation {
    pub fn from_result(
        tool_name: impl Into<String>,
        arguments: Value,
        result: &Result<ToolOutput, ToolError>,
    ) -> Self {
        let outcome = match result {
            Ok(output) => InvocationOutcome::Success {
                payload: output.payload.clone(),
                duration_ms: output.duration_ms,
            },
            Err(error) => InvocationOutcome::Failure {
                error: error.clone(),
            },
        };
        Self {
            tool_name: tool_name.into(),
            arguments,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Success { .. })
    }
}

/// What one agent produced in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub director_id: String,
    pub director_name: String,
    pub status: ReportStatus,
    pub steps: Vec<Step>,
    pub summary: String,
    pub confidence: f64,
    pub transcript: Vec<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<AgentFailure>,
}

impl AnalysisReport {
    pub fn complete(
        director_id: impl Into<String>,
        director_name: impl Into<String>,
        summary: impl Into<String>,
        confidence: f64,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            director_id: director_id.into(),
            director_name: director_name.into(),
            status: ReportStatus::Complete,
            steps,
            summary: summary.into(),
            confidence: clamp_confidence(confidence),
            transcript: Vec::new(),
            failure: None,
        }
    }

    /// Summary-only report. The reason is kept for display.
    pub fn degenerate(
        director_id: impl Into<String>,
        director_name: impl Into<String>,
        summary: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            director_id: director_id.into(),
            director_name: director_name.into(),
            status: ReportStatus::Degenerate,
            steps: Vec::new(),
            summary: summary.into(),
            confidence: 0.0,
            transcript: Vec::new(),
            failure: Some(AgentFailure::Degenerate(reason.into())),
        }
    }

    pub fn failed(
        director_id: impl Into<String>,
        director_name: impl Into<String>,
        failure: AgentFailure,
    ) -> Self {
        Self {
            director_id: director_id.into(),
            director_name: director_name.into(),
            status: ReportStatus::Failed,
            steps: Vec::new(),
            summary: String::new(),
            confidence: 0.0,
            transcript: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn with_transcript(mut self, transcript: Vec<ToolInvocation>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Complete or degenerate reports take part in debate and synthesis.
    pub fn is_surviving(&self) -> bool {
        self.status != ReportStatus::Failed
    }

    pub fn used_tools(&self) -> bool {
        !self.transcript.is_empty()
    }
}
