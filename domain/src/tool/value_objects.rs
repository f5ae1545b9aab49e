//! Tool domain value objects: the two outcomes of a tool invocation.
//!
//! | Kind | Raised by | Agent reaction |
//! |------|-----------|----------------|
//! | `Timeout` | bridge, per-call deadline elapsed | observation, may try another tool |
//! | `ExecutionFailure` | tool body, or the UI thread is gone | observation |
//! | `InvalidArgs` | validator / tool body | observation, model can fix the call |
//! | `NotFound` | registry, unknown tool name | observation, model can correct |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Category of a tool failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    Timeout,
    ExecutionFailure,
    InvalidArgs,
    NotFound,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::ExecutionFailure => "execution_failure",
            ToolErrorKind::InvalidArgs => "invalid_args",
            ToolErrorKind::NotFound => "not_found",
        }
    }

    /// Whether the model can plausibly fix the call and retry
    pub fn is_correctable(&self) -> bool {
        matches!(self, ToolErrorKind::InvalidArgs | ToolErrorKind::NotFound)
    }
}

/// Error returned to the caller of a tool
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("[{}] {}", .kind.as_str(), .message)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(tool_name: &str, timeout_ms: u64) -> Self {
        Self::new(
            ToolErrorKind::Timeout,
            format!("Tool '{}' did not complete within {}ms", tool_name, timeout_ms),
        )
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailure, message)
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgs, message)
    }

    pub fn not_found(tool_name: &str) -> Self {
        Self::new(
            ToolErrorKind::NotFound,
            format!("Unknown tool: {}", tool_name),
        )
    }

    /// JSON form handed back to the model as an observation
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "error": {
                "kind": self.kind.as_str(),
                "message": self.message,
            }
        })
    }
}

/// Successful result of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_name: String,
    /// Opaque result payload owned by the tool
    pub payload: Value,
    /// Wall time of the tool body on the UI thread
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn new(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload,
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Compact JSON text of the payload
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::timeout("analyze_pacing", 250);
        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert_eq!(
            err.to_string(),
            "[timeout] Tool 'analyze_pacing' did not complete within 250ms"
        );
    }

    #[test]
    fn test_correctable_kinds() {
        assert!(ToolErrorKind::InvalidArgs.is_correctable());
        assert!(ToolErrorKind::NotFound.is_correctable());
        assert!(!ToolErrorKind::Timeout.is_correctable());
        assert!(!ToolErrorKind::ExecutionFailure.is_correctable());
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = ToolError::not_found("bogus").to_payload();
        assert_eq!(payload["error"]["kind"], "not_found");
        assert!(payload["error"]["message"].as_str().unwrap().contains("bogus"));
    }

    #[test]
    fn test_output_payload_text() {
        let out = ToolOutput::new("list_clips", serde_json::json!({"count": 2})).with_duration(3);
        assert_eq!(out.payload_text(), r#"{"count":2}"#);
        assert_eq!(out.duration_ms, 3);

        let text = ToolOutput::new("note", Value::String("plain".into()));
        assert_eq!(text.payload_text(), "plain");
    }
}
