//! Structured model turns for the tool-using analysis loop.
//!
//! ```text
//! send_with_tools() → LlmResponse ─┬─ tool_calls() non-empty → run tools → send_tool_results()
//!                                  └─ text only             → final report text
//! ```

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single block of content within a model turn.
///
/// # Examples
///
/// ```
/// use council_domain::session::response::ContentBlock;
///
/// let text = ContentBlock::Text("Looking at the timeline.".to_string());
/// assert!(text.as_text().is_some());
///
/// let tool = ContentBlock::ToolUse {
///     id: "call_1".to_string(),
///     name: "list_clips".to_string(),
///     input: serde_json::json!({"track": 1}),
/// };
/// assert!(tool.as_tool_use().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text(String),

    /// A tool request. `input` is the tool-owned argument payload.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
}

impl ContentBlock {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
        match self {
            ContentBlock::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    /// The model wants tools run and their results returned.
    ToolUse,
    MaxTokens,
    Other(String),
}

/// A structured model turn.
///
/// ```
/// use council_domain::session::response::{ContentBlock, LlmResponse, StopReason};
///
/// let response = LlmResponse {
///     content: vec![
///         ContentBlock::Text("Checking pacing first.".to_string()),
///         ContentBlock::ToolUse {
///             id: "call_1".to_string(),
///             name: "analyze_pacing".to_string(),
///             input: serde_json::json!({}),
///         },
///     ],
///     stop_reason: Some(StopReason::ToolUse),
///     model: None,
/// };
/// assert!(response.has_tool_calls());
/// assert_eq!(response.tool_calls()[0].native_id.as_deref(), Some("call_1"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    pub model: Option<String>,
}

impl LlmResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            stop_reason: Some(StopReason::EndTurn),
            model: None,
        }
    }

    /// Concatenate all `Text` blocks.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool requests in the order the model emitted them.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some(ToolCall::from_native(id, name, input.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

/// The outcome of one tool call, returned to the model as an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMessage {
    /// Id of the originating `ToolUse` block
    pub tool_use_id: String,
    pub tool_name: String,
    /// JSON text of the payload or error
    pub output: String,
    pub is_error: bool,
}

impl ToolResultMessage {
    pub fn success(tool_use_id: impl Into<String>, tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(tool_use_id: impl Into<String>, tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            is_error: true,
        }
    }
}
