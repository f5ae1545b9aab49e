//! Wire types of the chat completions API and their domain conversions

use council_application::GatewayError;
use council_domain::{ContentBlock, LlmResponse, StopReason, ToolResultMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Request ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [Value],
}

fn no_tools(tools: &&[Value]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    /// Null for assistant turns that only call tools
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

// ─── Response ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

// ─── Domain → wire ───────────────────────────────────────────────

/// Tool schema from the registry (`name`, `description`, `input_schema`)
/// as a function tool.
pub fn convert_tool_schema(schema: &Value) -> Option<Value> {
    let name = schema.get("name")?.as_str()?;
    let description = schema
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let parameters = schema
        .get("input_schema")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}}));

    Some(serde_json::json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    }))
}

pub fn convert_tool_result(result: &ToolResultMessage) -> ChatMessage {
    ChatMessage {
        role: "tool".to_string(),
        content: Some(result.output.clone()),
        tool_calls: Vec::new(),
        tool_call_id: Some(result.tool_use_id.clone()),
    }
}

// ─── Wire → domain ───────────────────────────────────────────────

pub fn convert_finish_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "length" => StopReason::MaxTokens,
        other => StopReason::Other(other.to_string()),
    }
}

/// Arguments the model produced; unparseable text is kept as a string so the
/// tool can reject it as invalid arguments.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// First choice of a response as a domain turn plus the assistant message to
/// keep in history.
pub fn convert_response(response: ChatResponse) -> Result<(LlmResponse, ChatMessage), GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::RequestFailed("response had no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.as_deref()
        && !text.is_empty()
    {
        content.push(ContentBlock::Text(text.to_string()));
    }
    for call in &choice.message.tool_calls {
        content.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input: parse_arguments(&call.function.arguments),
        });
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some(reason) => Some(convert_finish_reason(reason)),
        None if !choice.message.tool_calls.is_empty() => Some(StopReason::ToolUse),
        None => Some(StopReason::EndTurn),
    };

    let mut history = choice.message;
    history.role = "assistant".to_string();

    Ok((
        LlmResponse {
            content,
            stop_reason,
            model: response.model,
        },
        history,
    ))
}
