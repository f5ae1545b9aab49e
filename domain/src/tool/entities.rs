//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Risk level of a tool operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Read-only inspection of the project (analysis tools)
    Low,
    /// Mutates the project timeline
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::High => "high",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, RiskLevel::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Definition of a tool that can be offered to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "analyze_pacing")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Risk level of this tool
    pub risk_level: RiskLevel,
    /// Parameter specifications
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// JSON schema type hint ("string", "number", "integer", "boolean")
    pub param_type: String,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            risk_level,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render this definition in the JSON schema shape used by native tool-use APIs.
    ///
    /// ```
    /// use council_domain::tool::{RiskLevel, ToolDefinition, ToolParameter};
    ///
    /// let def = ToolDefinition::new("list_clips", "List clips", RiskLevel::Low)
    ///     .with_parameter(ToolParameter::new("track", "Track filter", false).with_type("integer"));
    /// let schema = def.to_json_schema();
    /// assert_eq!(schema["name"], "list_clips");
    /// assert_eq!(schema["input_schema"]["properties"]["track"]["type"], "integer");
    /// ```
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }
}

/// A request from an agent to run one tool.
///
/// `arguments` is kept as an opaque JSON object; its schema belongs to the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool (a JSON object)
    pub arguments: Value,
    /// Provider-assigned id used to correlate the result with the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Value::Object(Map::new()),
            native_id: None,
        }
    }

    /// Build a call from a native tool-use block.
    pub fn from_native(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        let arguments = match input {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Self {
            tool_name: name.into(),
            arguments,
            native_id: Some(id.into()),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.arguments {
            map.insert(key.into(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    /// Argument payload serialized for logs and the plan graph.
    pub fn arguments_json(&self) -> String {
        serde_json::to_string(&self.arguments).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level() {
        assert!(!RiskLevel::Low.is_mutating());
        assert!(RiskLevel::High.is_mutating());
        assert_eq!(RiskLevel::High.to_string(), "high");
    }

    #[test]
    fn test_tool_definition_schema_required_list() {
        let def = ToolDefinition::new("add_transition", "Add a transition", RiskLevel::High)
            .with_parameter(ToolParameter::new("clip1_id", "First clip", true))
            .with_parameter(
                ToolParameter::new("duration", "Seconds", false).with_type("number"),
            );

        let schema = def.to_json_schema();
        assert_eq!(schema["input_schema"]["required"], serde_json::json!(["clip1_id"]));
        assert_eq!(
            schema["input_schema"]["properties"]["duration"]["type"],
            "number"
        );
    }

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall::new("split_clip")
            .with_arg("clip_id", "clip_001")
            .with_arg("split_time", 5.5);

        assert_eq!(call.get_string("clip_id"), Some("clip_001"));
        assert_eq!(call.get_f64("split_time"), Some(5.5));
        assert!(call.get("missing").is_none());
        assert!(call.arguments_json().contains("clip_001"));
    }

    #[test]
    fn test_from_native_null_input_becomes_empty_object() {
        let call = ToolCall::from_native("toolu_1", "list_clips", Value::Null);
        assert_eq!(call.arguments, serde_json::json!({}));
        assert_eq!(call.native_id.as_deref(), Some("toolu_1"));
    }
}
