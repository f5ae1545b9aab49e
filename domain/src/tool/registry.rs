//! Tool registry
//!
//! A read-only lookup table from tool name to callable body. It is built once
//! at startup and then shared; concurrent reads need no synchronization.
//!
//! ```
//! use council_domain::tool::{RiskLevel, ToolCall, ToolDefinition, ToolError, ToolRegistry, UiTool};
//! use serde_json::{json, Value};
//!
//! struct Echo;
//!
//! impl UiTool for Echo {
//!     fn definition(&self) -> ToolDefinition {
//!         ToolDefinition::new("echo", "Echo arguments", RiskLevel::Low)
//!     }
//!     fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
//!         Ok(args.clone())
//!     }
//! }
//!
//! let registry = ToolRegistry::new().register(Echo);
//! let output = registry.invoke(&ToolCall::new("echo")).unwrap();
//! assert_eq!(output.payload, json!({}));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::entities::{ToolCall, ToolDefinition};
use super::traits::{DefaultToolValidator, ToolValidator};
use super::value_objects::{ToolError, ToolOutput};

/// A tool body that must run on the UI-owning thread.
///
/// Implementations may touch editor state freely: the bridge guarantees that
/// at most one tool body executes at any instant.
pub trait UiTool: Send + Sync {
    /// Schema description offered to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with an opaque argument payload
    fn invoke(&self, args: &Value) -> Result<Value, ToolError>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    body: Arc<dyn UiTool>,
}

/// Tool name → callable body plus schema.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, used for deterministic listings
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. The first registration of a name wins.
    pub fn register<T: UiTool + 'static>(self, tool: T) -> Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(mut self, tool: Arc<dyn UiTool>) -> Self {
        let definition = tool.definition();
        if self.tools.contains_key(&definition.name) {
            tracing::warn!(tool = %definition.name, "Tool already registered, ignoring duplicate");
            return self;
        }
        tracing::debug!(tool = %definition.name, "Registered tool");
        self.order.push(definition.name.clone());
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                body: tool,
            },
        );
        self
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(|t| &t.definition)
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON schemas for every tool, in registration order
    pub fn json_schemas(&self) -> Vec<Value> {
        self.definitions()
            .into_iter()
            .map(ToolDefinition::to_json_schema)
            .collect()
    }

    /// Validate and run a tool body on the current thread.
    pub fn invoke(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(&call.tool_name)
            .ok_or_else(|| ToolError::not_found(&call.tool_name))?;

        DefaultToolValidator
            .validate(call, &tool.definition)
            .map_err(ToolError::invalid_args)?;

        let started = Instant::now();
        let payload = tool.body.invoke(&call.arguments)?;
        Ok(ToolOutput::new(&call.tool_name, payload)
            .with_duration(started.elapsed().as_millis() as u64))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}
