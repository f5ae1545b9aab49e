//! Tool domain traits
//!
//! Pure validation of a [`ToolCall`] against its [`ToolDefinition`], run by the
//! registry before a tool body is invoked.

use super::entities::{ToolCall, ToolDefinition};

/// Validator for tool calls
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Arguments must be a JSON object, every required parameter must be present
/// and no unknown parameter may appear.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String> {
        let Some(arguments) = call.arguments.as_object() else {
            return Err(format!(
                "Arguments for tool '{}' must be a JSON object",
                definition.name
            ));
        };

        for param in &definition.parameters {
            if param.required && !arguments.contains_key(&param.name) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                ));
            }
        }

        for arg_name in arguments.keys() {
            if !definition.parameters.iter().any(|p| &p.name == arg_name) {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, definition.name
                ));
            }
        }

        Ok(())
    }
}
