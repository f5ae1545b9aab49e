//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use council_domain::{LlmResponse, ToolResultMessage};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Create a new conversation with a system prompt
    async fn create_session(&self, system_prompt: &str) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// An active conversation. Implementations keep the history.
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Send a message and get a plain text response
    async fn send(&self, content: &str) -> Result<String, GatewayError>;

    /// Send a message offering tools (JSON schemas) to the model.
    ///
    /// Default implementation ignores the tools and wraps `send()`.
    async fn send_with_tools(
        &self,
        content: &str,
        _tools: &[serde_json::Value],
    ) -> Result<LlmResponse, GatewayError> {
        let text = self.send(content).await?;
        Ok(LlmResponse::from_text(text))
    }

    /// Return tool results for the previous `ToolUse` turn.
    async fn send_tool_results(
        &self,
        _results: &[ToolResultMessage],
    ) -> Result<LlmResponse, GatewayError> {
        Err(GatewayError::Unsupported(
            "tool results are not supported by this session".to_string(),
        ))
    }
}
