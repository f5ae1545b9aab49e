//! Chat completions session
//!
//! The API is stateless, so the session keeps the full message history and
//! replays it on every call.

use super::gateway::Endpoint;
use super::types::{self, ChatMessage, ChatRequest, ChatResponse};
use async_trait::async_trait;
use council_application::{GatewayError, LlmSession};
use council_domain::{LlmResponse, ToolResultMessage};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct OpenAiSession {
    endpoint: Arc<Endpoint>,
    /// System message first
    messages: Mutex<Vec<ChatMessage>>,
    /// Function tools, set by the first `send_with_tools`
    tools: Mutex<Vec<Value>>,
}

impl OpenAiSession {
    pub(super) fn new(endpoint: Arc<Endpoint>, system_prompt: &str) -> Self {
        let mut messages = Vec::new();
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        Self {
            endpoint,
            messages: Mutex::new(messages),
            tools: Mutex::new(Vec::new()),
        }
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatResponse, GatewayError> {
        let tools = self.tools.lock().await;
        let request = ChatRequest {
            model: &self.endpoint.model,
            max_tokens: self.endpoint.max_tokens,
            messages,
            tools: &tools,
        };

        debug!(
            model = %self.endpoint.model,
            messages = messages.len(),
            tools = tools.len(),
            "Calling chat completions"
        );

        let mut builder = self.endpoint.client.post(&self.endpoint.url).json(&request);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(convert_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid response body: {}", e)))
    }

    /// Append `new_messages`, call the API, and record the assistant turn.
    async fn exchange(&self, new_messages: Vec<ChatMessage>) -> Result<LlmResponse, GatewayError> {
        let mut messages = self.messages.lock().await;
        let rollback = messages.len();
        messages.extend(new_messages);

        let result = match self.complete(&messages).await {
            Ok(response) => types::convert_response(response),
            Err(e) => Err(e),
        };
        match result {
            Ok((turn, assistant)) => {
                messages.push(assistant);
                Ok(turn)
            }
            Err(e) => {
                // Keep the history replayable after a failed call
                messages.truncate(rollback);
                Err(e)
            }
        }
    }
}

fn convert_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let turn = self.exchange(vec![ChatMessage::user(content)]).await?;
        Ok(turn.text_content())
    }

    async fn send_with_tools(
        &self,
        content: &str,
        tools: &[Value],
    ) -> Result<LlmResponse, GatewayError> {
        let converted: Vec<Value> = tools.iter().filter_map(types::convert_tool_schema).collect();
        if !converted.is_empty() {
            *self.tools.lock().await = converted;
        }
        self.exchange(vec![ChatMessage::user(content)]).await
    }

    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<LlmResponse, GatewayError> {
        let messages = results.iter().map(types::convert_tool_result).collect();
        self.exchange(messages).await
    }
}
