//! Chat completions gateway
//!
//! One shared `reqwest::Client`; every `create_session` starts a fresh
//! history with the given system prompt.

use super::session::OpenAiSession;
use crate::config::FileProviderConfig;
use async_trait::async_trait;
use council_application::{GatewayError, LlmGateway, LlmSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Connection settings resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl OpenAiSettings {
    pub fn from_config(config: &FileProviderConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "No API key configured, requests are sent unauthenticated"
            );
        }
        Self {
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Everything a session needs to make calls.
pub(super) struct Endpoint {
    pub client: reqwest::Client,
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

pub struct OpenAiGateway {
    endpoint: Arc<Endpoint>,
}

impl OpenAiGateway {
    pub fn new(settings: OpenAiSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let url = settings.completions_url();
        info!(url = %url, model = %settings.model, "Chat completions gateway ready");

        Ok(Self {
            endpoint: Arc::new(Endpoint {
                client,
                url,
                api_key: settings.api_key,
                model: settings.model,
                max_tokens: settings.max_tokens,
            }),
        })
    }

    pub fn model(&self) -> &str {
        &self.endpoint.model
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn create_session(&self, system_prompt: &str) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenAiSession::new(
            self.endpoint.clone(),
            system_prompt,
        )))
    }
}
