//! Scripted gateway and fixtures shared by the use case tests.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use async_trait::async_trait;
use council_domain::{
    ContentBlock, Director, DirectorPersonality, LlmResponse, PromptTemplate, RiskLevel,
    StopReason, ToolDefinition, ToolError, ToolResultMessage, UiTool,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Key used for the synthesis pass session
pub const SYNTHESIS: &str = "synthesis";

/// A scripted response for the mock session
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Plain text response
    Text(String),
    /// Structured response (tool use)
    Response(LlmResponse),
    /// Return an error
    Error(String),
    /// Sleep, then answer
    Delayed(Duration, Box<ScriptedResponse>),
}

impl ScriptedResponse {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedResponse::Text(text.into())
    }

    pub fn delayed(self, delay: Duration) -> Self {
        ScriptedResponse::Delayed(delay, Box::new(self))
    }
}

/// Mock session that returns scripted responses in order
pub struct ScriptedSession {
    key: String,
    responses: Mutex<VecDeque<ScriptedResponse>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedSession {
    async fn next_response(&self, content: &str) -> Result<LlmResponse, GatewayError> {
        self.sent
            .lock()
            .unwrap()
            .push((self.key.clone(), content.to_string()));
        let mut next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedResponse::Text("(no more responses)".to_string()));
        loop {
            match next {
                ScriptedResponse::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    next = *inner;
                }
                ScriptedResponse::Text(t) => return Ok(LlmResponse::from_text(t)),
                ScriptedResponse::Response(r) => return Ok(r),
                ScriptedResponse::Error(e) => return Err(GatewayError::RequestFailed(e)),
            }
        }
    }
}

#[async_trait]
impl LlmSession for ScriptedSession {
    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        Ok(self.next_response(content).await?.text_content())
    }

    async fn send_with_tools(
        &self,
        content: &str,
        _tools: &[Value],
    ) -> Result<LlmResponse, GatewayError> {
        self.next_response(content).await
    }

    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<LlmResponse, GatewayError> {
        let observed: Vec<&str> = results.iter().map(|r| r.output.as_str()).collect();
        self.next_response(&observed.join("\n")).await
    }
}

/// Mock gateway handing out one scripted session per `create_session`.
///
/// Scripts are keyed by director name (taken from the system prompt) and
/// consumed in order: the first session for "Director a" gets the first
/// script registered for it, and so on.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Vec<ScriptedResponse>>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, key: &str, responses: Vec<ScriptedResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(responses);
        self
    }

    /// Every message sent, as (session key, content)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn session_key(system_prompt: &str) -> String {
        if system_prompt == PromptTemplate::synthesis_system() {
            return SYNTHESIS.to_string();
        }
        system_prompt
            .split("Your name is ")
            .nth(1)
            .and_then(|rest| rest.split(" and you are").next())
            .unwrap_or("unknown")
            .to_string()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn create_session(
        &self,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let key = Self::session_key(system_prompt);
        let responses = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default();
        Ok(Box::new(ScriptedSession {
            key,
            responses: Mutex::new(responses.into()),
            sent: Arc::clone(&self.sent),
        }))
    }
}

pub fn director(id: &str) -> Director {
    Director {
        id: id.to_string(),
        name: format!("Director {}", id),
        version: "1.0.0".to_string(),
        author: "tests".to_string(),
        description: "video editing specialist".to_string(),
        tags: vec![],
        personality: DirectorPersonality {
            system_prompt: "You review video projects.".to_string(),
            analysis_focus: vec!["pacing".to_string()],
            critique_style: "constructive".to_string(),
            expertise_areas: vec!["editing".to_string()],
        },
        settings: serde_json::Map::new(),
    }
}

pub fn tool_use(id: &str, name: &str, input: Value) -> ScriptedResponse {
    ScriptedResponse::Response(LlmResponse {
        content: vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: Some(StopReason::ToolUse),
        model: None,
    })
}

/// A final report with `(type, description, confidence)` steps.
pub fn report(summary: &str, confidence: f64, steps: &[(&str, &str, f64)]) -> ScriptedResponse {
    let steps: Vec<Value> = steps
        .iter()
        .map(|(kind, description, confidence)| {
            json!({"type": kind, "description": description, "confidence": confidence})
        })
        .collect();
    let body = json!({"summary": summary, "confidence": confidence, "steps": steps});
    ScriptedResponse::Text(format!("Here is my analysis.\n```report\n{}\n```", body))
}

pub fn debate(message_type: &str, content: &str) -> ScriptedResponse {
    let body = json!({"message_type": message_type, "content": content});
    ScriptedResponse::Text(format!("```debate\n{}\n```", body))
}

/// Tool with a fixed payload and an optional delay
pub struct StaticTool {
    pub name: &'static str,
    pub payload: Value,
    pub delay: Duration,
}

impl StaticTool {
    pub fn new(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl UiTool for StaticTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name, "fixed payload", RiskLevel::Low)
    }

    fn invoke(&self, _args: &Value) -> Result<Value, ToolError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.payload.clone())
    }
}

/// Bridge with its executor draining on a dedicated "UI" thread.
///
/// The thread exits once every bridge clone is dropped.
pub fn spawn_bridge(
    registry: council_domain::ToolRegistry,
    config: crate::config::BridgeConfig,
) -> (crate::bridge::MainThreadBridge, std::thread::JoinHandle<()>) {
    let (bridge, executor) = crate::bridge::MainThreadBridge::channel(Arc::new(registry), config);
    let ui = std::thread::spawn(move || executor.run());
    (bridge, ui)
}

/// Tool that records how many bodies run at the same time.
#[derive(Clone, Default)]
pub struct CountingTool {
    pub active: Arc<std::sync::atomic::AtomicUsize>,
    pub max_active: Arc<std::sync::atomic::AtomicUsize>,
    pub calls: Arc<std::sync::atomic::AtomicUsize>,
}

impl CountingTool {
    pub fn max_active(&self) -> usize {
        self.max_active.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl UiTool for CountingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("count_calls", "counts concurrent executions", RiskLevel::Low)
    }

    fn invoke(&self, _args: &Value) -> Result<Value, ToolError> {
        use std::sync::atomic::Ordering;
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(3));
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"ok": true}))
    }
}

/// In-memory plan store, optionally failing every save.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<council_domain::PlanRecord>>,
    pub fail: bool,
}

impl crate::ports::plan_store::PlanStore for MemoryStore {
    fn save(
        &self,
        record: &council_domain::PlanRecord,
    ) -> Result<(), crate::ports::plan_store::PersistenceError> {
        if self.fail {
            return Err(crate::ports::plan_store::PersistenceError::WriteError(
                "disk full".to_string(),
            ));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn list(
        &self,
    ) -> Result<Vec<council_domain::PlanSummary>, crate::ports::plan_store::PersistenceError> {
        Ok(self.records.lock().unwrap().iter().map(|r| r.summary()).collect())
    }

    fn load(
        &self,
        run_id: &str,
    ) -> Result<council_domain::PlanRecord, crate::ports::plan_store::PersistenceError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned()
            .ok_or_else(|| crate::ports::plan_store::PersistenceError::NotFound(run_id.to_string()))
    }
}
