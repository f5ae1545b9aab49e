//! Analysis agent
//!
//! Runs one director's bounded tool loop and turns the final answer into an
//! [`AnalysisReport`]. Also answers debate prompts for the orchestrator.

use crate::bridge::MainThreadBridge;
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use council_domain::core::string::preview;
use council_domain::plan::parsing::{is_clarifying_question, parse_debate_reply, parse_report};
use council_domain::prompt::PeerPosition;
use council_domain::{
    AgentFailure, AnalysisReport, AnalysisTask, Director, MessageType, PromptTemplate, Step,
    ToolInvocation, ToolResultMessage,
};
use council_domain::plan::DebateReply;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extra attempts granted when the model asks a question instead of working
const CLARIFICATION_RETRIES: usize = 1;

/// Characters of unstructured text kept as a summary or debate message
const FREE_TEXT_CHARS: usize = 2000;

enum LoopOutcome {
    /// Model answered without requesting tools
    Final { text: String, exhausted: bool },
    /// Model kept requesting tools after the budget was spent
    Exhausted,
}

/// Inputs for one debate turn
pub struct DebateTurn<'a> {
    pub round: u32,
    pub task: &'a AnalysisTask,
    pub own_steps: &'a [Step],
    pub peers: &'a [PeerPosition<'a>],
    /// Confidence given to revised steps that carry none
    pub default_confidence: f64,
}

/// One director's analysis loop.
///
/// The bridge passed in is already scoped to the agent's branch and the
/// run's event sink, so every tool call lands in the right graph branch.
pub struct AnalysisAgent<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    bridge: MainThreadBridge,
    iteration_budget: usize,
}

impl<G: LlmGateway + 'static> AnalysisAgent<G> {
    pub fn new(gateway: Arc<G>, bridge: MainThreadBridge, iteration_budget: usize) -> Self {
        Self {
            gateway,
            bridge,
            iteration_budget: iteration_budget.max(1),
        }
    }

    /// Analyze the project. Never fails: every outcome is a report.
    pub async fn analyze(&self, task: &AnalysisTask, director: &Director) -> AnalysisReport {
        let mut transcript = Vec::new();
        let report = self.analyze_inner(task, director, &mut transcript).await;
        info!(
            director = %director.id,
            status = ?report.status,
            steps = report.steps.len(),
            tool_calls = transcript.len(),
            "Analysis finished"
        );
        report.with_transcript(transcript)
    }

    async fn analyze_inner(
        &self,
        task: &AnalysisTask,
        director: &Director,
        transcript: &mut Vec<ToolInvocation>,
    ) -> AnalysisReport {
        let provider_failure = |e: GatewayError| {
            warn!(director = %director.id, "Provider error: {}", e);
            AnalysisReport::failed(
                &director.id,
                &director.name,
                AgentFailure::ProviderError(e.to_string()),
            )
        };

        for attempt in 0..=CLARIFICATION_RETRIES {
            let session = match self.gateway.create_session(&director.system_prompt()).await {
                Ok(session) => session,
                Err(e) => return provider_failure(e),
            };

            let mut prompt = PromptTemplate::analysis_task(task.content(), director);
            if attempt > 0 {
                prompt.push_str("\n\n");
                prompt.push_str(PromptTemplate::reinforced_instruction());
            }

            let calls_before = transcript.len();
            let outcome = match self.tool_loop(session.as_ref(), &prompt, transcript).await {
                Ok(outcome) => outcome,
                Err(e) => return provider_failure(e),
            };
            let used_tools = transcript.len() > calls_before;

            let (text, exhausted) = match outcome {
                LoopOutcome::Final { text, exhausted } => (text, exhausted),
                LoopOutcome::Exhausted => {
                    return AnalysisReport::failed(
                        &director.id,
                        &director.name,
                        AgentFailure::BudgetExhausted(self.iteration_budget),
                    );
                }
            };

            let parsed = parse_report(&text, &director.id, 0);
            match parsed {
                Some(report) if !report.steps.is_empty() => {
                    return AnalysisReport::complete(
                        &director.id,
                        &director.name,
                        report.summary,
                        report.confidence,
                        report.steps,
                    );
                }
                None if !used_tools && is_clarifying_question(&text) => {
                    if attempt < CLARIFICATION_RETRIES {
                        warn!(
                            director = %director.id,
                            "Agent asked a clarifying question, retrying with reinforced instruction"
                        );
                        continue;
                    }
                    return AnalysisReport::degenerate(
                        &director.id,
                        &director.name,
                        preview(text.trim(), FREE_TEXT_CHARS),
                        "asked a clarifying question instead of analyzing",
                    );
                }
                Some(report) => {
                    let summary = if report.summary.is_empty() {
                        preview(text.trim(), FREE_TEXT_CHARS)
                    } else {
                        report.summary
                    };
                    return AnalysisReport::degenerate(
                        &director.id,
                        &director.name,
                        summary,
                        "report proposed no steps",
                    );
                }
                None if exhausted => {
                    return AnalysisReport::failed(
                        &director.id,
                        &director.name,
                        AgentFailure::BudgetExhausted(self.iteration_budget),
                    );
                }
                None => {
                    debug!(director = %director.id, "Final answer had no report block");
                    return AnalysisReport::degenerate(
                        &director.id,
                        &director.name,
                        preview(text.trim(), FREE_TEXT_CHARS),
                        "final answer had no structured report",
                    );
                }
            }
        }

        // Unreachable in practice: the last attempt always returns.
        AnalysisReport::degenerate(
            &director.id,
            &director.name,
            "",
            "asked a clarifying question instead of analyzing",
        )
    }

    /// Offer tools until the model answers in text or the budget is spent.
    ///
    /// Tool errors are returned to the model as observations. Once the
    /// budget is spent, pending calls are answered with a request for the
    /// final report instead of being executed.
    async fn tool_loop(
        &self,
        session: &dyn LlmSession,
        prompt: &str,
        transcript: &mut Vec<ToolInvocation>,
    ) -> Result<LoopOutcome, GatewayError> {
        let schemas = self.bridge.tool_schemas();
        let mut response = session.send_with_tools(prompt, &schemas).await?;
        let mut rounds = 0;

        loop {
            let calls = response.tool_calls();
            if calls.is_empty() {
                return Ok(LoopOutcome::Final {
                    text: response.text_content(),
                    exhausted: false,
                });
            }

            if rounds >= self.iteration_budget {
                debug!(budget = self.iteration_budget, "Tool budget spent, asking for the report");
                let refusals: Vec<ToolResultMessage> = calls
                    .iter()
                    .map(|call| {
                        ToolResultMessage::error(
                            call.native_id.clone().unwrap_or_default(),
                            &call.tool_name,
                            PromptTemplate::final_report_request(),
                        )
                    })
                    .collect();
                let last = session.send_tool_results(&refusals).await?;
                if last.has_tool_calls() {
                    return Ok(LoopOutcome::Exhausted);
                }
                return Ok(LoopOutcome::Final {
                    text: last.text_content(),
                    exhausted: true,
                });
            }
            rounds += 1;

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let native_id = call.native_id.clone().unwrap_or_default();
                let tool_name = call.tool_name.clone();
                let arguments = call.arguments.clone();

                let result = self.bridge.submit(call).await;
                let message = match &result {
                    Ok(output) => ToolResultMessage::success(&native_id, &tool_name, output.payload_text()),
                    Err(e) => {
                        debug!(tool = %tool_name, "Tool error returned to agent: {}", e);
                        ToolResultMessage::error(&native_id, &tool_name, e.to_payload().to_string())
                    }
                };
                results.push(message);
                transcript.push(ToolInvocation::from_result(tool_name, arguments, &result));
            }

            response = session.send_tool_results(&results).await?;
        }
    }

    /// React to the other directors' positions.
    ///
    /// Replies without a debate block are kept as a critique with no
    /// revision.
    pub async fn debate(
        &self,
        director: &Director,
        turn: DebateTurn<'_>,
    ) -> Result<DebateReply, AgentFailure> {
        let session = self
            .gateway
            .create_session(&director.system_prompt())
            .await
            .map_err(|e| AgentFailure::ProviderError(e.to_string()))?;
        let prompt = PromptTemplate::debate_prompt(
            turn.round,
            turn.task.content(),
            director,
            turn.own_steps,
            turn.peers,
        );
        let text = session
            .send(&prompt)
            .await
            .map_err(|e| AgentFailure::ProviderError(e.to_string()))?;

        if let Some(reply) =
            parse_debate_reply(&text, &director.id, turn.round, turn.default_confidence)
        {
            return Ok(reply);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentFailure::Degenerate("empty debate reply".to_string()));
        }
        debug!(director = %director.id, round = turn.round, "Debate reply had no debate block");
        Ok(DebateReply {
            message_type: MessageType::Critique,
            content: preview(text, FREE_TEXT_CHARS),
            steps: None,
        })
    }
}
