//! Run Directors use case
//!
//! Orchestrates one director run: parallel analysis, optional debate,
//! synthesis and persistence.
//!
//! ```text
//! Idle ─▶ Analyzing ─▶ Debating (0..=3 rounds) ─▶ Synthesizing ─▶ Done
//!             │              │                          │
//!             └──────────────┴──────────────────────────┴──▶ Failed
//! ```
//!
//! Every phase change, branch boundary, tool step and debate message is
//! published through the run's [`RunEventSink`]; the run-scoped
//! [`PlanGraphRecorder`] is always one of the receivers.

use crate::bridge::MainThreadBridge;
use crate::config::OrchestrationConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::plan_store::PlanStore;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_events::{CompositeEventSink, NoEvents, RunEventSink};
use crate::recorder::PlanGraphRecorder;
use crate::use_cases::run_analysis::{AnalysisAgent, DebateTurn};
use chrono::Utc;
use council_domain::core::string::preview;
use council_domain::plan::parsing::parse_synthesis_reply;
use council_domain::prompt::PeerPosition;
use council_domain::{
    AgentFailure, AgentSteps, AnalysisReport, AnalysisTask, BranchKey, DebateMessage, Director,
    DirectorRoster, ExcludedDirector, MessageType, OrchestrationError, Plan, PlanGraph,
    PlanGraphBuilder, PlanRecord, PromptTemplate, ReportStatus, RunEvent, RunOptions, RunPhase,
    Step, Synthesis, synthesize,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Confidence for revised steps of a director whose report carried none
const FALLBACK_STEP_CONFIDENCE: f64 = 0.5;

/// Characters of a branch note (summary or failure reason)
const BRANCH_NOTE_CHARS: usize = 200;

/// Input for the RunDirectors use case
#[derive(Debug, Clone)]
pub struct RunDirectorsInput {
    pub task: AnalysisTask,
    /// Selected directors, in selection order
    pub directors: Vec<Director>,
    pub options: RunOptions,
}

impl RunDirectorsInput {
    pub fn new(task: AnalysisTask, directors: Vec<Director>, options: RunOptions) -> Self {
        let mut unique: Vec<Director> = Vec::with_capacity(directors.len());
        for director in directors {
            if !unique.iter().any(|d| d.id == director.id) {
                unique.push(director);
            }
        }
        Self {
            task,
            directors: unique,
            options: options.normalized(),
        }
    }

    /// Resolve director ids against the loaded roster.
    pub fn from_ids<S: AsRef<str>>(
        task: AnalysisTask,
        roster: &DirectorRoster,
        ids: &[S],
        options: RunOptions,
    ) -> Result<Self, OrchestrationError> {
        let (directors, unknown) = roster.select(ids);
        if !unknown.is_empty() {
            return Err(OrchestrationError::UnknownDirectors(unknown));
        }
        if directors.is_empty() {
            return Err(OrchestrationError::NoDirectors);
        }
        Ok(Self::new(task, directors, options))
    }
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunDirectorsOutput {
    pub run_id: String,
    pub plan: Plan,
    pub graph: PlanGraph,
    /// Final per-director reports, in selection order
    pub reports: Vec<AnalysisReport>,
    /// Whether the plan store accepted the record
    pub saved: bool,
    pub save_error: Option<String>,
}

/// A run executing in the background.
pub struct RunHandle {
    pub run_id: String,
    recorder: Arc<PlanGraphRecorder>,
    cancel: CancellationToken,
    task: JoinHandle<Result<RunDirectorsOutput, OrchestrationError>>,
}

impl RunHandle {
    /// Live view of the run's graph
    pub fn snapshot(&self) -> Option<PlanGraph> {
        self.recorder.snapshot()
    }

    /// Request cancellation. Takes effect at the next check point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to finish.
    pub async fn join(self) -> Result<RunDirectorsOutput, OrchestrationError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(OrchestrationError::Canceled),
            Err(e) => {
                error!(run_id = %self.run_id, "Orchestration task failed: {}", e);
                Err(OrchestrationError::Aborted(e.to_string()))
            }
        }
    }
}

/// Publishes a director's `BranchStarted` exactly once: when the agent is
/// admitted to the pool, or when the run settles a director that never left
/// the queue.
#[derive(Clone)]
struct BranchOpener {
    event: RunEvent,
    sink: Arc<dyn RunEventSink>,
    opened: Arc<Mutex<bool>>,
}

impl BranchOpener {
    fn new(director: &Director, sink: Arc<dyn RunEventSink>) -> Self {
        Self {
            event: RunEvent::BranchStarted {
                branch: BranchKey::new(director.id.clone()),
                director_id: director.id.clone(),
                label: director.name.clone(),
                description: director.description.clone(),
            },
            sink,
            opened: Arc::new(Mutex::new(false)),
        }
    }

    fn open(&self) {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if !*opened {
            self.sink.emit(&self.event);
            *opened = true;
        }
    }
}

/// Where one director stands after the latest phase.
struct Standing {
    report: AnalysisReport,
    /// Round that produced the current step list
    steps_round: u32,
}

/// Run-scoped state. Never shared between runs.
struct RunContext {
    run_id: String,
    task: AnalysisTask,
    directors: Vec<Director>,
    options: RunOptions,
    deadline: Instant,
    cancel: CancellationToken,
    sink: Arc<dyn RunEventSink>,
    recorder: Arc<PlanGraphRecorder>,
    bridge: MainThreadBridge,
    phase: RunPhase,
    transcript: Vec<DebateMessage>,
}

impl RunContext {
    fn deadline_passed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn check_canceled(&self) -> Result<(), OrchestrationError> {
        if self.cancel.is_cancelled() {
            info!(run_id = %self.run_id, phase = self.phase.as_str(), "Run canceled");
            return Err(OrchestrationError::Canceled);
        }
        Ok(())
    }

    fn enter(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(run_id = %self.run_id, from = self.phase.as_str(), to = next.as_str(), "Phase change");
        self.phase = next;
        self.sink.emit(&RunEvent::PhaseChanged { phase: next });
    }
}

/// Use case for running a panel of directors
pub struct RunDirectorsUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    bridge: MainThreadBridge,
    store: Option<Arc<dyn PlanStore>>,
    events: Arc<dyn RunEventSink>,
    progress: Arc<dyn ProgressNotifier>,
    config: OrchestrationConfig,
}

impl<G: LlmGateway + 'static> Clone for RunDirectorsUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            bridge: self.bridge.clone(),
            store: self.store.clone(),
            events: Arc::clone(&self.events),
            progress: Arc::clone(&self.progress),
            config: self.config.clone(),
        }
    }
}

impl<G: LlmGateway + 'static> RunDirectorsUseCase<G> {
    pub fn new(gateway: Arc<G>, bridge: MainThreadBridge, config: OrchestrationConfig) -> Self {
        Self {
            gateway,
            bridge,
            store: None,
            events: Arc::new(NoEvents),
            progress: Arc::new(NoProgress),
            config,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn PlanStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Additional receiver for every run event (event log, live views)
    pub fn with_event_sink(mut self, events: Arc<dyn RunEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    fn context(&self, input: &RunDirectorsInput, cancel: CancellationToken) -> RunContext {
        let run_id = Uuid::new_v4().to_string();
        let recorder = Arc::new(PlanGraphRecorder::new());
        let sink: Arc<dyn RunEventSink> = Arc::new(
            CompositeEventSink::default()
                .with(recorder.clone())
                .with(Arc::clone(&self.events)),
        );
        RunContext {
            run_id,
            task: input.task.clone(),
            directors: input.directors.clone(),
            options: input.options,
            deadline: Instant::now() + input.options.timeout(),
            cancel,
            bridge: self.bridge.with_sink(Arc::clone(&sink)),
            sink,
            recorder,
            phase: RunPhase::Idle,
            transcript: Vec::new(),
        }
    }

    /// Start a run in the background. The caller is notified through the
    /// returned handle, never blocked.
    pub fn spawn(&self, input: RunDirectorsInput) -> RunHandle {
        let ctx = self.context(&input, CancellationToken::new());
        let run_id = ctx.run_id.clone();
        let recorder = Arc::clone(&ctx.recorder);
        let cancel = ctx.cancel.clone();
        let this = self.clone();
        let task = tokio::spawn(async move { this.run(ctx).await });
        RunHandle {
            run_id,
            recorder,
            cancel,
            task,
        }
    }

    /// Execute a run to completion
    pub async fn execute(
        &self,
        input: RunDirectorsInput,
    ) -> Result<RunDirectorsOutput, OrchestrationError> {
        self.execute_with_cancel(input, CancellationToken::new()).await
    }

    pub async fn execute_with_cancel(
        &self,
        input: RunDirectorsInput,
        cancel: CancellationToken,
    ) -> Result<RunDirectorsOutput, OrchestrationError> {
        let ctx = self.context(&input, cancel);
        self.run(ctx).await
    }

    async fn run(&self, mut ctx: RunContext) -> Result<RunDirectorsOutput, OrchestrationError> {
        let result = self.run_phases(&mut ctx).await;
        if let Err(e) = &result {
            if !ctx.phase.is_terminal() {
                ctx.enter(RunPhase::Failed);
            }
            warn!(run_id = %ctx.run_id, "Run produced no plan: {}", e);
        }
        result
    }

    async fn run_phases(
        &self,
        ctx: &mut RunContext,
    ) -> Result<RunDirectorsOutput, OrchestrationError> {
        if ctx.directors.is_empty() {
            return Err(OrchestrationError::NoDirectors);
        }

        info!(
            run_id = %ctx.run_id,
            directors = ctx.directors.len(),
            debate_rounds = ctx.options.debate_rounds,
            timeout_ms = ctx.options.timeout_ms,
            "Starting director run"
        );
        ctx.sink.emit(&RunEvent::RunStarted {
            run_id: ctx.run_id.clone(),
            prompt: ctx.task.content().to_string(),
        });
        ctx.check_canceled()?;

        // Phase 1: Analysis
        ctx.enter(RunPhase::Analyzing);
        self.progress
            .on_phase_start(RunPhase::Analyzing, ctx.directors.len());
        let mut standings = self.phase_analysis(ctx).await?;
        self.progress.on_phase_complete(RunPhase::Analyzing);
        ctx.check_canceled()?;

        if !standings.iter().any(|s| s.report.is_surviving()) {
            return Err(all_failed(&standings));
        }

        // Phase 2: Debate (optional)
        let survivors = standings.iter().filter(|s| s.report.is_surviving()).count();
        if ctx.options.debate_rounds > 0 && survivors > 1 && !ctx.deadline_passed() {
            ctx.enter(RunPhase::Debating);
            self.phase_debate(ctx, &mut standings).await?;
            ctx.check_canceled()?;
        } else {
            debug!(
                survivors,
                rounds = ctx.options.debate_rounds,
                "Skipping debate phase"
            );
        }

        // Phase 3: Synthesis
        ctx.enter(RunPhase::Synthesizing);
        self.progress.on_phase_start(RunPhase::Synthesizing, 1);
        let plan = self.phase_synthesis(ctx, &standings).await;
        self.progress.on_phase_complete(RunPhase::Synthesizing);
        ctx.check_canceled()?;

        ctx.enter(RunPhase::Done);
        let graph = ctx
            .recorder
            .finalize()
            .unwrap_or_else(|| PlanGraphBuilder::new(&ctx.run_id, ctx.task.content()).finalize());

        let record = PlanRecord {
            run_id: ctx.run_id.clone(),
            prompt: ctx.task.content().to_string(),
            created_at: plan.created_at,
            plan: plan.clone(),
            graph: graph.clone(),
        };
        let (saved, save_error) = self.persist(record).await;

        info!(
            run_id = %ctx.run_id,
            steps = plan.steps.len(),
            confidence = plan.confidence,
            saved,
            "Director run finished"
        );

        Ok(RunDirectorsOutput {
            run_id: ctx.run_id.clone(),
            plan,
            graph,
            reports: standings.into_iter().map(|s| s.report).collect(),
            saved,
            save_error,
        })
    }

    /// Phase 1: every director analyzes in parallel, capped by the pool size.
    async fn phase_analysis(
        &self,
        ctx: &mut RunContext,
    ) -> Result<Vec<Standing>, OrchestrationError> {
        let pool = Arc::new(Semaphore::new(self.config.pool_size(ctx.directors.len())));
        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::new();
        let openers: Vec<BranchOpener> = ctx
            .directors
            .iter()
            .map(|d| BranchOpener::new(d, Arc::clone(&ctx.sink)))
            .collect();

        for (index, director) in ctx.directors.iter().enumerate() {
            let branch = BranchKey::new(director.id.clone());
            let opener = openers[index].clone();

            let agent = AnalysisAgent::new(
                Arc::clone(&self.gateway),
                ctx.bridge.for_branch(branch),
                self.config.iteration_budget,
            );
            let director = director.clone();
            let task = ctx.task.clone();
            let pool = Arc::clone(&pool);

            let handle = join_set.spawn(async move {
                let _permit = pool.acquire_owned().await.ok();
                opener.open();
                debug!(director = %director.id, "Analysis started");
                (index, agent.analyze(&task, &director).await)
            });
            task_index.insert(handle.id(), index);
        }

        let mut reports: Vec<Option<AnalysisReport>> = vec![None; ctx.directors.len()];
        loop {
            let joined = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(OrchestrationError::Canceled);
                }
                joined = tokio::time::timeout_at(ctx.deadline, join_set.join_next()) => joined,
            };

            match joined {
                Ok(None) => break,
                Ok(Some(Ok((index, report)))) => {
                    openers[index].open();
                    self.record_analysis(ctx, index, &report);
                    reports[index] = Some(report);
                }
                Ok(Some(Err(e))) => {
                    warn!("Analysis task join error: {}", e);
                    if let Some(&index) = task_index.get(&e.id()) {
                        let director = &ctx.directors[index];
                        let report = AnalysisReport::failed(
                            &director.id,
                            &director.name,
                            AgentFailure::ProviderError(format!("agent task failed: {}", e)),
                        );
                        openers[index].open();
                        self.record_analysis(ctx, index, &report);
                        reports[index] = Some(report);
                    }
                }
                Err(_elapsed) => {
                    warn!(
                        run_id = %ctx.run_id,
                        still_running = join_set.len(),
                        "Run deadline reached during analysis"
                    );
                    join_set.abort_all();
                    break;
                }
            }
        }

        let mut standings = Vec::with_capacity(reports.len());
        for (index, slot) in reports.into_iter().enumerate() {
            let report = match slot {
                Some(report) => report,
                None => {
                    let director = &ctx.directors[index];
                    let report = AnalysisReport::failed(
                        &director.id,
                        &director.name,
                        AgentFailure::DeadlineExceeded,
                    );
                    openers[index].open();
                    self.record_analysis(ctx, index, &report);
                    report
                }
            };
            standings.push(Standing {
                report,
                steps_round: 0,
            });
        }
        Ok(standings)
    }

    /// Close the director's branch and publish its round-0 message.
    fn record_analysis(&self, ctx: &mut RunContext, index: usize, report: &AnalysisReport) {
        let director = &ctx.directors[index];
        let note = match &report.failure {
            Some(failure) if report.status == ReportStatus::Failed => failure.to_string(),
            _ => preview(&report.summary, BRANCH_NOTE_CHARS),
        };
        ctx.sink.emit(&RunEvent::BranchEnded {
            branch: BranchKey::new(director.id.clone()),
            status: report.status,
            note,
        });
        self.progress
            .on_director_complete(RunPhase::Analyzing, &director.name, report.status);

        if report.is_surviving() {
            let message = DebateMessage::new(
                0,
                &director.id,
                &director.name,
                MessageType::Analysis,
                &report.summary,
            );
            self.publish(ctx, message);
        }
    }

    fn publish(&self, ctx: &mut RunContext, message: DebateMessage) {
        ctx.sink.emit(&RunEvent::Debate {
            message: message.clone(),
        });
        self.progress.on_debate_message(&message);
        ctx.transcript.push(message);
    }

    /// Phase 2: surviving directors react to each other, round by round.
    async fn phase_debate(
        &self,
        ctx: &mut RunContext,
        standings: &mut [Standing],
    ) -> Result<(), OrchestrationError> {
        let pool = Arc::new(Semaphore::new(self.config.pool_size(ctx.directors.len())));

        for round in 1..=ctx.options.debate_rounds {
            ctx.check_canceled()?;
            if ctx.deadline_passed() {
                warn!(round, "Run deadline reached, ending debate");
                break;
            }

            let participants: Vec<usize> = (0..standings.len())
                .filter(|&i| standings[i].report.is_surviving())
                .collect();
            info!(round, participants = participants.len(), "Debate round");
            self.progress
                .on_phase_start(RunPhase::Debating, participants.len());

            // Positions as they stood at the end of the previous round.
            let positions: Arc<Vec<(usize, String, String, Vec<Step>)>> = Arc::new(
                participants
                    .iter()
                    .map(|&i| {
                        let report = &standings[i].report;
                        (
                            i,
                            report.director_name.clone(),
                            report.summary.clone(),
                            report.steps.clone(),
                        )
                    })
                    .collect(),
            );

            let mut join_set = JoinSet::new();
            for &index in &participants {
                let director = ctx.directors[index].clone();
                let agent = AnalysisAgent::new(
                    Arc::clone(&self.gateway),
                    ctx.bridge.for_branch(BranchKey::new(director.id.clone())),
                    self.config.iteration_budget,
                );
                let task = ctx.task.clone();
                let positions = Arc::clone(&positions);
                let pool = Arc::clone(&pool);
                let report = &standings[index].report;
                let own_steps = report.steps.clone();
                let default_confidence = if report.status == ReportStatus::Complete {
                    report.confidence
                } else {
                    FALLBACK_STEP_CONFIDENCE
                };

                join_set.spawn(async move {
                    let _permit = pool.acquire_owned().await.ok();
                    let peers: Vec<PeerPosition<'_>> = positions
                        .iter()
                        .filter(|(i, ..)| *i != index)
                        .map(|(_, name, summary, steps)| PeerPosition {
                            name,
                            summary,
                            steps,
                        })
                        .collect();
                    let turn = DebateTurn {
                        round,
                        task: &task,
                        own_steps: &own_steps,
                        peers: &peers,
                        default_confidence,
                    };
                    let reply = agent.debate(&director, turn).await;
                    (index, reply)
                });
            }

            let mut all_final = true;
            let mut cut_short = false;
            loop {
                let joined = tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => {
                        join_set.abort_all();
                        return Err(OrchestrationError::Canceled);
                    }
                    joined = tokio::time::timeout_at(ctx.deadline, join_set.join_next()) => joined,
                };

                match joined {
                    Ok(None) => break,
                    Ok(Some(Ok((index, Ok(reply))))) => {
                        let director = &ctx.directors[index];
                        all_final &= reply.message_type == MessageType::Final;
                        if let Some(steps) = reply.steps {
                            debug!(director = %director.id, round, steps = steps.len(), "Steps revised");
                            let standing = &mut standings[index];
                            if !steps.is_empty() {
                                standing.report.status = ReportStatus::Complete;
                                standing.report.failure = None;
                            }
                            standing.report.steps = steps;
                            standing.steps_round = round;
                        }
                        self.progress.on_director_complete(
                            RunPhase::Debating,
                            &director.name,
                            standings[index].report.status,
                        );
                        let message = DebateMessage::new(
                            round,
                            &director.id,
                            &director.name,
                            reply.message_type,
                            reply.content,
                        );
                        self.publish(ctx, message);
                    }
                    Ok(Some(Ok((index, Err(failure))))) => {
                        // Prior steps stand.
                        all_final = false;
                        let director = &ctx.directors[index];
                        warn!(director = %director.id, round, "Debate reply failed: {}", failure);
                        self.progress.on_director_complete(
                            RunPhase::Debating,
                            &director.name,
                            standings[index].report.status,
                        );
                    }
                    Ok(Some(Err(e))) => {
                        all_final = false;
                        warn!(round, "Debate task join error: {}", e);
                    }
                    Err(_elapsed) => {
                        warn!(
                            round,
                            still_running = join_set.len(),
                            "Run deadline reached during debate, keeping prior steps"
                        );
                        join_set.abort_all();
                        cut_short = true;
                        break;
                    }
                }
            }
            self.progress.on_phase_complete(RunPhase::Debating);

            if cut_short {
                break;
            }
            if all_final {
                info!(round, "All directors final, debate converged");
                break;
            }
        }
        Ok(())
    }

    /// Phase 3: merge the final step lists and write the plan.
    async fn phase_synthesis(&self, ctx: &RunContext, standings: &[Standing]) -> Plan {
        let inputs: Vec<AgentSteps> = standings
            .iter()
            .enumerate()
            .filter(|(_, s)| s.report.is_surviving())
            .map(|(agent_index, s)| AgentSteps {
                director_id: s.report.director_id.clone(),
                agent_index,
                round: s.steps_round,
                steps: s.report.steps.clone(),
            })
            .collect();
        let synthesis = synthesize(&inputs, self.config.similarity_threshold);

        let contributors: Vec<&AnalysisReport> = standings
            .iter()
            .map(|s| &s.report)
            .filter(|r| r.is_surviving())
            .collect();
        let excluded: Vec<ExcludedDirector> = standings
            .iter()
            .map(|s| &s.report)
            .filter(|r| !r.is_surviving())
            .map(|r| ExcludedDirector {
                director_id: r.director_id.clone(),
                director_name: r.director_name.clone(),
                reason: r
                    .failure
                    .clone()
                    .unwrap_or_else(|| AgentFailure::ProviderError("unknown".to_string())),
            })
            .collect();

        let names: Vec<String> = contributors
            .iter()
            .map(|r| r.director_name.clone())
            .collect();
        let (title, mut summary) = match self.synthesis_pass(ctx, &names, &synthesis).await {
            Some((title, summary)) => (title, summary),
            None => (
                format!("Director Plan: {}", preview(ctx.task.content(), 60)),
                format!(
                    "{} ranked steps proposed by {}.",
                    synthesis.steps.len(),
                    names.join(", ")
                ),
            ),
        };
        if !excluded.is_empty() {
            let listed: Vec<String> = excluded
                .iter()
                .map(|e| format!("{} ({})", e.director_name, e.reason))
                .collect();
            summary.push_str(&format!("\n\nExcluded directors: {}", listed.join(", ")));
        }

        Plan {
            plan_id: Uuid::new_v4().to_string(),
            title,
            created_by: contributors.iter().map(|r| r.director_id.clone()).collect(),
            confidence: synthesis.confidence,
            summary,
            steps: synthesis.steps,
            debate_transcript: ctx.transcript.clone(),
            excluded,
            created_at: Utc::now(),
        }
    }

    /// Title and summary from the model. `None` falls back to a generated one.
    async fn synthesis_pass(
        &self,
        ctx: &RunContext,
        directors: &[String],
        synthesis: &Synthesis,
    ) -> Option<(String, String)> {
        if synthesis.steps.is_empty() || ctx.deadline_passed() {
            return None;
        }
        let prompt =
            PromptTemplate::synthesis_prompt(ctx.task.content(), directors, &synthesis.steps);

        let exchange = async {
            let session = self
                .gateway
                .create_session(PromptTemplate::synthesis_system())
                .await?;
            session.send(&prompt).await
        };
        let text = match tokio::time::timeout_at(ctx.deadline, exchange).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Synthesis pass failed, using generated title: {}", e);
                return None;
            }
            Err(_) => {
                warn!("Run deadline reached during synthesis pass");
                return None;
            }
        };
        let reply = parse_synthesis_reply(&text);
        if reply.is_none() {
            debug!("Synthesis reply had no synthesis block");
        }
        reply.map(|r| (r.title, r.summary))
    }

    /// Hand the record to the store. Failures leave the plan unsaved.
    async fn persist(&self, record: PlanRecord) -> (bool, Option<String>) {
        let Some(store) = self.store.clone() else {
            return (false, None);
        };
        let run_id = record.run_id.clone();
        match tokio::task::spawn_blocking(move || store.save(&record)).await {
            Ok(Ok(())) => {
                debug!(run_id = %run_id, "Plan saved");
                (true, None)
            }
            Ok(Err(e)) => {
                error!(run_id = %run_id, "Failed to save plan: {}", e);
                (false, Some(e.to_string()))
            }
            Err(e) => {
                error!(run_id = %run_id, "Plan save task failed: {}", e);
                (false, Some(e.to_string()))
            }
        }
    }
}

fn all_failed(standings: &[Standing]) -> OrchestrationError {
    let only_deadline = standings
        .iter()
        .all(|s| s.report.failure == Some(AgentFailure::DeadlineExceeded));
    if only_deadline {
        return OrchestrationError::DeadlineExceeded;
    }
    OrchestrationError::AllAgentsFailed(
        standings
            .iter()
            .map(|s| {
                let reason = s
                    .report
                    .failure
                    .as_ref()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown failure".to_string());
                format!("{}: {}", s.report.director_name, reason)
            })
            .collect(),
    )
}
