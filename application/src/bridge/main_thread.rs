//! Main-thread bridge: a bounded request queue plus one reply slot per call.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use council_domain::{
    BranchKey, InvocationId, RunEvent, ToolCall, ToolDefinition, ToolError, ToolOutput,
    ToolRegistry,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::ports::run_events::{NoEvents, RunEventSink};

type Reply = Result<ToolOutput, ToolError>;

struct Shared {
    registry: Arc<ToolRegistry>,
    config: BridgeConfig,
    ui_thread: OnceLock<ThreadId>,
    next_invocation: AtomicU64,
    runtime: Option<Handle>,
}

impl Shared {
    fn timeout_ms(&self) -> u64 {
        self.config.tool_timeout.as_millis() as u64
    }

    fn is_ui_thread(&self) -> bool {
        self.ui_thread.get() == Some(&thread::current().id())
    }
}

/// Lifecycle of one queued call. The caller and the executor each settle it
/// under the lock, so a call records exactly one start and one end event no
/// matter which side gives up first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Queued,
    Running,
    Done,
    /// Settled by the caller after a timeout or a lost executor
    Abandoned,
}

type JobSlot = Arc<Mutex<JobState>>;

fn lock_state(slot: &JobSlot) -> std::sync::MutexGuard<'_, JobState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One queued tool call.
struct BridgeJob {
    invocation: InvocationId,
    call: ToolCall,
    branch: Option<BranchKey>,
    sink: Arc<dyn RunEventSink>,
    state: JobSlot,
    reply: oneshot::Sender<Reply>,
}

fn started_event(invocation: InvocationId, branch: Option<BranchKey>, call: &ToolCall) -> RunEvent {
    RunEvent::StepStarted {
        invocation,
        branch,
        tool_name: call.tool_name.clone(),
        arguments: call.arguments.clone(),
    }
}

fn finished_event(invocation: InvocationId, result: &Reply) -> RunEvent {
    match result {
        Ok(output) => RunEvent::StepCompleted {
            invocation,
            result: output.payload_text(),
        },
        Err(error) => RunEvent::StepFailed {
            invocation,
            error: error.clone(),
        },
    }
}

/// Run a tool body, turning a panic into an execution failure so the UI
/// loop survives it.
fn run_tool(registry: &ToolRegistry, call: &ToolCall) -> Reply {
    match catch_unwind(AssertUnwindSafe(|| registry.invoke(call))) {
        Ok(result) => result,
        Err(_) => Err(ToolError::execution_failed(format!(
            "Tool '{}' panicked",
            call.tool_name
        ))),
    }
}

/// Handle used by agents to run tools on the UI-owning thread.
///
/// Cheap to clone. Each clone can be scoped to a run's event sink and to an
/// agent branch; the queue and the registry are shared.
#[derive(Clone)]
pub struct MainThreadBridge {
    tx: mpsc::Sender<BridgeJob>,
    shared: Arc<Shared>,
    sink: Arc<dyn RunEventSink>,
    branch: Option<BranchKey>,
}

impl MainThreadBridge {
    /// Create the bridge and the executor that must be driven by the UI thread.
    pub fn channel(registry: Arc<ToolRegistry>, config: BridgeConfig) -> (Self, UiThreadExecutor) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let shared = Arc::new(Shared {
            registry,
            config,
            ui_thread: OnceLock::new(),
            next_invocation: AtomicU64::new(1),
            runtime: Handle::try_current().ok(),
        });
        let bridge = Self {
            tx,
            shared: Arc::clone(&shared),
            sink: Arc::new(NoEvents),
            branch: None,
        };
        (bridge, UiThreadExecutor { rx, shared })
    }

    /// Same queue, events routed to `sink`.
    pub fn with_sink(&self, sink: Arc<dyn RunEventSink>) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }

    /// Same queue, steps attributed to `branch`.
    pub fn for_branch(&self, branch: BranchKey) -> Self {
        Self {
            branch: Some(branch),
            ..self.clone()
        }
    }

    pub fn branch(&self) -> Option<&BranchKey> {
        self.branch.as_ref()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.shared
            .registry
            .definitions()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Tool schemas offered to the model
    pub fn tool_schemas(&self) -> Vec<Value> {
        self.shared.registry.json_schemas()
    }

    fn next_invocation(&self) -> InvocationId {
        InvocationId(self.shared.next_invocation.fetch_add(1, Ordering::Relaxed))
    }

    /// Record a call that never reached the UI thread.
    fn emit_unqueued(&self, invocation: InvocationId, call: &ToolCall, error: &ToolError) {
        self.sink
            .emit(&started_event(invocation, self.branch.clone(), call));
        self.sink.emit(&RunEvent::StepFailed {
            invocation,
            error: error.clone(),
        });
    }

    /// Settle a queued call from the caller's side. Returns `false` when the
    /// executor finished it first and a reply is on its way.
    fn abandon(&self, state: &JobSlot, invocation: InvocationId, call: &ToolCall, error: &ToolError) -> bool {
        let mut state = lock_state(state);
        match *state {
            JobState::Queued => {
                self.emit_unqueued(invocation, call, error);
            }
            JobState::Running => {
                self.sink.emit(&RunEvent::StepFailed {
                    invocation,
                    error: error.clone(),
                });
            }
            JobState::Done | JobState::Abandoned => return false,
        }
        *state = JobState::Abandoned;
        true
    }

    /// Execute on the current thread. Only valid on the UI thread.
    fn execute_inline(&self, invocation: InvocationId, call: ToolCall) -> Reply {
        trace!(tool = %call.tool_name, "Same-thread submit, executing inline");
        self.sink
            .emit(&started_event(invocation, self.branch.clone(), &call));
        let result = run_tool(&self.shared.registry, &call);
        self.sink.emit(&finished_event(invocation, &result));
        result
    }

    /// Run a tool on the UI thread and wait for its outcome.
    ///
    /// The configured tool timeout covers both queueing and execution. Called
    /// from the UI thread itself, the tool runs inline.
    pub async fn submit(&self, call: ToolCall) -> Reply {
        let invocation = self.next_invocation();
        if self.shared.is_ui_thread() {
            return self.execute_inline(invocation, call);
        }

        let deadline = tokio::time::Instant::now() + self.shared.config.tool_timeout;
        let (reply_tx, mut reply_rx) = oneshot::channel();
        let state: JobSlot = Arc::new(Mutex::new(JobState::Queued));
        let job = BridgeJob {
            invocation,
            call: call.clone(),
            branch: self.branch.clone(),
            sink: Arc::clone(&self.sink),
            state: Arc::clone(&state),
            reply: reply_tx,
        };

        match tokio::time::timeout_at(deadline, self.tx.send(job)).await {
            Ok(Ok(())) => {}
            Ok(Err(_closed)) => {
                let error = ToolError::execution_failed("UI thread executor is not running");
                self.emit_unqueued(invocation, &call, &error);
                return Err(error);
            }
            Err(_elapsed) => {
                warn!(tool = %call.tool_name, "Bridge queue full until tool timeout");
                let error = ToolError::timeout(&call.tool_name, self.shared.timeout_ms());
                self.emit_unqueued(invocation, &call, &error);
                return Err(error);
            }
        }

        match tokio::time::timeout_at(deadline, &mut reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_dropped)) => {
                let error = ToolError::execution_failed("UI thread executor stopped before replying");
                self.abandon(&state, invocation, &call, &error);
                Err(error)
            }
            Err(_elapsed) => {
                let error = ToolError::timeout(&call.tool_name, self.shared.timeout_ms());
                if self.abandon(&state, invocation, &call, &error) {
                    warn!(tool = %call.tool_name, invocation = %invocation, "Tool call timed out");
                    return Err(error);
                }
                // Finished right at the deadline; take the real outcome.
                reply_rx.await.unwrap_or(Err(error))
            }
        }
    }

    /// Blocking variant for plain (non-async) threads.
    ///
    /// On the UI thread the tool runs inline. Elsewhere the call is driven on
    /// the runtime the bridge was created in; calling this from inside an
    /// async task is an error.
    pub fn submit_blocking(&self, call: ToolCall) -> Reply {
        if self.shared.is_ui_thread() {
            let invocation = self.next_invocation();
            return self.execute_inline(invocation, call);
        }
        if Handle::try_current().is_ok() {
            return Err(ToolError::execution_failed(
                "submit_blocking called from an async context; use submit",
            ));
        }
        match &self.shared.runtime {
            Some(handle) => handle.block_on(self.submit(call)),
            None => Err(ToolError::execution_failed(
                "no async runtime available for a blocking submit",
            )),
        }
    }

    /// JSON-in, JSON-out form of [`submit`](Self::submit).
    ///
    /// Returns the result payload, or `{"error": {"kind", "message"}}`.
    pub async fn invoke_json(&self, tool_name: &str, args_json: &str) -> String {
        let arguments = if args_json.trim().is_empty() {
            Ok(Value::Object(Default::default()))
        } else {
            serde_json::from_str::<Value>(args_json)
        };
        let result = match arguments {
            Ok(arguments) => {
                let mut call = ToolCall::new(tool_name);
                call.arguments = arguments;
                self.submit(call).await
            }
            Err(e) => Err(ToolError::invalid_args(format!("arguments are not valid JSON: {}", e))),
        };
        match result {
            Ok(output) => output.payload.to_string(),
            Err(error) => error.to_payload().to_string(),
        }
    }
}

/// The single consumer of the bridge queue. Lives on the UI-owning thread.
pub struct UiThreadExecutor {
    rx: mpsc::Receiver<BridgeJob>,
    shared: Arc<Shared>,
}

impl UiThreadExecutor {
    /// Declare the current thread as the UI thread.
    ///
    /// Returns `false` if a different thread was already bound.
    pub fn bind_current_thread(&self) -> bool {
        let current = thread::current().id();
        *self.shared.ui_thread.get_or_init(|| current) == current
    }

    fn execute(&self, job: BridgeJob) {
        let BridgeJob {
            invocation,
            call,
            branch,
            sink,
            state,
            reply,
        } = job;

        {
            let mut state = lock_state(&state);
            if *state != JobState::Queued {
                debug!(tool = %call.tool_name, "Caller gave up while queued, skipping execution");
                return;
            }
            *state = JobState::Running;
            sink.emit(&started_event(invocation, branch, &call));
            if reply.is_closed() {
                // Caller went away without settling, e.g. its task was aborted.
                *state = JobState::Abandoned;
                debug!(tool = %call.tool_name, "Caller dropped while queued, skipping execution");
                sink.emit(&RunEvent::StepFailed {
                    invocation,
                    error: ToolError::timeout(&call.tool_name, self.shared.timeout_ms()),
                });
                return;
            }
        }

        trace!(tool = %call.tool_name, invocation = %invocation, "Executing tool on UI thread");
        let mut result = run_tool(&self.shared.registry, &call);

        {
            let mut state = lock_state(&state);
            if *state != JobState::Running {
                debug!(tool = %call.tool_name, invocation = %invocation, "Caller timed out, dropping result");
                return;
            }
            *state = JobState::Done;
            if reply.is_closed() {
                result = Err(ToolError::timeout(&call.tool_name, self.shared.timeout_ms()));
            }
            // Completion is published before the caller can observe the result.
            sink.emit(&finished_event(invocation, &result));
        }
        let _ = reply.send(result);
    }

    /// Drain the queue until every bridge handle is dropped.
    ///
    /// Blocks the calling thread; must not be called from an async task.
    pub fn run(mut self) {
        if !self.bind_current_thread() {
            warn!("UI thread executor running on a thread other than the bound UI thread");
        }
        debug!("UI thread executor started");
        while let Some(job) = self.rx.blocking_recv() {
            self.execute(job);
        }
        debug!("UI thread executor stopped: all bridge handles dropped");
    }

    /// Execute everything currently queued without blocking, for hosts that
    /// poll from their own event loop. Returns the number of jobs executed.
    pub fn drain_pending(&mut self) -> usize {
        self.bind_current_thread();
        let mut executed = 0;
        while let Ok(job) = self.rx.try_recv() {
            self.execute(job);
            executed += 1;
        }
        executed
    }
}
