//! Live plan graph for a run.

use std::sync::Mutex;

use council_domain::{PlanGraph, PlanGraphBuilder, RunEvent};
use tracing::warn;

use crate::ports::run_events::RunEventSink;

/// Event sink that folds a run's events into its [`PlanGraph`].
///
/// The builder is created on `RunStarted`; events before that are dropped.
/// Rejected events are logged and ignored so a malformed event never fails
/// the run.
#[derive(Default)]
pub struct PlanGraphRecorder {
    builder: Mutex<Option<PlanGraphBuilder>>,
}

impl PlanGraphRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_builder<R>(&self, f: impl FnOnce(&mut Option<PlanGraphBuilder>) -> R) -> R {
        let mut guard = self.builder.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Current graph, for live views.
    pub fn snapshot(&self) -> Option<PlanGraph> {
        self.with_builder(|builder| builder.as_ref().map(PlanGraphBuilder::snapshot))
    }

    /// Seal the graph. Later events are rejected.
    pub fn finalize(&self) -> Option<PlanGraph> {
        self.with_builder(|builder| builder.as_mut().map(PlanGraphBuilder::finalize))
    }
}

impl RunEventSink for PlanGraphRecorder {
    fn emit(&self, event: &RunEvent) {
        self.with_builder(|builder| match (event, builder.as_mut()) {
            (RunEvent::RunStarted { run_id, prompt }, None) => {
                *builder = Some(PlanGraphBuilder::new(run_id, prompt));
            }
            (_, Some(graph)) => {
                if let Err(e) = graph.apply(event) {
                    warn!(event = event.kind(), "Plan graph rejected event: {}", e);
                }
            }
            (_, None) => {
                warn!(event = event.kind(), "Plan graph event before run start, dropped");
            }
        })
    }
}
