//! Run event sink port
//!
//! Every tool invocation, branch boundary, phase change and debate message of
//! a run is published as a [`RunEvent`]. Sinks must be cheap and must never
//! fail the run: log and move on.

use council_domain::RunEvent;
use std::sync::Arc;

/// Consumer of run events.
///
/// `emit` is called from the UI-owning thread (tool steps) and from
/// orchestration tasks (everything else), so implementations are `Sync`.
pub trait RunEventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Sink that drops everything
pub struct NoEvents;

impl RunEventSink for NoEvents {
    fn emit(&self, _event: &RunEvent) {}
}

/// Fans events out to several sinks in order.
///
/// ```text
/// bridge / orchestrator ──emit──▶ CompositeEventSink
///                                   ├── PlanGraphRecorder   (live tree)
///                                   ├── JsonlEventLog       (audit file)
///                                   └── progress adapter    (console)
/// ```
#[derive(Clone, Default)]
pub struct CompositeEventSink {
    delegates: Vec<Arc<dyn RunEventSink>>,
}

impl CompositeEventSink {
    pub fn new(delegates: Vec<Arc<dyn RunEventSink>>) -> Self {
        Self { delegates }
    }

    pub fn with(mut self, sink: Arc<dyn RunEventSink>) -> Self {
        self.delegates.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl RunEventSink for CompositeEventSink {
    fn emit(&self, event: &RunEvent) {
        for sink in &self.delegates {
            sink.emit(event);
        }
    }
}
