//! Progress notification port
//!
//! Defines the interface for reporting progress during a director run.

use council_domain::{DebateMessage, ReportStatus, RunPhase};

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, panel, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: RunPhase, total_tasks: usize);

    /// Called when one director finishes its part of a phase
    fn on_director_complete(&self, phase: RunPhase, director_name: &str, status: ReportStatus);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: RunPhase);

    /// Called for every debate transcript entry, in emission order
    fn on_debate_message(&self, _message: &DebateMessage) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: RunPhase, _total_tasks: usize) {}
    fn on_director_complete(&self, _phase: RunPhase, _director_name: &str, _status: ReportStatus) {}
    fn on_phase_complete(&self, _phase: RunPhase) {}
}
