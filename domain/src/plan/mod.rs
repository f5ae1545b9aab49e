//! Steps, reports, debate messages and plans.
//!
//! ```text
//! AnalysisAgent ──► AnalysisReport { steps: Vec<Step> }
//!                         │  (debate may supersede steps)
//!                         ▼
//!               synthesis::synthesize ──► Vec<RankedStep> ──► Plan ──► PlanRecord
//! ```

pub mod debate;
pub mod entities;
pub mod parsing;
pub mod report;
pub mod step;

pub use debate::{DebateMessage, MessageType};
pub use entities::{
    ExcludedDirector, Plan, PlanRecord, PlanSummary, PlanValidationError, RankedStep,
};
pub use parsing::{DebateReply, ParsedReport, SynthesisReply};
pub use report::{AgentFailure, AnalysisReport, InvocationOutcome, ReportStatus, ToolInvocation};
pub use step::{Step, StepType};
