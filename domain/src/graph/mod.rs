//! Plan graph: an event-sourced tree of what the directors did during a run.
//!
//! ```text
//! Root (task)
//! ├── Branch "Pacing Director"
//! │   ├── Step "List Clips"
//! │   └── Step "Analyze Pacing"
//! └── Branch "Audio Director"
//!     └── Step "Analyze Audio Levels"
//! ```
//!
//! [`PlanGraphBuilder`] is the single writer: it applies [`RunEvent`]s in
//! arrival order and hands out read-only [`PlanGraph`] snapshots.

pub mod builder;
pub mod event;
pub mod node;

pub use builder::{GraphError, PlanGraphBuilder};
pub use event::{BranchKey, InvocationId, RunEvent};
pub use node::{NodeId, NodeStatus, NodeType, PlanGraph, PlanGraphNode, StepBrief};
