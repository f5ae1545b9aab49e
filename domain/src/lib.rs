//! Domain layer for director-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure, async runtimes or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Directors
//!
//! A [`Director`] is an analysis persona loaded from a `.director` file. A run
//! selects a few directors; each analyzes the project independently and
//! produces an [`AnalysisReport`] of proposed [`Step`]s.
//!
//! ## Synthesis
//!
//! [`synthesis::synthesize`] merges the final step lists: near-duplicate steps
//! from different directors corroborate each other, and the result is ranked
//! into a [`Plan`].
//!
//! ## Plan graph
//!
//! Every tool call a director makes is recorded as a [`RunEvent`]. The
//! [`PlanGraphBuilder`] folds those events into a tree that is persisted
//! with the plan.

pub mod core;
pub mod director;
pub mod graph;
pub mod orchestration;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod synthesis;
pub mod tool;

// Re-export commonly used types
pub use core::task::AnalysisTask;
pub use director::{Director, DirectorPersonality, DirectorRoster, DirectorValidationError};
pub use graph::{
    BranchKey, GraphError, InvocationId, NodeId, NodeStatus, NodeType, PlanGraph,
    PlanGraphBuilder, PlanGraphNode, RunEvent,
};
pub use orchestration::{OrchestrationError, RunOptions, RunPhase};
pub use plan::{
    AgentFailure, AnalysisReport, DebateMessage, ExcludedDirector, InvocationOutcome, MessageType,
    Plan, PlanRecord, PlanSummary, RankedStep, ReportStatus, Step, StepType, ToolInvocation,
};
pub use prompt::PromptTemplate;
pub use session::{ContentBlock, LlmResponse, StopReason, ToolResultMessage};
pub use synthesis::{AgentSteps, Synthesis, synthesize};
pub use tool::{
    RiskLevel, ToolCall, ToolDefinition, ToolError, ToolErrorKind, ToolOutput, ToolParameter,
    ToolRegistry, UiTool,
};
