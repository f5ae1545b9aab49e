//! Tool domain
//!
//! Tools are the only way an analysis agent touches the edited project.
//! Their argument and result payloads are opaque JSON owned by each tool;
//! the core only routes, times and records them.
//!
//! # Execution model
//!
//! ```text
//! agent (worker) ──submit(ToolCall)──▶ MainThreadBridge ──queue──▶ UI thread
//!                                                             │
//!                                        ToolRegistry::invoke ◀┘
//! ```
//!
//! - [`ToolDefinition`] / [`ToolParameter`] describe a tool for the model
//! - [`ToolCall`] is a request from an agent
//! - [`ToolOutput`] / [`ToolError`] are the two possible outcomes
//! - [`UiTool`] is the callable body; it always runs on the UI-owning thread

pub mod entities;
pub mod registry;
pub mod traits;
pub mod value_objects;

pub use entities::{RiskLevel, ToolCall, ToolDefinition, ToolParameter};
pub use registry::{ToolRegistry, UiTool};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolErrorKind, ToolOutput};
