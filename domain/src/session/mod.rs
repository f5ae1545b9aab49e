//! Model conversation types.
//!
//! - [`response::LlmResponse`]: one model turn, text plus tool-use requests
//! - [`response::ToolResultMessage`]: an observation sent back to the model

pub mod response;

pub use response::{ContentBlock, LlmResponse, StopReason, ToolResultMessage};
