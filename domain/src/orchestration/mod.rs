//! Orchestration run state.
//!
//! - [`entities::RunPhase`]: the per-run state machine
//! - [`value_objects::RunOptions`]: per-run knobs chosen by the caller
//! - [`error::OrchestrationError`]: why a run produced no plan

pub mod entities;
pub mod error;
pub mod value_objects;

pub use entities::RunPhase;
pub use error::OrchestrationError;
pub use value_objects::{MAX_DEBATE_ROUNDS, RunOptions};
