//! Application-level configuration.
//!
//! - [`OrchestrationConfig`]: concurrency, budgets and timeouts of a director run
//! - [`BridgeConfig`]: queue bound and per-call timeout of the tool bridge

pub mod orchestration;

pub use orchestration::{BridgeConfig, OrchestrationConfig};
