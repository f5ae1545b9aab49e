//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod director_source;
pub mod llm_gateway;
pub mod plan_store;
pub mod progress;
pub mod run_events;
