//! Application layer for director-council
//!
//! This crate contains the tool bridge, the use cases, port definitions and
//! application configuration. It depends only on the domain layer.
//!
//! ```text
//! RunDirectorsUseCase ──spawns──▶ AnalysisAgent × N ──submit──▶ MainThreadBridge
//!        │                                                            │
//!        └──── RunEvent ──▶ CompositeEventSink ◀──── step events ─────┘
//!                              ├── PlanGraphRecorder
//!                              └── external sinks
//! ```

pub mod bridge;
pub mod config;
pub mod ports;
pub mod recorder;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use bridge::{MainThreadBridge, UiThreadExecutor};
pub use config::{BridgeConfig, OrchestrationConfig};
pub use ports::{
    director_source::{DirectorSource, DirectorSourceError},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    plan_store::{PersistenceError, PlanStore},
    progress::{NoProgress, ProgressNotifier},
    run_events::{CompositeEventSink, NoEvents, RunEventSink},
};
pub use recorder::PlanGraphRecorder;
pub use use_cases::run_analysis::{AnalysisAgent, DebateTurn};
pub use use_cases::run_directors::{
    RunDirectorsInput, RunDirectorsOutput, RunDirectorsUseCase, RunHandle,
};
