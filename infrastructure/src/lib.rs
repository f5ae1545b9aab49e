//! Infrastructure layer for director-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer:
//!
//! | Module | Adapter | Port |
//! |--------|---------|------|
//! | [`config`] | `ConfigLoader`, `FileConfig` | (startup) |
//! | [`directors`] | `FileDirectorSource` | `DirectorSource` |
//! | [`store`] | `FilePlanStore` | `PlanStore` |
//! | [`logging`] | `JsonlEventLog` | `RunEventSink` |
//! | [`openai`] | `OpenAiGateway` | `LlmGateway` |
//! | [`project`] | project analysis tools | `UiTool` |

pub mod config;
pub mod directors;
pub mod logging;
#[cfg(feature = "http-gateway")]
pub mod openai;
pub mod project;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, ConfigValidationError, FileConfig, FileDirectorsConfig,
    FileLoggingConfig, FileOrchestrationConfig, FileProviderConfig, FileStoreConfig, Severity,
};
pub use directors::{DirectorLoadError, FileDirectorSource};
pub use logging::JsonlEventLog;
#[cfg(feature = "http-gateway")]
pub use openai::{OpenAiGateway, OpenAiSession, OpenAiSettings};
pub use project::{ProjectLoadError, ProjectSnapshot, project_tool_registry};
pub use store::FilePlanStore;
