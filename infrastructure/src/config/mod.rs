//! Configuration file loading for director-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./council.toml` or `./.council.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/director-council/config.toml`
//! 4. Environment variables prefixed `COUNCIL_`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigValidationError, FileConfig, FileDirectorsConfig, FileLoggingConfig,
    FileOrchestrationConfig, FileProviderConfig, FileStoreConfig, Severity,
};
pub use loader::ConfigLoader;
