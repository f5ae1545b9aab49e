//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; [`FileConfig::validate`] reports values
//! that will be clamped or cannot work.

mod directors;
mod orchestration;
mod provider;
mod storage;

pub use directors::FileDirectorsConfig;
pub use orchestration::FileOrchestrationConfig;
pub use provider::FileProviderConfig;
pub use storage::{FileLoggingConfig, FileStoreConfig};

use council_domain::orchestration::MAX_DEBATE_ROUNDS;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the value is adjusted before use.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} = {value} is out of range, using {used}")]
    Clamped {
        field: &'static str,
        value: String,
        used: String,
    },

    #[error("{field} cannot be 0")]
    Zero { field: &'static str },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub error: ConfigValidationError,
}

impl ConfigIssue {
    fn warning(error: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Warning,
            error,
        }
    }

    fn error(error: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Error,
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.error),
            Severity::Warning => write!(f, "warning: {}", self.error),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directors: FileDirectorsConfig,
    pub orchestration: FileOrchestrationConfig,
    pub provider: FileProviderConfig,
    pub store: FileStoreConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        use ConfigValidationError::*;

        let mut issues = Vec::new();
        let o = &self.orchestration;

        // Clamped values
        if o.max_concurrency == 0 {
            issues.push(ConfigIssue::warning(Clamped {
                field: "orchestration.max_concurrency",
                value: "0".to_string(),
                used: "1".to_string(),
            }));
        }
        if o.debate_rounds > MAX_DEBATE_ROUNDS {
            issues.push(ConfigIssue::warning(Clamped {
                field: "orchestration.debate_rounds",
                value: o.debate_rounds.to_string(),
                used: MAX_DEBATE_ROUNDS.to_string(),
            }));
        }
        if o.iteration_budget == 0 {
            issues.push(ConfigIssue::warning(Clamped {
                field: "orchestration.iteration_budget",
                value: "0".to_string(),
                used: "1".to_string(),
            }));
        }
        if o.queue_capacity == 0 {
            issues.push(ConfigIssue::warning(Clamped {
                field: "orchestration.queue_capacity",
                value: "0".to_string(),
                used: "1".to_string(),
            }));
        }
        if !(0.0..=1.0).contains(&o.similarity_threshold) {
            let used = o
                .to_orchestration_config()
                .similarity_threshold
                .to_string();
            issues.push(ConfigIssue::warning(Clamped {
                field: "orchestration.similarity_threshold",
                value: o.similarity_threshold.to_string(),
                used,
            }));
        }

        // Unusable values
        if o.timeout_ms == 0 {
            issues.push(ConfigIssue::error(Zero {
                field: "orchestration.timeout_ms",
            }));
        }
        if o.tool_timeout_ms == 0 {
            issues.push(ConfigIssue::error(Zero {
                field: "orchestration.tool_timeout_ms",
            }));
        }
        if self.provider.model.trim().is_empty() {
            issues.push(ConfigIssue::error(Empty {
                field: "provider.model",
            }));
        }
        if self.provider.base_url.trim().is_empty() {
            issues.push(ConfigIssue::error(Empty {
                field: "provider.base_url",
            }));
        }
        if self.provider.max_tokens == 0 {
            issues.push(ConfigIssue::error(Zero {
                field: "provider.max_tokens",
            }));
        }
        if self
            .directors
            .default_selection
            .iter()
            .any(|id| id.trim().is_empty())
        {
            issues.push(ConfigIssue::warning(Empty {
                field: "directors.default_selection entry",
            }));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[directors]
builtin_dir = "/opt/council/directors"
default_selection = ["pacing", "audio"]

[orchestration]
max_concurrency = 2
debate_rounds = 2
timeout_ms = 60000

[provider]
model = "local-model"
base_url = "http://localhost:11434/v1"

[store]
dir = "/tmp/plans"

[logging]
event_log = "/tmp/events.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.directors.builtin_dir,
            PathBuf::from("/opt/council/directors")
        );
        assert_eq!(config.directors.default_selection, vec!["pacing", "audio"]);
        assert_eq!(config.orchestration.max_concurrency, 2);
        assert_eq!(config.orchestration.debate_rounds, 2);
        // Defaults apply to unset fields
        assert_eq!(config.orchestration.tool_timeout_ms, 30_000);
        assert_eq!(config.provider.model, "local-model");
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.store.resolved_dir(), PathBuf::from("/tmp/plans"));
        assert_eq!(
            config.logging.event_log,
            Some(PathBuf::from("/tmp/events.jsonl"))
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.orchestration.max_concurrency, 4);
        assert_eq!(config.orchestration.debate_rounds, 1);
        assert_eq!(config.orchestration.timeout_ms, 300_000);
    }

    #[test]
    fn test_validate_reports_clamps_and_errors() {
        let toml_str = r#"
[orchestration]
max_concurrency = 0
debate_rounds = 5
similarity_threshold = 1.5
timeout_ms = 0

[provider]
model = ""
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error()).collect();
        let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
        assert_eq!(warnings.len(), 3);
        assert_eq!(errors.len(), 2);
        assert!(issues.iter().any(|i| i.to_string()
            == "warning: orchestration.debate_rounds = 5 is out of range, using 3"));
        assert!(issues
            .iter()
            .any(|i| i.to_string() == "error: orchestration.timeout_ms cannot be 0"));
        assert!(issues
            .iter()
            .any(|i| i.to_string() == "error: provider.model cannot be empty"));
    }

    #[test]
    fn test_scan_dirs_builtin_first() {
        let config = FileDirectorsConfig {
            builtin_dir: PathBuf::from("/a"),
            user_dir: Some(PathBuf::from("/b")),
            default_selection: vec![],
        };
        assert_eq!(
            config.scan_dirs(),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
