//! Orchestration configuration (`[orchestration]` section)

use council_application::{BridgeConfig, OrchestrationConfig};
use council_domain::RunOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw run parameters. Out-of-range values are clamped when converted and
/// reported by [`FileConfig::validate`](super::FileConfig::validate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    /// Maximum directors analyzing at once (default: 4)
    pub max_concurrency: usize,
    /// Debate rounds, 0 disables debate (default: 1, max 3)
    pub debate_rounds: u32,
    /// Global run deadline in milliseconds (default: 300000)
    pub timeout_ms: u64,
    /// Per tool call deadline in milliseconds (default: 30000)
    pub tool_timeout_ms: u64,
    /// Tool rounds per director (default: 10)
    pub iteration_budget: usize,
    /// Description similarity for corroborating steps (default: 0.8)
    pub similarity_threshold: f64,
    /// Bound of the tool queue feeding the UI thread (default: 64)
    pub queue_capacity: usize,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        let app = OrchestrationConfig::default();
        Self {
            max_concurrency: app.max_concurrency,
            debate_rounds: app.defaults.debate_rounds,
            timeout_ms: app.defaults.timeout_ms,
            tool_timeout_ms: app.bridge.tool_timeout.as_millis() as u64,
            iteration_budget: app.iteration_budget,
            similarity_threshold: app.similarity_threshold,
            queue_capacity: app.bridge.queue_capacity,
        }
    }
}

impl FileOrchestrationConfig {
    /// Application-layer value with every field clamped into range.
    pub fn to_orchestration_config(&self) -> OrchestrationConfig {
        OrchestrationConfig::default()
            .with_max_concurrency(self.max_concurrency)
            .with_iteration_budget(self.iteration_budget)
            .with_similarity_threshold(self.similarity_threshold)
            .with_defaults(RunOptions::new(self.debate_rounds, self.timeout_ms))
            .with_bridge(BridgeConfig {
                queue_capacity: self.queue_capacity.max(1),
                tool_timeout: Duration::from_millis(self.tool_timeout_ms.max(1)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        let file = FileOrchestrationConfig::default();
        assert_eq!(file.to_orchestration_config(), OrchestrationConfig::default());
        assert_eq!(file.tool_timeout_ms, 30_000);
        assert_eq!(file.queue_capacity, 64);
    }

    #[test]
    fn test_conversion_clamps() {
        let file = FileOrchestrationConfig {
            max_concurrency: 0,
            debate_rounds: 10,
            timeout_ms: 0,
            tool_timeout_ms: 0,
            iteration_budget: 0,
            similarity_threshold: -1.0,
            queue_capacity: 0,
        };
        let config = file.to_orchestration_config();
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.defaults.debate_rounds, 3);
        assert_eq!(config.defaults.timeout_ms, 1);
        assert_eq!(config.iteration_budget, 1);
        assert_eq!(config.similarity_threshold, 0.0);
        assert_eq!(config.bridge.queue_capacity, 1);
        assert_eq!(config.bridge.tool_timeout, Duration::from_millis(1));
    }
}
