//! Orchestration parameters: use case loop control.
//!
//! These are application-layer values derived from the file config by the
//! binary. The use cases never see file or environment types.

use council_domain::RunOptions;
use council_domain::synthesis::DEFAULT_SIMILARITY_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tool bridge parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bound of the queue feeding the UI thread
    pub queue_capacity: usize,
    /// Per-call deadline covering queueing and execution
    pub tool_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// Director run parameters.
///
/// | Field | Default | Bound |
/// |-------|---------|-------|
/// | `max_concurrency` | 4 | ≥ 1 |
/// | `iteration_budget` | 10 | ≥ 1 |
/// | `similarity_threshold` | 0.8 | [0, 1] |
/// | `defaults.debate_rounds` | 1 | ≤ 3 |
/// | `defaults.timeout_ms` | 300000 | ≥ 1 |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    pub max_concurrency: usize,
    /// Tool rounds per agent before it must answer
    pub iteration_budget: usize,
    pub similarity_threshold: f64,
    /// Options used when the caller does not override them
    pub defaults: RunOptions,
    pub bridge: BridgeConfig,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            iteration_budget: 10,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            defaults: RunOptions::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl OrchestrationConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_iteration_budget(mut self, budget: usize) -> Self {
        self.iteration_budget = budget.max(1);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = if threshold.is_nan() {
            DEFAULT_SIMILARITY_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_defaults(mut self, defaults: RunOptions) -> Self {
        self.defaults = defaults.normalized();
        self
    }

    pub fn with_bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }

    /// Worker pool size for a run with `selected` directors
    pub fn pool_size(&self, selected: usize) -> usize {
        selected.min(self.max_concurrency.max(1)).max(1)
    }
}
