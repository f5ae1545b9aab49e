//! Plan entities: the synthesized result of one orchestration run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::debate::DebateMessage;
use super::report::AgentFailure;
use super::step::Step;
use crate::graph::PlanGraph;

/// A step selected by synthesis, with its aggregated standing.
///
/// `step` is the representative as the agent produced it; synthesis never
/// edits it. The merged values live beside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStep {
    pub step: Step,
    /// Mean confidence over the corroborating group
    pub confidence: f64,
    /// Director ids that proposed this step, proposer first
    pub corroborated_by: Vec<String>,
    /// Round the representative step was produced in
    pub round: u32,
    /// Position of the proposer in the run's director list
    pub agent_index: usize,
    /// Plan step ids that must be applied first. Always earlier in the plan.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl RankedStep {
    pub fn corroboration(&self) -> usize {
        self.corroborated_by.len()
    }
}

/// A director left out of synthesis and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedDirector {
    pub director_id: String,
    pub director_name: String,
    pub reason: AgentFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanValidationError {
    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("plan confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(String),

    #[error("step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: String, dependency: String },

    /// Covers cycles: some step in a cycle always points forward.
    #[error("step {step} depends on {dependency}, which is not ordered before it")]
    DependencyOutOfOrder { step: String, dependency: String },
}

/// The consensus plan of a run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub title: String,
    /// Contributing director ids, in selection order
    pub created_by: Vec<String>,
    pub confidence: f64,
    pub summary: String,
    pub steps: Vec<RankedStep>,
    pub debate_transcript: Vec<DebateMessage>,
    #[serde(default)]
    pub excluded: Vec<ExcludedDirector>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        let mut seen = HashSet::new();
        for ranked in &self.steps {
            if !seen.insert(ranked.step.step_id.as_str()) {
                return Err(PlanValidationError::DuplicateStepId(
                    ranked.step.step_id.clone(),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(PlanValidationError::ConfidenceOutOfRange(
                self.confidence.to_string(),
            ));
        }

        let mut placed = HashSet::new();
        for ranked in &self.steps {
            for dependency in &ranked.depends_on {
                if placed.contains(dependency.as_str()) {
                    continue;
                }
                let step = ranked.step.step_id.clone();
                let dependency = dependency.clone();
                return Err(if seen.contains(dependency.as_str()) {
                    PlanValidationError::DependencyOutOfOrder { step, dependency }
                } else {
                    PlanValidationError::UnknownDependency { step, dependency }
                });
            }
            placed.insert(ranked.step.step_id.as_str());
        }
        Ok(())
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// What the store persists for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub run_id: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub plan: Plan,
    pub graph: PlanGraph,
}

impl PlanRecord {
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            run_id: self.run_id.clone(),
            plan_id: self.plan.plan_id.clone(),
            title: self.plan.title.clone(),
            prompt: self.prompt.clone(),
            created_at: self.created_at,
            step_count: self.plan.step_count(),
            confidence: self.plan.confidence,
        }
    }
}

/// Listing entry for the plan catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub run_id: String,
    pub plan_id: String,
    pub title: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub step_count: usize,
    pub confidence: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::plan::step::StepType;

    pub fn ranked(id: &str, director: &str, confidence: f64) -> RankedStep {
        RankedStep {
            step: Step::new(id, director, StepType::Trim, "trim the intro", confidence),
            confidence,
            corroborated_by: vec![director.to_string()],
            round: 0,
            agent_index: 0,
            depends_on: Vec::new(),
        }
    }

    pub fn plan(steps: Vec<RankedStep>) -> Plan {
        Plan {
            plan_id: "plan-1".to_string(),
            title: "Director Plan: tighten".to_string(),
            created_by: vec!["a".to_string()],
            confidence: 0.5,
            summary: "summary".to_string(),
            steps,
            debate_transcript: Vec::new(),
            excluded: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_validate_duplicate_step_ids() {
        let plan = plan(vec![ranked("a-r0-s1", "a", 0.5), ranked("a-r0-s1", "a", 0.4)]);
        assert_eq!(
            plan.validate(),
            Err(PlanValidationError::DuplicateStepId("a-r0-s1".to_string()))
        );
    }

    #[test]
    fn test_validate_ok() {
        let plan = plan(vec![ranked("a-r0-s1", "a", 0.5), ranked("a-r0-s2", "a", 0.4)]);
        assert!(plan.validate().is_ok());
        assert_eq!(plan.step_count(), 2);
    }

    #[test]
    fn test_validate_dependencies() {
        let mut second = ranked("a-r0-s2", "a", 0.4);
        second.depends_on = vec!["a-r0-s1".to_string()];
        assert!(plan(vec![ranked("a-r0-s1", "a", 0.5), second.clone()]).validate().is_ok());

        let mut dangling = ranked("a-r0-s3", "a", 0.3);
        dangling.depends_on = vec!["b-r0-s1".to_string()];
        assert_eq!(
            plan(vec![ranked("a-r0-s1", "a", 0.5), dangling]).validate(),
            Err(PlanValidationError::UnknownDependency {
                step: "a-r0-s3".to_string(),
                dependency: "b-r0-s1".to_string(),
            })
        );

        // a-r0-s1 <-> a-r0-s2
        let mut first = ranked("a-r0-s1", "a", 0.5);
        first.depends_on = vec!["a-r0-s2".to_string()];
        assert_eq!(
            plan(vec![first, second]).validate(),
            Err(PlanValidationError::DependencyOutOfOrder {
                step: "a-r0-s1".to_string(),
                dependency: "a-r0-s2".to_string(),
            })
        );

        let mut own = ranked("a-r0-s1", "a", 0.5);
        own.depends_on = vec!["a-r0-s1".to_string()];
        assert!(matches!(
            plan(vec![own]).validate(),
            Err(PlanValidationError::DependencyOutOfOrder { .. })
        ));
    }

    #[test]
    fn test_plan_serde_round_trip() {
        let plan = plan(vec![ranked("a-r0-s1", "a", 0.5)]);
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
