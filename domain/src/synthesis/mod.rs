//! Step synthesis: merge per-director step lists into one ranked list.
//!
//! # Algorithm
//!
//! 1. Walk directors in selection order, and each director's steps in order.
//! 2. A step joins an existing group when the group has the same [`StepType`],
//!    its representative description is at least `similarity_threshold`
//!    similar (token Jaccard), and the group has no step from the same
//!    director yet. Otherwise it opens a new group.
//! 3. Each group becomes one [`RankedStep`]: the first member is the
//!    representative, confidence is the mean over members, and the members'
//!    directors are recorded as corroborators.
//! 4. Groups are ordered by descending confidence; ties keep (round, director
//!    order) via a stable sort.
//! 5. Dependencies of the representative are rewritten to the representative
//!    ids of the groups their targets landed in. Walking the ranking, each
//!    step's prerequisites are pulled in just ahead of it. A dependency that
//!    would close a cycle is dropped.
//!
//! Overall confidence is the mean of the ranked confidences weighted by
//! corroboration count.
//!
//! [`StepType`]: crate::plan::StepType

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::core::string::token_similarity;
use crate::plan::{RankedStep, Step};

/// Default similarity at which two descriptions count as the same proposal.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// One director's final step list, as fed to synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSteps {
    pub director_id: String,
    /// Position in the run's director selection
    pub agent_index: usize,
    /// Round the steps were produced in (0 = initial analysis)
    pub round: u32,
    pub steps: Vec<Step>,
}

/// Result of [`synthesize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub steps: Vec<RankedStep>,
    pub confidence: f64,
}

struct Group<'a> {
    representative: &'a Step,
    round: u32,
    agent_index: usize,
    members: Vec<&'a Step>,
}

impl Group<'_> {
    fn accepts(&self, step: &Step, threshold: f64) -> bool {
        self.representative.step_type == step.step_type
            && !self.members.iter().any(|m| m.director_id == step.director_id)
            && token_similarity(&self.representative.description, &step.description) >= threshold
    }

    fn into_ranked(self) -> RankedStep {
        let confidence =
            self.members.iter().map(|m| m.confidence).sum::<f64>() / self.members.len() as f64;
        RankedStep {
            step: self.representative.clone(),
            confidence,
            corroborated_by: self.members.iter().map(|m| m.director_id.clone()).collect(),
            round: self.round,
            agent_index: self.agent_index,
            depends_on: Vec::new(),
        }
    }
}

/// Merge and rank the final step lists of all surviving directors.
pub fn synthesize(inputs: &[AgentSteps], similarity_threshold: f64) -> Synthesis {
    let threshold = similarity_threshold.clamp(0.0, 1.0);
    let mut groups: Vec<Group<'_>> = Vec::new();

    for input in inputs {
        for step in &input.steps {
            match groups.iter_mut().find(|g| g.accepts(step, threshold)) {
                Some(group) => group.members.push(step),
                None => groups.push(Group {
                    representative: step,
                    round: input.round,
                    agent_index: input.agent_index,
                    members: vec![step],
                }),
            }
        }
    }

    // Every member id resolves to its group's representative id.
    let mut aliases: HashMap<&str, &str> = HashMap::new();
    for group in &groups {
        for member in &group.members {
            aliases.insert(&member.step_id, &group.representative.step_id);
        }
    }
    let links: Vec<Vec<String>> = groups
        .iter()
        .map(|group| {
            let own = group.representative.step_id.as_str();
            let mut depends_on: Vec<String> = Vec::new();
            for dependency in &group.representative.dependencies {
                if let Some(&target) = aliases.get(dependency.as_str())
                    && target != own
                    && !depends_on.iter().any(|d| d == target)
                {
                    depends_on.push(target.to_string());
                }
            }
            depends_on
        })
        .collect();
    let mut steps: Vec<RankedStep> = groups
        .into_iter()
        .zip(links)
        .map(|(group, depends_on)| RankedStep {
            depends_on,
            ..group.into_ranked()
        })
        .collect();
    steps.sort_by(rank_order);
    let steps = order_by_dependencies(steps);

    let confidence = overall_confidence(&steps);
    tracing::debug!(
        steps = steps.len(),
        confidence = confidence,
        "Synthesized ranked steps"
    );

    Synthesis { steps, confidence }
}

/// Walk the ranked list in order, pulling each step's prerequisites in
/// just ahead of it. A dependency still unplaced when its step is emitted
/// closes a cycle and is dropped.
fn order_by_dependencies(ranked: Vec<RankedStep>) -> Vec<RankedStep> {
    let positions: HashMap<String, usize> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| (r.step.step_id.clone(), i))
        .collect();
    let mut slots: Vec<Option<RankedStep>> = ranked.into_iter().map(Some).collect();
    let mut walk = DependencyWalk {
        positions: &positions,
        visiting: HashSet::new(),
        placed: HashSet::new(),
        ordered: Vec::with_capacity(slots.len()),
    };
    for index in 0..slots.len() {
        walk.place(index, &mut slots);
    }
    walk.ordered
}

struct DependencyWalk<'p> {
    positions: &'p HashMap<String, usize>,
    visiting: HashSet<usize>,
    placed: HashSet<String>,
    ordered: Vec<RankedStep>,
}

impl DependencyWalk<'_> {
    fn place(&mut self, index: usize, slots: &mut [Option<RankedStep>]) {
        let Some(pending) = slots[index].as_ref() else {
            return;
        };
        if !self.visiting.insert(index) {
            return;
        }
        let prerequisites: Vec<usize> = pending
            .depends_on
            .iter()
            .filter_map(|d| self.positions.get(d).copied())
            .collect();
        for prerequisite in prerequisites {
            self.place(prerequisite, slots);
        }

        let Some(mut step) = slots[index].take() else {
            return;
        };
        let placed = &self.placed;
        step.depends_on.retain(|d| {
            let met = placed.contains(d);
            if !met {
                tracing::debug!(step = %step.step.step_id, dependency = %d, "Dropping cyclic dependency");
            }
            met
        });
        self.placed.insert(step.step.step_id.clone());
        self.ordered.push(step);
    }
}

fn rank_order(a: &RankedStep, b: &RankedStep) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(a.round.cmp(&b.round))
        .then(a.agent_index.cmp(&b.agent_index))
}

/// Weighted mean of ranked confidences, weight = corroboration count.
pub fn overall_confidence(steps: &[RankedStep]) -> f64 {
    let weight: usize = steps.iter().map(RankedStep::corroboration).sum();
    if weight == 0 {
        return 0.0;
    }
    let total: f64 = steps
        .iter()
        .map(|s| s.confidence * s.corroboration() as f64)
        .sum();
    total / weight as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StepType;

    fn agent(director: &str, index: usize, steps: Vec<(StepType, &str, f64)>) -> AgentSteps {
        AgentSteps {
            director_id: director.to_string(),
            agent_index: index,
            round: 0,
            steps: steps
                .into_iter()
                .enumerate()
                .map(|(i, (t, d, c))| {
                    Step::new(format!("{}-r0-s{}", director, i + 1), director, t, d, c)
                })
                .collect(),
        }
    }

    #[test]
    fn test_three_director_scenario() {
        let inputs = vec![
            agent("A", 0, vec![(StepType::Transition, "add fade between clip1/clip2", 0.8)]),
            agent("B", 1, vec![(StepType::Transition, "add fade between clip1/clip2", 0.6)]),
            agent("C", 2, vec![(StepType::Caption, "add title card", 0.4)]),
        ];

        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.steps.len(), 2);

        let first = &result.steps[0];
        assert_eq!(first.step.step_type, StepType::Transition);
        assert!((first.confidence - 0.7).abs() < 1e-9);
        assert_eq!(first.corroborated_by, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(first.step.director_id, "A");

        let second = &result.steps[1];
        assert_eq!(second.step.step_type, StepType::Caption);
        assert!((second.confidence - 0.4).abs() < 1e-9);

        // (0.7 * 2 + 0.4 * 1) / 3
        assert!((result.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_representative_is_not_mutated() {
        let inputs = vec![
            agent("A", 0, vec![(StepType::Trim, "trim intro", 0.9)]),
            agent("B", 1, vec![(StepType::Trim, "trim intro", 0.5)]),
        ];
        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.steps[0].step, inputs[0].steps[0]);
        assert_eq!(result.steps[0].step.confidence, 0.9);
        assert!((result.steps[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_clearly_distinct_steps_stay_separate() {
        let inputs = vec![
            agent("A", 0, vec![(StepType::Trim, "trim the intro", 0.5)]),
            agent("B", 1, vec![(StepType::AdjustAudio, "trim the intro", 0.5)]),
            agent("C", 2, vec![(StepType::Trim, "remove silence near the end credits", 0.5)]),
        ];
        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.steps.len(), 3);
        assert!(result.steps.iter().all(|s| s.corroboration() == 1));
    }

    #[test]
    fn test_same_director_never_corroborates_itself() {
        let inputs = vec![agent(
            "A",
            0,
            vec![
                (StepType::Trim, "trim intro", 0.6),
                (StepType::Trim, "trim intro", 0.6),
            ],
        )];
        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.steps.len(), 2);
    }

    #[test]
    fn test_ties_broken_by_round_then_agent_order() {
        let mut late = agent("A", 0, vec![(StepType::Effect, "warm color grade", 0.5)]);
        late.round = 1;
        let inputs = vec![
            late,
            agent("B", 1, vec![(StepType::Trim, "trim outro", 0.5)]),
            agent("C", 2, vec![(StepType::Caption, "add subtitles", 0.5)]),
        ];
        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        let order: Vec<_> = result
            .steps
            .iter()
            .map(|s| s.step.director_id.as_str())
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_overall_confidence_within_bounds() {
        let inputs = vec![
            agent(
                "A",
                0,
                vec![
                    (StepType::Trim, "trim intro", 0.9),
                    (StepType::Caption, "add lower third", 0.2),
                ],
            ),
            agent("B", 1, vec![(StepType::Trim, "trim intro", 0.3)]),
        ];
        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        assert!(result.confidence >= 0.2 && result.confidence <= 0.9);
    }

    #[test]
    fn test_dependencies_hold_rank_order() {
        let mut a = agent(
            "A",
            0,
            vec![
                (StepType::SplitClip, "split the interview at 0:42", 0.3),
                (StepType::ReorderClips, "move b-roll before the interview", 0.9),
            ],
        );
        a.steps[1].dependencies = vec!["A-r0-s1".to_string()];
        let inputs = vec![a, agent("B", 1, vec![(StepType::Caption, "add title card", 0.5)])];

        let result = synthesize(&inputs, DEFAULT_SIMILARITY_THRESHOLD);
        let order: Vec<_> = result.steps.iter().map(|s| s.step.step_id.as_str()).collect();
        // The reorder ranks first and pulls its split in just ahead
        assert_eq!(order, vec!["A-r0-s1", "A-r0-s2", "B-r0-s1"]);
        assert_eq!(result.steps[1].depends_on, vec!["A-r0-s1".to_string()]);
        assert!(result.steps[0].depends_on.is_empty());
    }

    #[test]
    fn test_dependencies_follow_merged_representative() {
        let a = agent("A", 0, vec![(StepType::Trim, "trim dead air", 0.8)]);
        let mut b = agent(
            "B",
            1,
            vec![
                (StepType::Trim, "trim dead air", 0.6),
                (StepType::Transition, "fade after the trim", 0.9),
            ],
        );
        b.steps[1].dependencies = vec!["B-r0-s1".to_string()];

        let result = synthesize(&[a, b], DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].step.step_id, "A-r0-s1");
        assert_eq!(result.steps[1].depends_on, vec!["A-r0-s1".to_string()]);
        // The representative step itself is untouched
        assert_eq!(result.steps[1].step.dependencies, vec!["B-r0-s1".to_string()]);
    }

    #[test]
    fn test_cyclic_dependencies_are_broken_in_rank_order() {
        let mut a = agent(
            "A",
            0,
            vec![
                (StepType::Trim, "trim the intro", 0.6),
                (StepType::Caption, "add title card", 0.9),
            ],
        );
        a.steps[0].dependencies = vec!["A-r0-s2".to_string()];
        a.steps[1].dependencies = vec!["A-r0-s1".to_string()];

        let result = synthesize(&[a], DEFAULT_SIMILARITY_THRESHOLD);
        // The caption ranks first and pulls the trim ahead of it; the trim's
        // edge back to the caption is the one dropped.
        let order: Vec<_> = result.steps.iter().map(|s| s.step.step_id.as_str()).collect();
        assert_eq!(order, vec!["A-r0-s1", "A-r0-s2"]);
        assert!(result.steps[0].depends_on.is_empty());
        assert_eq!(result.steps[1].depends_on, vec!["A-r0-s1".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        let result = synthesize(&[], DEFAULT_SIMILARITY_THRESHOLD);
        assert!(result.steps.is_empty());
        assert_eq!(result.confidence, 0.0);
    }
}
