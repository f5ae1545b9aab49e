//! Single-writer plan graph builder.

use std::collections::HashMap;

use thiserror::Error;

use super::event::{BranchKey, InvocationId, RunEvent};
use super::node::{NodeId, NodeStatus, NodeType, PlanGraph, PlanGraphNode};
use crate::core::string::{friendly_tool_label, preview};
use crate::plan::ReportStatus;

/// Characters of a tool result kept on a step node
pub const RESULT_PREVIEW_CHARS: usize = 500;

const GENERAL_BRANCH: &str = "general";

/// Result recorded on nodes still open when the graph is frozen
pub const ABANDONED_NOTE: &str = "abandoned at run end";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph is finalized")]
    Finalized,

    #[error("run already started")]
    AlreadyStarted,

    #[error("branch '{0}' already exists")]
    DuplicateBranch(String),

    #[error("unknown branch '{0}'")]
    UnknownBranch(String),

    #[error("invocation {0} already started")]
    DuplicateInvocation(u64),

    #[error("unknown or already finished invocation {0}")]
    UnknownInvocation(u64),

    #[error("invalid tree: {0}")]
    InvalidTree(String),
}

/// Applies run events to a growing [`PlanGraph`].
///
/// Each accepted event appends exactly one node or finalizes exactly one
/// node. Per-branch state is keyed by [`BranchKey`], so events of different
/// branches may interleave freely.
#[derive(Debug)]
pub struct PlanGraphBuilder {
    graph: PlanGraph,
    next_id: u32,
    branches: HashMap<BranchKey, NodeId>,
    pending: HashMap<InvocationId, NodeId>,
}

impl PlanGraphBuilder {
    /// Start a graph with its root node.
    pub fn new(run_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let root = PlanGraphNode::new(NodeId(0), None, NodeType::Root, "Director plan", &prompt);
        Self {
            graph: PlanGraph {
                run_id: run_id.into(),
                prompt,
                nodes: vec![root],
                finalized: false,
            },
            next_id: 1,
            branches: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, mut node: PlanGraphNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.id = id;
        self.graph.nodes.push(node);
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut PlanGraphNode> {
        self.graph.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Apply one event. Events that do not shape the tree are accepted and ignored.
    pub fn apply(&mut self, event: &RunEvent) -> Result<(), GraphError> {
        if self.graph.finalized {
            return Err(GraphError::Finalized);
        }

        match event {
            RunEvent::RunStarted { .. } => Err(GraphError::AlreadyStarted),
            RunEvent::BranchStarted {
                branch,
                label,
                description,
                ..
            } => self.start_branch(branch, label, description).map(|_| ()),
            RunEvent::BranchEnded {
                branch,
                status,
                note,
            } => self.end_branch(branch, *status, note),
            RunEvent::StepStarted {
                invocation,
                branch,
                tool_name,
                arguments,
            } => self.start_step(*invocation, branch.as_ref(), tool_name, arguments),
            RunEvent::StepCompleted { invocation, result } => {
                self.finish_step(*invocation, NodeStatus::Completed, result)
            }
            RunEvent::StepFailed { invocation, error } => {
                self.finish_step(*invocation, NodeStatus::Failed, &error.to_string())
            }
            RunEvent::PhaseChanged { .. } | RunEvent::Debate { .. } => Ok(()),
        }
    }

    fn start_branch(
        &mut self,
        key: &BranchKey,
        label: &str,
        description: &str,
    ) -> Result<NodeId, GraphError> {
        if self.branches.contains_key(key) {
            return Err(GraphError::DuplicateBranch(key.to_string()));
        }
        let mut node = PlanGraphNode::new(
            NodeId(0),
            Some(self.root_id()),
            NodeType::Branch,
            label,
            description,
        );
        node.branch_key = Some(key.to_string());
        let id = self.push(node);
        self.branches.insert(key.clone(), id);
        tracing::trace!(branch = %key, node = %id, "Graph branch started");
        Ok(id)
    }

    fn end_branch(
        &mut self,
        key: &BranchKey,
        status: ReportStatus,
        note: &str,
    ) -> Result<(), GraphError> {
        let id = *self
            .branches
            .get(key)
            .ok_or_else(|| GraphError::UnknownBranch(key.to_string()))?;
        if let Some(node) = self.node_mut(id) {
            node.status = match status {
                ReportStatus::Failed => NodeStatus::Failed,
                ReportStatus::Complete | ReportStatus::Degenerate => NodeStatus::Completed,
            };
            if !note.is_empty() {
                node.result = Some(preview(note, RESULT_PREVIEW_CHARS));
            }
        }
        Ok(())
    }

    fn branch_for_step(&mut self, key: Option<&BranchKey>) -> Result<NodeId, GraphError> {
        match key {
            Some(key) => self
                .branches
                .get(key)
                .copied()
                .ok_or_else(|| GraphError::UnknownBranch(key.to_string())),
            None => {
                let general = BranchKey::new(GENERAL_BRANCH);
                match self.branches.get(&general) {
                    Some(id) => Ok(*id),
                    None => self.start_branch(&general, "General", ""),
                }
            }
        }
    }

    fn start_step(
        &mut self,
        invocation: InvocationId,
        branch: Option<&BranchKey>,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<(), GraphError> {
        if self.pending.contains_key(&invocation) {
            return Err(GraphError::DuplicateInvocation(invocation.0));
        }
        let parent = self.branch_for_step(branch)?;
        let mut node = PlanGraphNode::new(
            NodeId(0),
            Some(parent),
            NodeType::Step,
            friendly_tool_label(tool_name),
            "",
        );
        node.tool_name = Some(tool_name.to_string());
        node.arguments = Some(arguments.clone());
        let id = self.push(node);
        self.pending.insert(invocation, id);
        Ok(())
    }

    fn finish_step(
        &mut self,
        invocation: InvocationId,
        status: NodeStatus,
        result: &str,
    ) -> Result<(), GraphError> {
        let id = self
            .pending
            .remove(&invocation)
            .ok_or(GraphError::UnknownInvocation(invocation.0))?;
        if let Some(node) = self.node_mut(id) {
            node.status = status;
            node.result = Some(preview(result, RESULT_PREVIEW_CHARS));
        }
        Ok(())
    }

    /// Read-only copy of the current tree.
    pub fn snapshot(&self) -> PlanGraph {
        self.graph.clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.graph.finalized
    }

    /// Freeze the tree. Later events are rejected.
    ///
    /// Steps whose tool call never reported back, and agent branches that
    /// never ended, are settled as failed so no node stays `running`. The
    /// implicit `General` branch has no end event and is closed as completed.
    pub fn finalize(&mut self) -> PlanGraph {
        if self.graph.finalized {
            return self.graph.clone();
        }

        let abandoned: Vec<NodeId> = self.pending.drain().map(|(_, id)| id).collect();
        if !abandoned.is_empty() {
            tracing::debug!(steps = abandoned.len(), "Settling unfinished steps at finalize");
        }
        for id in abandoned {
            if let Some(node) = self.node_mut(id) {
                node.status = NodeStatus::Failed;
                node.result = Some(ABANDONED_NOTE.to_string());
            }
        }

        let general = self.branches.get(&BranchKey::new(GENERAL_BRANCH)).copied();
        for node in self.graph.nodes.iter_mut() {
            if node.node_type != NodeType::Branch || node.status != NodeStatus::Running {
                continue;
            }
            if Some(node.id) == general {
                node.status = NodeStatus::Completed;
            } else {
                node.status = NodeStatus::Failed;
                node.result.get_or_insert_with(|| ABANDONED_NOTE.to_string());
            }
        }

        self.graph.finalized = true;
        if let Some(root) = self.graph.nodes.first_mut() {
            root.status = NodeStatus::Completed;
        }
        self.graph.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolError;
    use serde_json::json;

    fn branch_started(key: &str) -> RunEvent {
        RunEvent::BranchStarted {
            branch: BranchKey::new(key),
            director_id: key.to_string(),
            label: format!("Director {}", key),
            description: String::new(),
        }
    }

    fn step_started(id: u64, branch: Option<&str>, tool: &str) -> RunEvent {
        RunEvent::StepStarted {
            invocation: InvocationId(id),
            branch: branch.map(BranchKey::new),
            tool_name: tool.to_string(),
            arguments: json!({"track": 1}),
        }
    }

    fn completed(id: u64, result: &str) -> RunEvent {
        RunEvent::StepCompleted {
            invocation: InvocationId(id),
            result: result.to_string(),
        }
    }

    #[test]
    fn test_interleaved_branches_build_a_tree() {
        let mut builder = PlanGraphBuilder::new("run-1", "tighten the edit");
        let events = vec![
            branch_started("a"),
            branch_started("b"),
            step_started(1, Some("a"), "list_clips"),
            step_started(2, Some("b"), "analyze_audio_levels"),
            completed(2, "{\"peak\": -3}"),
            completed(1, "[]"),
            step_started(3, Some("a"), "add_transition_tool"),
            RunEvent::StepFailed {
                invocation: InvocationId(3),
                error: ToolError::timeout("add_transition_tool", 5),
            },
        ];
        for event in &events {
            builder.apply(event).unwrap();
        }

        let graph = builder.finalize();
        assert!(graph.validate().is_ok());
        assert_eq!(graph.len(), 6);

        let a = graph.branches().find(|b| b.label == "Director a").unwrap();
        let a_steps: Vec<_> = graph.children(a.id).map(|n| n.label.as_str()).collect();
        assert_eq!(a_steps, vec!["List Clips", "Add Transition"]);

        let failed = graph.children(a.id).last().unwrap();
        assert_eq!(failed.status, NodeStatus::Failed);
        assert!(failed.result.as_ref().unwrap().contains("timeout"));

        let b = graph.branches().find(|b| b.label == "Director b").unwrap();
        let b_step = graph.children(b.id).next().unwrap();
        assert_eq!(b_step.status, NodeStatus::Completed);
        assert_eq!(b_step.arguments, Some(json!({"track": 1})));
    }

    #[test]
    fn test_finalize_settles_open_nodes() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&branch_started("slow")).unwrap();
        builder.apply(&step_started(1, Some("slow"), "render_preview")).unwrap();
        builder.apply(&step_started(2, None, "list_clips")).unwrap();
        builder.apply(&completed(2, "[]")).unwrap();

        let graph = builder.finalize();
        assert!(graph.nodes.iter().all(|n| n.status != NodeStatus::Running));

        let step = graph.nodes.iter().find(|n| n.label == "Render Preview").unwrap();
        assert_eq!(step.status, NodeStatus::Failed);
        assert_eq!(step.result.as_deref(), Some(ABANDONED_NOTE));

        let slow = graph.branches().find(|b| b.label == "Director slow").unwrap();
        assert_eq!(slow.status, NodeStatus::Failed);
        let general = graph.branches().find(|b| b.label == "General").unwrap();
        assert_eq!(general.status, NodeStatus::Completed);

        // The straggler reporting back afterwards changes nothing.
        assert_eq!(builder.apply(&completed(1, "done")), Err(GraphError::Finalized));
        assert_eq!(builder.snapshot(), graph);
    }

    #[test]
    fn test_stepless_branch_uses_general() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&step_started(1, None, "get_project_summary")).unwrap();
        builder.apply(&step_started(2, None, "list_clips")).unwrap();

        let graph = builder.snapshot();
        let general: Vec<_> = graph.branches().collect();
        assert_eq!(general.len(), 1);
        assert_eq!(general[0].label, "General");
        assert_eq!(graph.children(general[0].id).count(), 2);
    }

    #[test]
    fn test_result_preview_truncated() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&branch_started("a")).unwrap();
        builder.apply(&step_started(1, Some("a"), "list_clips")).unwrap();
        builder.apply(&completed(1, &"x".repeat(800))).unwrap();

        let graph = builder.snapshot();
        let step = graph.nodes.last().unwrap();
        let result = step.result.as_ref().unwrap();
        assert_eq!(result.len(), RESULT_PREVIEW_CHARS + 3);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_late_completion_after_branch_end() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&branch_started("a")).unwrap();
        builder.apply(&step_started(1, Some("a"), "list_clips")).unwrap();
        builder
            .apply(&RunEvent::BranchEnded {
                branch: BranchKey::new("a"),
                status: ReportStatus::Failed,
                note: "run deadline exceeded".to_string(),
            })
            .unwrap();
        builder.apply(&completed(1, "[]")).unwrap();

        let graph = builder.snapshot();
        let branch = graph.branches().next().unwrap();
        assert_eq!(branch.status, NodeStatus::Failed);
        assert_eq!(graph.nodes.last().unwrap().status, NodeStatus::Completed);
    }

    #[test]
    fn test_rejections() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&branch_started("a")).unwrap();
        assert_eq!(
            builder.apply(&branch_started("a")),
            Err(GraphError::DuplicateBranch("a".to_string()))
        );
        assert_eq!(
            builder.apply(&step_started(1, Some("zzz"), "list_clips")),
            Err(GraphError::UnknownBranch("zzz".to_string()))
        );
        assert_eq!(
            builder.apply(&completed(9, "")),
            Err(GraphError::UnknownInvocation(9))
        );

        let before = builder.snapshot().len();
        builder.finalize();
        assert_eq!(
            builder.apply(&branch_started("b")),
            Err(GraphError::Finalized)
        );
        assert_eq!(builder.snapshot().len(), before);
    }

    #[test]
    fn test_breakdown_groups_by_branch_label() {
        let mut builder = PlanGraphBuilder::new("run", "p");
        builder.apply(&branch_started("a")).unwrap();
        builder.apply(&step_started(1, Some("a"), "list_clips")).unwrap();
        builder.apply(&completed(1, "[]")).unwrap();
        builder.apply(&branch_started("b")).unwrap();

        let breakdown = builder.snapshot().breakdown();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].0, "Director a");
        assert_eq!(breakdown[0].1[0].tool_name, "list_clips");
        assert!(breakdown[1].1.is_empty());
    }
}
