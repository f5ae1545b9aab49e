//! Plan graph nodes and the read-only graph snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use super::builder::GraphError;

/// Sequential node id, unique within a run. The root is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Branch,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Running,
    Completed,
    Failed,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGraphNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub node_type: NodeType,
    pub label: String,
    pub description: String,
    pub status: NodeStatus,
    /// Branch key for branch nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    /// Result preview for steps, closing note for branches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PlanGraphNode {
    pub(crate) fn new(
        id: NodeId,
        parent_id: Option<NodeId>,
        node_type: NodeType,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            parent_id,
            node_type,
            label: label.into(),
            description: description.into(),
            status: NodeStatus::Running,
            branch_key: None,
            tool_name: None,
            arguments: None,
            result: None,
            created_at: Utc::now(),
        }
    }
}

/// One step as listed in [`PlanGraph::breakdown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBrief {
    pub label: String,
    pub tool_name: String,
    pub status: NodeStatus,
    pub result_preview: String,
}

/// Tree of a run, stored flat in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGraph {
    pub run_id: String,
    pub prompt: String,
    pub nodes: Vec<PlanGraphNode>,
    pub finalized: bool,
}

impl PlanGraph {
    pub fn root(&self) -> Option<&PlanGraphNode> {
        self.nodes.first()
    }

    pub fn get(&self, id: NodeId) -> Option<&PlanGraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PlanGraphNode> {
        self.nodes.iter().filter(move |n| n.parent_id == Some(id))
    }

    pub fn branches(&self) -> impl Iterator<Item = &PlanGraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Branch)
    }

    pub fn step_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Step)
            .count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check the tree invariant: unique ids, a single root first, and every
    /// other node's parent inserted before it.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for (index, node) in self.nodes.iter().enumerate() {
            match (index, node.node_type, node.parent_id) {
                (0, NodeType::Root, None) => {}
                (0, _, _) => {
                    return Err(GraphError::InvalidTree(
                        "first node must be a parentless root".to_string(),
                    ));
                }
                (_, NodeType::Root, _) | (_, _, None) => {
                    return Err(GraphError::InvalidTree(format!(
                        "node {} is a second root",
                        node.id
                    )));
                }
                (_, _, Some(parent)) if !seen.contains(&parent) => {
                    return Err(GraphError::InvalidTree(format!(
                        "node {} references parent {} not inserted before it",
                        node.id, parent
                    )));
                }
                _ => {}
            }
            if !seen.insert(node.id) {
                return Err(GraphError::InvalidTree(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }
        Ok(())
    }

    /// Step briefs grouped by branch label, branches in insertion order.
    pub fn breakdown(&self) -> Vec<(String, Vec<StepBrief>)> {
        self.branches()
            .map(|branch| {
                let steps = self
                    .children(branch.id)
                    .filter(|n| n.node_type == NodeType::Step)
                    .map(|step| StepBrief {
                        label: step.label.clone(),
                        tool_name: step.tool_name.clone().unwrap_or_default(),
                        status: step.status,
                        result_preview: crate::core::string::preview(
                            step.result.as_deref().unwrap_or_default(),
                            200,
                        ),
                    })
                    .collect();
                (branch.label.clone(), steps)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: Vec<PlanGraphNode>) -> PlanGraph {
        PlanGraph {
            run_id: "run".to_string(),
            prompt: "p".to_string(),
            nodes,
            finalized: true,
        }
    }

    #[test]
    fn test_validate_accepts_tree() {
        let g = graph(vec![
            PlanGraphNode::new(NodeId(0), None, NodeType::Root, "Plan", ""),
            PlanGraphNode::new(NodeId(1), Some(NodeId(0)), NodeType::Branch, "A", ""),
            PlanGraphNode::new(NodeId(2), Some(NodeId(1)), NodeType::Step, "List Clips", ""),
        ]);
        assert!(g.validate().is_ok());
        assert_eq!(g.children(NodeId(0)).count(), 1);
        assert_eq!(g.step_count(), 1);
    }

    #[test]
    fn test_validate_rejects_forward_parent() {
        let g = graph(vec![
            PlanGraphNode::new(NodeId(0), None, NodeType::Root, "Plan", ""),
            PlanGraphNode::new(NodeId(1), Some(NodeId(2)), NodeType::Step, "x", ""),
            PlanGraphNode::new(NodeId(2), Some(NodeId(0)), NodeType::Branch, "A", ""),
        ]);
        assert!(matches!(g.validate(), Err(GraphError::InvalidTree(_))));
    }

    #[test]
    fn test_validate_rejects_missing_root_and_duplicates() {
        let g = graph(vec![PlanGraphNode::new(
            NodeId(0),
            None,
            NodeType::Branch,
            "A",
            "",
        )]);
        assert!(g.validate().is_err());

        let g = graph(vec![
            PlanGraphNode::new(NodeId(0), None, NodeType::Root, "Plan", ""),
            PlanGraphNode::new(NodeId(0), Some(NodeId(0)), NodeType::Branch, "A", ""),
        ]);
        assert!(g.validate().is_err());
    }
}
