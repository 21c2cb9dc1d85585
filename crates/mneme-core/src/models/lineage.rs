use serde::{Deserialize, Serialize};

/// One child→parent link discovered by the recursive lineage walk.
/// `depth` is the distance of the parent from the walk's root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageLink {
    pub child_id: String,
    pub parent_id: String,
    pub depth: u32,
}

/// A node in a traced lineage tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    pub id: String,
    pub depth: u32,
    /// `None` when the referenced parent no longer exists.
    pub confidence: Option<f64>,
    pub l_score: Option<f64>,
}

/// Directed derivation edge (child derived from parent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub child_id: String,
    pub parent_id: String,
}

/// Bounded lineage of a root entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageTree {
    pub root_id: String,
    pub max_depth: u32,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
    /// Nodes at the depth bound still have unexplored parents.
    pub truncated: bool,
    /// The explored subgraph contains a cycle.
    pub has_cycle: bool,
}

impl LineageTree {
    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn ancestor_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|n| n.depth > 0)
            .map(|n| n.id.as_str())
    }
}
