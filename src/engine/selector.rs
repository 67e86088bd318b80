use crate::workflow::WorkflowGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Corpus complexity at or above which structural analysis is added.
pub const STRUCTURAL_THRESHOLD: f64 = 5.0;
/// Corpus complexity at or above which clustering is added as well.
pub const HYBRID_THRESHOLD: f64 = 15.0;

/// How much analysis a run performs on top of itemset mining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ItemsetOnly,
    ItemsetStructural,
    #[default]
    FullHybrid,
}

impl Strategy {
    pub fn includes_structural(self) -> bool {
        matches!(self, Strategy::ItemsetStructural | Strategy::FullHybrid)
    }

    pub fn includes_clustering(self) -> bool {
        matches!(self, Strategy::FullHybrid)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::ItemsetOnly => "itemset_only",
            Strategy::ItemsetStructural => "itemset_structural",
            Strategy::FullHybrid => "full_hybrid",
        };
        write!(f, "{}", name)
    }
}

/// Accumulates corpus size as workflows stream past, then picks a strategy
/// from `mean(nodes) + 0.5 * mean(edges)`.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveSelector {
    workflows: usize,
    nodes: usize,
    edges: usize,
}

impl AdaptiveSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, workflow: &WorkflowGraph) {
        self.workflows += 1;
        self.nodes += workflow.nodes.len();
        self.edges += workflow.edges.len();
    }

    pub fn observed(&self) -> usize {
        self.workflows
    }

    pub fn complexity(&self) -> f64 {
        if self.workflows == 0 {
            return 0.0;
        }
        let n = self.workflows as f64;
        self.nodes as f64 / n + 0.5 * (self.edges as f64 / n)
    }

    pub fn select(&self) -> Strategy {
        let complexity = self.complexity();
        if self.workflows == 0 || complexity < STRUCTURAL_THRESHOLD {
            Strategy::ItemsetOnly
        } else if complexity < HYBRID_THRESHOLD {
            Strategy::ItemsetStructural
        } else {
            Strategy::FullHybrid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{WorkflowEdge, WorkflowNode};

    fn chain(len: usize) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new("w", "w");
        for i in 0..len {
            graph = graph.with_node(WorkflowNode::new(&i.to_string(), "n", "t"));
        }
        for i in 1..len {
            graph = graph.with_edge(WorkflowEdge::new(&(i - 1).to_string(), &i.to_string()));
        }
        graph
    }

    fn select_for(len: usize) -> Strategy {
        let mut selector = AdaptiveSelector::new();
        for _ in 0..3 {
            selector.observe(&chain(len));
        }
        selector.select()
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(AdaptiveSelector::new().select(), Strategy::ItemsetOnly);
        // 3 + 0.5 * 2 = 4
        assert_eq!(select_for(3), Strategy::ItemsetOnly);
        // 4 + 0.5 * 3 = 5.5
        assert_eq!(select_for(4), Strategy::ItemsetStructural);
        // 10 + 0.5 * 9 = 14.5
        assert_eq!(select_for(10), Strategy::ItemsetStructural);
        // 11 + 0.5 * 10 = 16
        assert_eq!(select_for(11), Strategy::FullHybrid);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Strategy::ItemsetStructural).unwrap(),
            "\"itemset_structural\""
        );
        assert_eq!(Strategy::FullHybrid.to_string(), "full_hybrid");
    }
}
