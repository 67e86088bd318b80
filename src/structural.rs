//! Graph-shape detectors that run across a whole corpus of workflows.
//!
//! Detectors work on [`WorkflowTopology`], a projection of a workflow without
//! parameters, so callers can keep topologies around while the full graphs
//! stream past.

use crate::workflow::WorkflowGraph;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    pub node_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub source: String,
    pub source_port: String,
    pub target: String,
}

/// Ids, types and edges of a workflow; nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTopology {
    pub workflow_id: String,
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

impl From<&WorkflowGraph> for WorkflowTopology {
    fn from(workflow: &WorkflowGraph) -> Self {
        Self {
            workflow_id: workflow.id.clone(),
            nodes: workflow
                .nodes
                .iter()
                .map(|n| TopologyNode {
                    id: n.id.clone(),
                    node_type: n.node_type.clone(),
                })
                .collect(),
            edges: workflow
                .edges
                .iter()
                .map(|e| TopologyEdge {
                    source: e.source.clone(),
                    source_port: e.source_port.clone(),
                    target: e.target.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubPattern {
    pub workflow_id: String,
    pub node_id: String,
    pub node_type: String,
    /// In-degree plus out-degree, counted in edges.
    pub connections: usize,
    pub in_degree: usize,
    pub out_degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclePattern {
    pub workflow_id: String,
    pub node_ids: Vec<String>,
    pub node_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchPattern {
    pub workflow_id: String,
    pub node_id: String,
    pub node_type: String,
    pub branch_count: usize,
    pub output_ports: Vec<String>,
    pub successor_types: Vec<String>,
}

/// A linear chain of node types seen across the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialPattern {
    pub type_chain: Vec<String>,
    pub occurrences: usize,
    pub workflow_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralPatterns {
    pub hub_patterns: Vec<HubPattern>,
    pub cycle_patterns: Vec<CyclePattern>,
    pub branch_patterns: Vec<BranchPattern>,
    pub sequential_patterns: Vec<SequentialPattern>,
}

impl StructuralPatterns {
    pub fn total(&self) -> usize {
        self.hub_patterns.len()
            + self.cycle_patterns.len()
            + self.branch_patterns.len()
            + self.sequential_patterns.len()
    }
}

#[derive(Debug, Clone)]
pub struct StructuralGraphAnalyzer {
    hub_threshold: usize,
    min_chain_length: usize,
}

impl Default for StructuralGraphAnalyzer {
    fn default() -> Self {
        Self {
            hub_threshold: 3,
            min_chain_length: 3,
        }
    }
}

impl StructuralGraphAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node is a hub when its edge count is strictly above `threshold`.
    pub fn with_hub_threshold(mut self, threshold: usize) -> Self {
        self.hub_threshold = threshold;
        self
    }

    pub fn with_min_chain_length(mut self, length: usize) -> Self {
        self.min_chain_length = length.max(2);
        self
    }

    pub fn analyze_workflows(&self, workflows: &[WorkflowGraph]) -> StructuralPatterns {
        let topologies: Vec<WorkflowTopology> =
            workflows.iter().map(WorkflowTopology::from).collect();
        self.analyze(&topologies)
    }

    pub fn analyze(&self, topologies: &[WorkflowTopology]) -> StructuralPatterns {
        let mut patterns = StructuralPatterns::default();
        let mut chains: BTreeMap<Vec<String>, (usize, AHashSet<String>)> = BTreeMap::new();

        for topology in topologies {
            let view = TopologyView::new(topology);
            patterns.hub_patterns.extend(self.hubs(&view));
            patterns.cycle_patterns.extend(cycles(&view));
            patterns.branch_patterns.extend(branches(&view));
            for chain in self.chains(&view) {
                let entry = chains.entry(chain).or_default();
                entry.0 += 1;
                entry.1.insert(topology.workflow_id.clone());
            }
        }

        patterns.sequential_patterns = chains
            .into_iter()
            .map(|(type_chain, (occurrences, workflows))| SequentialPattern {
                type_chain,
                occurrences,
                workflow_count: workflows.len(),
            })
            .sorted_by(|a, b| {
                b.occurrences
                    .cmp(&a.occurrences)
                    .then_with(|| a.type_chain.cmp(&b.type_chain))
            })
            .collect();

        debug!(
            workflows = topologies.len(),
            hubs = patterns.hub_patterns.len(),
            cycles = patterns.cycle_patterns.len(),
            branches = patterns.branch_patterns.len(),
            chains = patterns.sequential_patterns.len(),
            "structural analysis finished"
        );
        patterns
    }

    fn hubs(&self, view: &TopologyView<'_>) -> Vec<HubPattern> {
        view.node_ids
            .iter()
            .filter_map(|&id| {
                let in_degree = view.predecessors(id).len();
                let out_degree = view.successors(id).len();
                (in_degree + out_degree > self.hub_threshold).then(|| HubPattern {
                    workflow_id: view.workflow_id.to_string(),
                    node_id: id.to_string(),
                    node_type: view.type_of(id).to_string(),
                    connections: in_degree + out_degree,
                    in_degree,
                    out_degree,
                })
            })
            .collect()
    }

    fn chains(&self, view: &TopologyView<'_>) -> Vec<Vec<String>> {
        let is_interior = |id: &str| view.predecessors(id).len() == 1 && view.successors(id).len() == 1;

        let mut chains = Vec::new();
        for &start in &view.node_ids {
            if is_interior(start) {
                continue;
            }
            for next in view.successors(start).iter().copied().unique() {
                let mut path = vec![start];
                let mut current = next;
                loop {
                    if path.contains(&current) {
                        break;
                    }
                    path.push(current);
                    if !is_interior(current) {
                        break;
                    }
                    current = view.successors(current)[0];
                }
                if path.len() >= self.min_chain_length {
                    chains.push(path.iter().map(|id| view.type_of(id).to_string()).collect());
                }
            }
        }
        chains
    }
}

fn cycles(view: &TopologyView<'_>) -> Vec<CyclePattern> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: AHashMap<&str, NodeIndex> = AHashMap::new();
    for &id in &view.node_ids {
        indices.insert(id, graph.add_node(id));
    }
    let mut self_loops: AHashSet<&str> = AHashSet::new();
    for edge in &view.topology.edges {
        let (Some(&s), Some(&t)) = (indices.get(edge.source.as_str()), indices.get(edge.target.as_str()))
        else {
            continue;
        };
        if s == t {
            self_loops.insert(edge.source.as_str());
        }
        graph.add_edge(s, t, ());
    }

    let position: AHashMap<&str, usize> = view
        .node_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let mut components: Vec<Vec<&str>> = tarjan_scc(&graph)
        .into_iter()
        .map(|scc| scc.into_iter().map(|idx| graph[idx]).collect::<Vec<&str>>())
        .filter(|ids| ids.len() > 1 || ids.iter().any(|id| self_loops.contains(id)))
        .map(|mut ids| {
            ids.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
            ids
        })
        .collect();
    components.sort_by_key(|ids| ids.first().and_then(|id| position.get(id).copied()));

    components
        .into_iter()
        .map(|ids| CyclePattern {
            workflow_id: view.workflow_id.to_string(),
            node_types: ids.iter().map(|id| view.type_of(id).to_string()).collect(),
            node_ids: ids.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

fn branches(view: &TopologyView<'_>) -> Vec<BranchPattern> {
    view.node_ids
        .iter()
        .filter_map(|&id| {
            let successors: Vec<&str> = view.successors(id).iter().copied().unique().collect();
            if successors.len() < 2 {
                return None;
            }
            let output_ports = view
                .topology
                .edges
                .iter()
                .filter(|e| e.source == id)
                .map(|e| e.source_port.clone())
                .unique()
                .collect();
            Some(BranchPattern {
                workflow_id: view.workflow_id.to_string(),
                node_id: id.to_string(),
                node_type: view.type_of(id).to_string(),
                branch_count: successors.len(),
                output_ports,
                successor_types: successors
                    .iter()
                    .map(|s| view.type_of(s).to_string())
                    .collect(),
            })
        })
        .collect()
}

// Per-workflow lookups. Node ids are distinct (first occurrence wins) and
// edges touching unknown ids are ignored.
struct TopologyView<'a> {
    topology: &'a WorkflowTopology,
    workflow_id: &'a str,
    node_ids: Vec<&'a str>,
    types: AHashMap<&'a str, &'a str>,
    successors: AHashMap<&'a str, Vec<&'a str>>,
    predecessors: AHashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TopologyView<'a> {
    fn new(topology: &'a WorkflowTopology) -> Self {
        let mut node_ids = Vec::with_capacity(topology.nodes.len());
        let mut types: AHashMap<&str, &str> = AHashMap::with_capacity(topology.nodes.len());
        for node in &topology.nodes {
            if !types.contains_key(node.id.as_str()) {
                types.insert(node.id.as_str(), node.node_type.as_str());
                node_ids.push(node.id.as_str());
            }
        }

        let mut successors: AHashMap<&str, Vec<&str>> = AHashMap::new();
        let mut predecessors: AHashMap<&str, Vec<&str>> = AHashMap::new();
        for edge in &topology.edges {
            let (s, t) = (edge.source.as_str(), edge.target.as_str());
            if !types.contains_key(s) || !types.contains_key(t) {
                continue;
            }
            successors.entry(s).or_default().push(t);
            predecessors.entry(t).or_default().push(s);
        }

        Self {
            topology,
            workflow_id: &topology.workflow_id,
            node_ids,
            types,
            successors,
            predecessors,
        }
    }

    fn type_of(&self, id: &str) -> &'a str {
        self.types.get(id).copied().unwrap_or("Unknown")
    }

    fn successors(&self, id: &str) -> &[&'a str] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn predecessors(&self, id: &str) -> &[&'a str] {
        self.predecessors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
