use super::value::ParameterValue;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The canonical model of a workflow automation graph.
///
/// A workflow is supplied already validated; the only inconsistencies that
/// are tolerated are duplicate node ids and edges that reference missing
/// nodes, both reported through [`WorkflowGraph::structural_issues`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub tags: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// A single typed node on the workflow canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_type_version")]
    pub type_version: f64,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_type_version() -> f64 {
    1.0
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A directed connection between two named ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub source: String,
    #[serde(default = "default_port")]
    pub source_port: String,
    pub target: String,
    #[serde(default = "default_port")]
    pub target_port: String,
}

fn default_port() -> String {
    "main".to_string()
}

/// A non-fatal inconsistency found in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    DuplicateNodeId {
        node_id: String,
    },
    DanglingEdge {
        source: String,
        target: String,
        missing: String,
    },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id '{}'", node_id)
            }
            StructuralIssue::DanglingEdge {
                source,
                target,
                missing,
            } => write!(
                f,
                "edge '{}' -> '{}' references missing node '{}'",
                source, target, missing
            ),
        }
    }
}

impl WorkflowGraph {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_node(mut self, node: WorkflowNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: WorkflowEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Builds an id -> node lookup. When ids repeat, the first node wins.
    pub fn node_index(&self) -> AHashMap<&str, &WorkflowNode> {
        let mut index = AHashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        index
    }

    /// Reports duplicate node ids and edges whose endpoints are missing.
    pub fn structural_issues(&self) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();
        let mut seen: AHashSet<&str> = AHashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                issues.push(StructuralIssue::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint.as_str()) {
                    issues.push(StructuralIssue::DanglingEdge {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        issues
    }
}

impl WorkflowNode {
    pub fn new(id: &str, name: &str, node_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            type_version: default_type_version(),
            position: Position::default(),
            parameters: BTreeMap::new(),
            notes: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }
}

impl WorkflowEdge {
    /// An edge between the default `main` ports of two nodes.
    pub fn new(source: &str, target: &str) -> Self {
        Self::with_ports(source, "main", target, "main")
    }

    pub fn with_ports(source: &str, source_port: &str, target: &str, target_port: &str) -> Self {
        Self {
            source: source.to_string(),
            source_port: source_port.to_string(),
            target: target.to_string(),
            target_port: target_port.to_string(),
        }
    }
}
