use crate::error::ExtractionError;
use crate::workflow::{ParameterValue, WorkflowNode, parameter_nesting_depth, write_object_shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

/// Deepest parameter nesting a node may carry before it is skipped.
pub const MAX_PARAMETER_DEPTH: usize = 128;

/// Per-node numeric and categorical features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFeature {
    pub node_id: String,
    pub node_type: String,
    pub parameter_count: usize,
    pub nesting_depth: usize,
    pub complexity_score: f64,
    /// Quadrant of the canvas, 0..=3 (top-left, top-right, bottom-left, bottom-right).
    pub spatial_zone: u8,
    pub parameter_structure_signature: String,
    pub type_version: f64,
    pub has_note: bool,
    pub parameter_type_diversity: usize,
    pub dominant_parameter_type: String,
    pub boolean_param_count: usize,
    pub string_param_count: usize,
}

/// Weights of the node complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityWeights {
    pub parameter: f64,
    pub nesting: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            parameter: 1.0,
            nesting: 2.0,
        }
    }
}

impl ComplexityWeights {
    pub fn score(&self, parameter_count: usize, nesting_depth: usize) -> f64 {
        parameter_count as f64 * self.parameter + nesting_depth as f64 * self.nesting
    }
}

/// Bounding box of a workflow's node positions, used to normalize zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CanvasBounds {
    min_x: f64,
    min_y: f64,
    span_x: f64,
    span_y: f64,
}

impl CanvasBounds {
    pub(crate) fn of(nodes: &[WorkflowNode]) -> Self {
        let finite = nodes
            .iter()
            .map(|n| n.position)
            .filter(|p| p.x.is_finite() && p.y.is_finite());

        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for p in finite {
            bounds = Some(match bounds {
                None => (p.x, p.x, p.y, p.y),
                Some((min_x, max_x, min_y, max_y)) => {
                    (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
                }
            });
        }

        let (min_x, max_x, min_y, max_y) = bounds.unwrap_or((0.0, 1.0, 0.0, 1.0));
        let span = |lo: f64, hi: f64| if hi - lo > 0.0 { hi - lo } else { 1.0 };
        Self {
            min_x,
            min_y,
            span_x: span(min_x, max_x),
            span_y: span(min_y, max_y),
        }
    }

    pub(crate) fn zone(&self, x: f64, y: f64) -> u8 {
        let nx = (x - self.min_x) / self.span_x;
        let ny = (y - self.min_y) / self.span_y;
        match (nx < 0.5, ny < 0.5) {
            (true, true) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        }
    }
}

/// Stable short hash of a parameter map's shape, independent of its values.
pub fn parameter_structure_signature(parameters: &BTreeMap<String, ParameterValue>) -> String {
    let mut shape = String::new();
    write_object_shape(parameters, &mut shape);
    let hex = format!("{:016x}", xxh3_64(shape.as_bytes()));
    hex[..8].to_string()
}

pub(crate) fn extract_node_feature(
    node: &WorkflowNode,
    bounds: &CanvasBounds,
    weights: &ComplexityWeights,
) -> Result<NodeFeature, ExtractionError> {
    let (x, y) = (node.position.x, node.position.y);
    if !x.is_finite() || !y.is_finite() {
        return Err(ExtractionError::NodeFeature {
            node_id: node.id.clone(),
            reason: format!("non-finite position ({}, {})", x, y),
        });
    }

    let nesting_depth = parameter_nesting_depth(&node.parameters);
    if nesting_depth > MAX_PARAMETER_DEPTH {
        return Err(ExtractionError::NodeFeature {
            node_id: node.id.clone(),
            reason: format!(
                "parameter nesting depth {} exceeds limit {}",
                nesting_depth, MAX_PARAMETER_DEPTH
            ),
        });
    }

    let parameter_count = node.parameters.len();
    let tags = TagCounts::of(&node.parameters);

    Ok(NodeFeature {
        node_id: node.id.clone(),
        node_type: node.node_type.clone(),
        parameter_count,
        nesting_depth,
        complexity_score: weights.score(parameter_count, nesting_depth),
        spatial_zone: bounds.zone(x, y),
        parameter_structure_signature: parameter_structure_signature(&node.parameters),
        type_version: node.type_version,
        has_note: node.notes.as_deref().is_some_and(|n| !n.is_empty()),
        parameter_type_diversity: tags.counts.len(),
        dominant_parameter_type: tags.dominant().to_string(),
        boolean_param_count: tags.count("bool"),
        string_param_count: tags.count("string"),
    })
}

// Top-level value tags in first-occurrence (key) order.
struct TagCounts {
    counts: Vec<(&'static str, usize)>,
}

impl TagCounts {
    fn of(parameters: &BTreeMap<String, ParameterValue>) -> Self {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for value in parameters.values() {
            let tag = value.type_tag();
            match counts.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, count)) => *count += 1,
                None => counts.push((tag, 1)),
            }
        }
        Self { counts }
    }

    fn count(&self, tag: &str) -> usize {
        self.counts
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    fn dominant(&self) -> &'static str {
        let mut best: Option<(&'static str, usize)> = None;
        for &(tag, count) in &self.counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((tag, count));
            }
        }
        best.map(|(tag, _)| tag).unwrap_or("none")
    }
}
