use super::graph::{Adjacency, LongestPaths};
use super::node::ComplexityWeights;
use crate::error::ExtractionError;
use crate::workflow::{WorkflowGraph, WorkflowNode, parameter_nesting_depth};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ERROR_PARAMETER_KEYS: [&str; 2] = ["onError", "continueOnFail"];
const ERROR_TYPE_MARKERS: [&str; 2] = ["error", "catch"];
const VALIDATION_TYPE_MARKERS: [&str; 2] = ["validate", "check"];

/// Whole-workflow metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFeatures {
    pub node_count: usize,
    pub edge_count: usize,
    pub unique_node_types: usize,
    pub density: f64,
    pub max_depth: usize,
    pub avg_degree: f64,
    pub branching_factor: f64,

    pub quality_score: f64,
    pub error_handling_coverage: f64,
    pub validation_score: f64,
    pub naming_quality: f64,
    pub structure_quality: f64,
    pub parameter_completeness: f64,

    pub overall_complexity: f64,
    pub parameter_complexity: f64,
    pub structure_complexity: f64,

    pub type_distribution: BTreeMap<String, usize>,
    pub dominant_node_type: String,
    /// Base-2 Shannon entropy of the node type distribution.
    pub type_diversity: f64,
}

pub(crate) fn compute<'a>(
    workflow: &'a WorkflowGraph,
    adjacency: &Adjacency<'a>,
    paths: &mut LongestPaths<'_, 'a>,
    weights: &ComplexityWeights,
) -> Result<WorkflowFeatures, ExtractionError> {
    let nodes = &workflow.nodes;
    let n = nodes.len();
    let e = adjacency.edge_count();

    let density = if n >= 2 {
        (e as f64 / (n * (n - 1)) as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let max_depth = nodes
        .iter()
        .filter(|node| !adjacency.has_predecessors(&node.id))
        .map(|node| paths.length_from(&node.id))
        .max()
        .unwrap_or(0);

    let out_degrees: Vec<usize> = adjacency
        .sources()
        .iter()
        .map(|s| adjacency.successors(s).len())
        .collect();
    let branching_factor = mean(out_degrees.iter().sum::<usize>() as f64, out_degrees.len());
    let avg_degree = ratio(2 * e, n);

    let error_handling_coverage = ratio(nodes.iter().filter(|node| handles_errors(node)).count(), n);
    let naming_quality = ratio(nodes.iter().filter(|node| is_well_named(node)).count(), n);
    let structure_quality = structure_quality(n);
    let parameter_completeness = ratio(nodes.iter().filter(|node| !node.parameters.is_empty()).count(), n);
    let quality_score = 0.3 * error_handling_coverage
        + 0.2 * naming_quality
        + 0.3 * structure_quality
        + 0.2 * parameter_completeness;
    let validation_score = ratio(
        nodes
            .iter()
            .filter(|node| type_contains_any(node, &VALIDATION_TYPE_MARKERS))
            .count(),
        n,
    )
    .min(1.0);

    let (total_parameters, total_depth, total_node_complexity) =
        nodes.iter().fold((0usize, 0usize, 0.0f64), |acc, node| {
            let count = node.parameters.len();
            let depth = parameter_nesting_depth(&node.parameters);
            (acc.0 + count, acc.1 + depth, acc.2 + weights.score(count, depth))
        });
    let parameter_complexity = ratio(total_parameters + total_depth, n);
    let structure_complexity =
        0.4 * density + 0.3 * (max_depth as f64 / 10.0) + 0.3 * (branching_factor / 5.0);
    let overall_complexity = mean(total_node_complexity + structure_complexity, n);

    let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for node in nodes {
        *type_distribution.entry(node.node_type.clone()).or_insert(0) += 1;
    }
    let dominant_node_type = dominant_type(nodes, &type_distribution);
    let type_diversity = shannon_entropy(&type_distribution, n);

    let features = WorkflowFeatures {
        node_count: n,
        edge_count: e,
        unique_node_types: type_distribution.len(),
        density,
        max_depth,
        avg_degree,
        branching_factor,
        quality_score,
        error_handling_coverage,
        validation_score,
        naming_quality,
        structure_quality,
        parameter_completeness,
        overall_complexity,
        parameter_complexity,
        structure_complexity,
        type_distribution,
        dominant_node_type,
        type_diversity,
    };
    ensure_finite(&workflow.id, &features)?;
    Ok(features)
}

fn ratio(count: usize, total: usize) -> f64 {
    mean(count as f64, total)
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn handles_errors(node: &WorkflowNode) -> bool {
    ERROR_PARAMETER_KEYS
        .iter()
        .any(|key| node.parameters.contains_key(*key))
        || type_contains_any(node, &ERROR_TYPE_MARKERS)
}

fn type_contains_any(node: &WorkflowNode, markers: &[&str]) -> bool {
    let lowered = node.node_type.to_lowercase();
    markers.iter().any(|m| lowered.contains(m))
}

fn is_well_named(node: &WorkflowNode) -> bool {
    node.name != node.node_type && node.name.chars().count() > 3 && !node.name.starts_with("Node")
}

fn structure_quality(node_count: usize) -> f64 {
    match node_count {
        0 => 0.0,
        1 => 0.3,
        2..=20 => 1.0,
        21..=50 => 0.7,
        _ => 0.4,
    }
}

// Ties go to the type that appears first in node order.
fn dominant_type(nodes: &[WorkflowNode], distribution: &BTreeMap<String, usize>) -> String {
    let mut best: Option<(&str, usize)> = None;
    for node in nodes {
        let count = distribution.get(&node.node_type).copied().unwrap_or(0);
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((node.node_type.as_str(), count));
        }
    }
    best.map(|(t, _)| t.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn shannon_entropy(distribution: &BTreeMap<String, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    distribution.values().fold(0.0, |entropy, &count| {
        let p = count as f64 / total as f64;
        entropy - p * p.log2()
    })
}

fn ensure_finite(workflow_id: &str, features: &WorkflowFeatures) -> Result<(), ExtractionError> {
    let metrics = [
        ("density", features.density),
        ("avg_degree", features.avg_degree),
        ("branching_factor", features.branching_factor),
        ("quality_score", features.quality_score),
        ("validation_score", features.validation_score),
        ("overall_complexity", features.overall_complexity),
        ("parameter_complexity", features.parameter_complexity),
        ("structure_complexity", features.structure_complexity),
        ("type_diversity", features.type_diversity),
    ];
    match metrics.iter().find(|(_, value)| !value.is_finite()) {
        Some((metric, _)) => Err(ExtractionError::NonFiniteMetric {
            workflow_id: workflow_id.to_string(),
            metric: metric.to_string(),
        }),
        None => Ok(()),
    }
}
