//! Encoding of extracted features into flat item transactions.

use crate::features::{
    COMPLEX_PREFIX, ExtractedFeatures, FAN_PREFIX, NodeFeature, SEQUENCE_PREFIX, WorkflowFeatures,
};
use crate::workflow::WorkflowGraph;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const TYPE_PREFIX: &str = "type:";
pub const PATTERN_PREFIX: &str = "pattern:";
pub const COMPLEXITY_PREFIX: &str = "complexity:";
pub const QUALITY_PREFIX: &str = "quality:";
pub const STRUCTURE_PREFIX: &str = "structure:";

/// The set of categorical items describing one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub workflow_id: String,
    /// Distinct items in first-seen order.
    pub items: Vec<String>,
}

impl Transaction {
    /// Builds a transaction directly from items, dropping repeats.
    pub fn from_items<I, S>(workflow_id: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            workflow_id: workflow_id.to_string(),
            items: items.into_iter().map(Into::into).unique().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

/// Bucket boundaries used by the encoder. Every comparison is strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncoderThresholds {
    pub complexity_medium: f64,
    pub complexity_high: f64,
    pub parameter_complexity_high: f64,
    pub structure_complexity_high: f64,
    pub quality_medium: f64,
    pub quality_high: f64,
    pub error_handling_basic: f64,
    pub error_handling_good: f64,
    pub nodes_medium: usize,
    pub nodes_large: usize,
    pub density_moderate: f64,
    pub density_dense: f64,
    pub depth_medium: usize,
    pub depth_deep: usize,
    /// Node types seen more often than this get a `:frequent` marker.
    pub frequent_type_count: usize,
}

impl Default for EncoderThresholds {
    fn default() -> Self {
        Self {
            complexity_medium: 5.0,
            complexity_high: 10.0,
            parameter_complexity_high: 5.0,
            structure_complexity_high: 0.5,
            quality_medium: 0.4,
            quality_high: 0.7,
            error_handling_basic: 0.1,
            error_handling_good: 0.5,
            nodes_medium: 5,
            nodes_large: 20,
            density_moderate: 0.1,
            density_dense: 0.3,
            depth_medium: 5,
            depth_deep: 10,
            frequent_type_count: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionEncoder {
    thresholds: EncoderThresholds,
}

impl TransactionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: EncoderThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &EncoderThresholds {
        &self.thresholds
    }

    pub fn encode(
        &self,
        workflow: &WorkflowGraph,
        node_features: &[NodeFeature],
        connection_patterns: &[String],
        workflow_features: &WorkflowFeatures,
    ) -> Transaction {
        self.encode_parts(&workflow.id, node_features, connection_patterns, workflow_features)
    }

    pub fn encode_features(&self, features: &ExtractedFeatures) -> Transaction {
        self.encode_parts(
            &features.workflow_id,
            &features.node_features,
            &features.connection_patterns,
            &features.workflow_features,
        )
    }

    fn encode_parts(
        &self,
        workflow_id: &str,
        node_features: &[NodeFeature],
        connection_patterns: &[String],
        workflow_features: &WorkflowFeatures,
    ) -> Transaction {
        let mut items = self.type_items(node_features);
        items.extend(connection_patterns.iter().map(|p| pattern_item(p)));
        items.extend(self.complexity_items(workflow_features));
        items.extend(self.quality_items(workflow_features));
        items.extend(self.structure_items(workflow_features));

        let transaction = Transaction::from_items(workflow_id, items);
        trace!(workflow = workflow_id, items = transaction.len(), "encoded transaction");
        transaction
    }

    fn type_items(&self, node_features: &[NodeFeature]) -> Vec<String> {
        let counts = node_features.iter().map(|f| f.node_type.as_str()).counts();
        let mut items = Vec::new();
        for node_type in node_features.iter().map(|f| f.node_type.as_str()).unique() {
            let count = counts.get(node_type).copied().unwrap_or(0);
            items.push(format!("{}{}", TYPE_PREFIX, node_type));
            if count > self.thresholds.frequent_type_count {
                items.push(format!("{}{}:frequent", TYPE_PREFIX, node_type));
            } else if count == 1 {
                items.push(format!("{}{}:single", TYPE_PREFIX, node_type));
            }
        }
        items
    }

    fn complexity_items(&self, wf: &WorkflowFeatures) -> Vec<String> {
        let t = &self.thresholds;
        let level = bucket(
            wf.overall_complexity,
            t.complexity_medium,
            t.complexity_high,
            ["Low", "Medium", "High"],
        );
        let mut items = vec![format!("{}{}", COMPLEXITY_PREFIX, level)];
        if wf.parameter_complexity > t.parameter_complexity_high {
            items.push(format!("{}Parameters:High", COMPLEXITY_PREFIX));
        }
        if wf.structure_complexity > t.structure_complexity_high {
            items.push(format!("{}Structure:High", COMPLEXITY_PREFIX));
        }
        items
    }

    fn quality_items(&self, wf: &WorkflowFeatures) -> Vec<String> {
        let t = &self.thresholds;
        let level = bucket(
            wf.quality_score,
            t.quality_medium,
            t.quality_high,
            ["Low", "Medium", "High"],
        );
        let mut items = vec![format!("{}{}", QUALITY_PREFIX, level)];
        if wf.error_handling_coverage > t.error_handling_good {
            items.push(format!("{}ErrorHandling:Good", QUALITY_PREFIX));
        } else if wf.error_handling_coverage > t.error_handling_basic {
            items.push(format!("{}ErrorHandling:Basic", QUALITY_PREFIX));
        }
        items
    }

    fn structure_items(&self, wf: &WorkflowFeatures) -> Vec<String> {
        let t = &self.thresholds;
        let size = bucket(
            wf.node_count as f64,
            t.nodes_medium as f64,
            t.nodes_large as f64,
            ["Small", "Medium", "Large"],
        );
        let density = bucket(
            wf.density,
            t.density_moderate,
            t.density_dense,
            ["Sparse", "Moderate", "Dense"],
        );
        let depth = bucket(
            wf.max_depth as f64,
            t.depth_medium as f64,
            t.depth_deep as f64,
            ["Shallow", "MediumDepth", "Deep"],
        );
        [size, density, depth]
            .into_iter()
            .map(|label| format!("{}{}", STRUCTURE_PREFIX, label))
            .collect()
    }
}

/// Re-namespaces a connection pattern as a transaction item.
pub fn pattern_item(pattern: &str) -> String {
    if let Some(rest) = pattern.strip_prefix(SEQUENCE_PREFIX) {
        format!("{}{}", PATTERN_PREFIX, rest)
    } else if let Some(rest) = pattern.strip_prefix(FAN_PREFIX) {
        format!("{}{}{}", PATTERN_PREFIX, FAN_PREFIX, rest)
    } else if let Some(rest) = pattern.strip_prefix(COMPLEX_PREFIX) {
        format!("{}{}{}", PATTERN_PREFIX, COMPLEX_PREFIX, rest)
    } else {
        format!("{}{}", PATTERN_PREFIX, pattern)
    }
}

fn bucket(value: f64, medium: f64, high: f64, labels: [&'static str; 3]) -> &'static str {
    if value > high {
        labels[2]
    } else if value > medium {
        labels[1]
    } else {
        labels[0]
    }
}
