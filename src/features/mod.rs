//! Feature extraction at node, connection and workflow level.
//!
//! A [`FeatureExtractor`] turns one [`WorkflowGraph`] into an
//! [`ExtractedFeatures`] record. Node-level failures are isolated: the node is
//! skipped and reported, the rest of the workflow still processes.

mod connection;
mod graph;
mod metrics;
mod node;

pub use connection::{
    COMPLEX_PREFIX, FAN_PREFIX, IntegrationTemplate, SEQUENCE_PREFIX, UNKNOWN_TYPE,
    default_templates,
};
pub use metrics::WorkflowFeatures;
pub use node::{ComplexityWeights, MAX_PARAMETER_DEPTH, NodeFeature, parameter_structure_signature};

use crate::error::ExtractionError;
use crate::workflow::WorkflowGraph;
use connection::{PatternContext, TypeLookup};
use graph::{Adjacency, LongestPaths};
use node::CanvasBounds;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default upper bound on the number of nodes a single workflow may have.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Everything extracted from one workflow. This is the unit kept in the
/// staging cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub workflow_id: String,
    pub node_features: Vec<NodeFeature>,
    pub connection_patterns: Vec<String>,
    pub workflow_features: WorkflowFeatures,
    /// Ids of nodes whose features could not be computed.
    pub skipped_nodes: Vec<String>,
}

pub struct FeatureExtractor {
    weights: ComplexityWeights,
    templates: Vec<IntegrationTemplate>,
    max_nodes: usize,
}

pub struct FeatureExtractorBuilder {
    weights: ComplexityWeights,
    templates: Vec<IntegrationTemplate>,
    max_nodes: usize,
}

impl FeatureExtractorBuilder {
    pub fn new() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            templates: default_templates(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Overrides the parameter and nesting weights of the node complexity score.
    pub fn with_weights(mut self, parameter: f64, nesting: f64) -> Self {
        self.weights = ComplexityWeights { parameter, nesting };
        self
    }

    /// Replaces the integration template table.
    pub fn with_templates(mut self, templates: Vec<IntegrationTemplate>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_template(mut self, template: IntegrationTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn build(self) -> FeatureExtractor {
        FeatureExtractor {
            weights: self.weights,
            templates: self.templates,
            max_nodes: self.max_nodes,
        }
    }
}

impl Default for FeatureExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        FeatureExtractorBuilder::new().build()
    }
}

impl FeatureExtractor {
    pub fn builder() -> FeatureExtractorBuilder {
        FeatureExtractorBuilder::new()
    }

    pub fn templates(&self) -> &[IntegrationTemplate] {
        &self.templates
    }

    /// Extracts all three feature layers from a workflow.
    pub fn extract(&self, workflow: &WorkflowGraph) -> Result<ExtractedFeatures, ExtractionError> {
        self.check_size(workflow)?;

        let adjacency = Adjacency::from_edges(&workflow.edges);
        let mut paths = LongestPaths::new(&adjacency);
        let types = TypeLookup::of(workflow);

        let (node_features, skipped_nodes) = self.node_layer(workflow);
        let ctx = PatternContext {
            workflow,
            adjacency: &adjacency,
            types: &types,
            templates: &self.templates,
        };
        let connection_patterns = connection::extract_patterns(&ctx, &mut paths);
        let workflow_features = metrics::compute(workflow, &adjacency, &mut paths, &self.weights)?;

        debug!(
            workflow = %workflow.id,
            nodes = node_features.len(),
            skipped = skipped_nodes.len(),
            patterns = connection_patterns.len(),
            "extracted features"
        );

        Ok(ExtractedFeatures {
            workflow_id: workflow.id.clone(),
            node_features,
            connection_patterns,
            workflow_features,
            skipped_nodes,
        })
    }

    /// Node features for every node that can be processed. Nodes that fail
    /// are logged and left out.
    pub fn extract_node_features(&self, workflow: &WorkflowGraph) -> Vec<NodeFeature> {
        self.node_layer(workflow).0
    }

    pub fn extract_connection_patterns(&self, workflow: &WorkflowGraph) -> Vec<String> {
        let adjacency = Adjacency::from_edges(&workflow.edges);
        let mut paths = LongestPaths::new(&adjacency);
        let types = TypeLookup::of(workflow);
        let ctx = PatternContext {
            workflow,
            adjacency: &adjacency,
            types: &types,
            templates: &self.templates,
        };
        connection::extract_patterns(&ctx, &mut paths)
    }

    pub fn extract_workflow_features(
        &self,
        workflow: &WorkflowGraph,
    ) -> Result<WorkflowFeatures, ExtractionError> {
        self.check_size(workflow)?;
        let adjacency = Adjacency::from_edges(&workflow.edges);
        let mut paths = LongestPaths::new(&adjacency);
        metrics::compute(workflow, &adjacency, &mut paths, &self.weights)
    }

    fn check_size(&self, workflow: &WorkflowGraph) -> Result<(), ExtractionError> {
        if workflow.nodes.len() > self.max_nodes {
            return Err(ExtractionError::TooManyNodes {
                workflow_id: workflow.id.clone(),
                node_count: workflow.nodes.len(),
                limit: self.max_nodes,
            });
        }
        Ok(())
    }

    fn node_layer(&self, workflow: &WorkflowGraph) -> (Vec<NodeFeature>, Vec<String>) {
        let bounds = CanvasBounds::of(&workflow.nodes);
        let mut features = Vec::with_capacity(workflow.nodes.len());
        let mut skipped = Vec::new();
        for node in &workflow.nodes {
            match node::extract_node_feature(node, &bounds, &self.weights) {
                Ok(feature) => features.push(feature),
                Err(e) => {
                    warn!(workflow = %workflow.id, node = %node.id, "skipping node: {}", e);
                    skipped.push(node.id.clone());
                }
            }
        }
        (features, skipped)
    }
}
