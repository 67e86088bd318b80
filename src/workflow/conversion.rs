use super::definition::WorkflowGraph;
use crate::error::ConversionError;

/// A trait for custom data models that can be converted into a `WorkflowGraph`.
///
/// This is the extension point that keeps the miner format-agnostic: parse
/// your export format into your own structs, then implement this trait to
/// translate them into the canonical model.
///
/// # Example
///
/// ```rust,no_run
/// use moyou::prelude::*;
/// use moyou::error::ConversionError;
///
/// struct MyStep { key: String, kind: String }
/// struct MyPipeline { name: String, steps: Vec<MyStep> }
///
/// impl IntoWorkflow for MyPipeline {
///     fn into_workflow(self) -> std::result::Result<WorkflowGraph, ConversionError> {
///         let mut graph = WorkflowGraph::new(&self.name, &self.name);
///         let mut previous: Option<String> = None;
///         for step in self.steps {
///             graph.nodes.push(WorkflowNode::new(&step.key, &step.key, &step.kind));
///             if let Some(prev) = previous.replace(step.key.clone()) {
///                 graph.edges.push(WorkflowEdge::new(&prev, &step.key));
///             }
///         }
///         Ok(graph)
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into the canonical workflow model.
    fn into_workflow(self) -> Result<WorkflowGraph, ConversionError>;
}

impl IntoWorkflow for WorkflowGraph {
    fn into_workflow(self) -> Result<WorkflowGraph, ConversionError> {
        Ok(self)
    }
}
