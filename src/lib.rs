//! # Moyou - Pattern Mining for Workflow Automation Graphs
//!
//! **Moyou** finds recurring structure in collections of workflow automation
//! graphs (n8n-style node/edge exports). Every workflow is reduced to a flat
//! transaction of categorical items, and frequent itemset mining over the
//! corpus surfaces which node types, connection shapes, complexity and quality
//! traits tend to appear together.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic. It operates on a canonical workflow model,
//! [`WorkflowGraph`](workflow::WorkflowGraph). The primary workflow is:
//!
//! 1.  **Load Your Data**: Parse your export format into your own Rust structs.
//! 2.  **Convert to Moyou's Model**: Implement the `IntoWorkflow` trait for your structs.
//! 3.  **Configure**: Build a `PatternEngine` from a `PatternEngineConfig`, optionally with a staging cache.
//! 4.  **Discover**: Stream the workflows through `discover_patterns` and inspect the `PatternResults`.
//!
//! Individual stages (`FeatureExtractor`, `TransactionEncoder`,
//! `FrequentPatternMiner`, `StructuralGraphAnalyzer`, `PatternValidator`) are
//! public and usable on their own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use moyou::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // 1. A tiny corpus built by hand; normally this comes from `IntoWorkflow`.
//!     let workflows: Vec<WorkflowGraph> = (0..10)
//!         .map(|i| {
//!             WorkflowGraph::new(&format!("wf-{}", i), "Order intake")
//!                 .with_node(WorkflowNode::new("1", "Incoming order", "n8n-nodes-base.webhook"))
//!                 .with_node(WorkflowNode::new("2", "Normalize", "n8n-nodes-base.set"))
//!                 .with_node(WorkflowNode::new("3", "Reply", "n8n-nodes-base.respondToWebhook"))
//!                 .with_edge(WorkflowEdge::new("1", "2"))
//!                 .with_edge(WorkflowEdge::new("2", "3"))
//!         })
//!         .collect();
//!
//!     // 2. Configure the engine.
//!     let config = PatternEngineConfig {
//!         min_support: 0.5,
//!         max_itemset_size: Some(3),
//!         ..Default::default()
//!     };
//!     let engine = PatternEngine::builder(config)
//!         .with_cache(std::sync::Arc::new(MemoryStaging::new()))
//!         .build()?;
//!
//!     // 3. Discover patterns.
//!     let results = engine.discover_patterns(workflows);
//!     println!("{}", RuleFormatter::format_summary(&results, 10));
//!     for rule in &results.rules {
//!         println!("{}", RuleFormatter::format_rule(rule));
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod features;
pub mod mining;
pub mod prelude;
pub mod report;
pub mod staging;
pub mod structural;
pub mod transaction;
pub mod validation;
pub mod workflow;
