//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the moyou crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use moyou::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflows.json")?;
//! let workflows: Vec<WorkflowGraph> = serde_json::from_str(&json)?;
//!
//! let engine = PatternEngine::builder(PatternEngineConfig::default()).build()?;
//! let results = engine.discover_patterns(workflows);
//! println!("{}", results.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

// Canonical model
pub use crate::workflow::{IntoWorkflow, ParameterValue, WorkflowEdge, WorkflowGraph, WorkflowNode};

// Pipeline stages
pub use crate::features::{ExtractedFeatures, FeatureExtractor, IntegrationTemplate};
pub use crate::mining::{AssociationRule, FrequentPatternMiner, Itemset, MinerChoice};
pub use crate::structural::StructuralGraphAnalyzer;
pub use crate::transaction::{Transaction, TransactionEncoder};
pub use crate::validation::PatternValidator;

// Orchestration
pub use crate::engine::{PatternEngine, PatternEngineConfig, PatternResults, Strategy};
pub use crate::staging::{DiskStaging, HybridStaging, MemoryStaging, StagingCache};

// Error types
pub use crate::error::{ConfigError, ExtractionError, MiningError};

// Result formatting
pub use crate::report::RuleFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
