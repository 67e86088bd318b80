use thiserror::Error;

/// Errors that can occur while extracting features from a single workflow.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Failed to extract features for node '{node_id}': {reason}")]
    NodeFeature { node_id: String, reason: String },

    #[error("Workflow '{workflow_id}' has {node_count} nodes, which exceeds the limit of {limit}")]
    TooManyNodes {
        workflow_id: String,
        node_count: usize,
        limit: usize,
    },

    #[error("Workflow '{workflow_id}' produced a non-finite value for metric '{metric}'")]
    NonFiniteMetric { workflow_id: String, metric: String },
}

/// Errors that can occur during frequent pattern mining.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiningError {
    #[error("No transactions available for mining")]
    EmptyCorpus,

    #[error("Threshold '{name}' must be in (0, 1], got {value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Transaction '{transaction}' contains a blank item")]
    MalformedItem { transaction: String },

    #[error("Frequent itemset search exceeded the limit of {limit} itemsets")]
    ItemsetLimitExceeded { limit: usize },

    #[error("Both mining engines failed (primary: {primary}; fallback: {fallback})")]
    AllEnginesFailed {
        primary: Box<MiningError>,
        fallback: Box<MiningError>,
    },
}

/// Errors raised by a staging cache store.
#[derive(Error, Debug, Clone)]
pub enum StagingError {
    #[error("Staging I/O failed: {0}")]
    Io(String),

    #[error("Staging serialization failed: {0}")]
    Serialization(String),
}

/// Errors raised while loading or validating engine configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {value} ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),
}

/// Errors that can occur when converting a custom format into a `WorkflowGraph`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid workflow data: {0}")]
    Validation(String),
}
