use super::cluster::PatternClusters;
use super::config::PatternEngineConfig;
use super::selector::Strategy;
use crate::mining::{AssociationRule, Itemset, MiningAlgorithm};
use crate::structural::StructuralPatterns;
use crate::validation::ValidationStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters and attachments describing one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningStats {
    pub total_transactions: usize,
    pub total_frequent_itemsets: usize,
    pub total_rules: usize,
    pub average_transaction_length: f64,
    /// `None` when mining never produced a result.
    pub mining_algorithm: Option<MiningAlgorithm>,
    pub batch_size: usize,
    pub algorithm_used: Strategy,
    /// Transactions that reached the miner after the quality pre-filter.
    pub filtered_transactions: usize,
    pub failed_workflows: usize,
    pub structural_issues: usize,
    pub cache_hits: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_patterns: Option<StructuralPatterns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_clusters: Option<PatternClusters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MiningStats {
    pub(crate) fn new(batch_size: usize, algorithm_used: Strategy) -> Self {
        Self {
            total_transactions: 0,
            total_frequent_itemsets: 0,
            total_rules: 0,
            average_transaction_length: 0.0,
            mining_algorithm: None,
            batch_size,
            algorithm_used,
            filtered_transactions: 0,
            failed_workflows: 0,
            structural_issues: 0,
            cache_hits: 0,
            structural_patterns: None,
            pattern_clusters: None,
            validation: None,
            error: None,
        }
    }
}

/// The output of [`PatternEngine::discover_patterns`](super::PatternEngine::discover_patterns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResults {
    pub itemsets: Vec<Itemset>,
    pub rules: Vec<AssociationRule>,
    pub stats: MiningStats,
    pub mining_config: PatternEngineConfig,
    pub timestamp: DateTime<Utc>,
}

impl PatternResults {
    pub fn is_error(&self) -> bool {
        self.stats.error.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
