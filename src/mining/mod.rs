//! Frequent itemset and association rule mining over transactions.
//!
//! Items are interned into a [`TransactionMatrix`] and handed to a
//! [`MiningEngine`]. The [`FrequentPatternMiner`] owns a primary engine and a
//! fallback: if the primary fails the run degrades to the fallback instead of
//! failing outright.

mod fallback;
mod fpgrowth;
mod matrix;
mod rules;

pub use fallback::PairCount;
pub use fpgrowth::FpGrowth;
pub use matrix::{FrequentSet, ItemId, TransactionMatrix};

use crate::error::MiningError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Default cap on the number of frequent itemsets a single run may produce.
pub const DEFAULT_MAX_ITEMSETS: usize = 100_000;

/// Absorbs float error in `min_support * N` so that e.g. `0.1 * 30` is 3.
const SUPPORT_EPSILON: f64 = 1e-9;

/// A set of items that co-occur in at least the minimum fraction of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    /// Items in ascending order.
    pub items: Vec<String>,
    pub support: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    /// `None` when confidence is 1 (conviction is unbounded).
    pub conviction: Option<f64>,
}

/// Which engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningAlgorithm {
    Primary,
    Fallback,
}

impl std::fmt::Display for MiningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiningAlgorithm::Primary => write!(f, "primary"),
            MiningAlgorithm::Fallback => write!(f, "fallback"),
        }
    }
}

/// The available mining engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinerChoice {
    /// FP-Growth as primary, pair counting as fallback.
    #[default]
    FpGrowth,
    /// Pair counting only. Results are reported as `fallback`.
    PairCount,
}

/// A frequent itemset miner over interned transactions.
pub trait MiningEngine: Send + Sync {
    /// Short engine name for logs.
    fn algorithm(&self) -> &'static str;

    /// Every itemset whose count is at least `min_count`.
    fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_count: usize,
    ) -> Result<Vec<FrequentSet>, MiningError>;
}

/// Result of one mining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningOutcome {
    pub itemsets: Vec<Itemset>,
    pub rules: Vec<AssociationRule>,
    pub algorithm: MiningAlgorithm,
    /// Transactions handed to the miner.
    pub input_transactions: usize,
    /// Transactions left after dropping empty ones and the quality pre-filter.
    pub mined_transactions: usize,
    /// Mean item count over the input transactions.
    pub average_transaction_length: f64,
}

pub struct FrequentPatternMiner {
    primary: Option<Box<dyn MiningEngine>>,
    fallback: Box<dyn MiningEngine>,
    quality_filter: bool,
}

impl Default for FrequentPatternMiner {
    fn default() -> Self {
        Self::new(MinerChoice::FpGrowth)
    }
}

impl FrequentPatternMiner {
    pub fn new(choice: MinerChoice) -> Self {
        Self::with_limits(choice, None, DEFAULT_MAX_ITEMSETS)
    }

    pub fn with_limits(
        choice: MinerChoice,
        max_itemset_size: Option<usize>,
        max_itemsets: usize,
    ) -> Self {
        let primary: Option<Box<dyn MiningEngine>> = match choice {
            MinerChoice::FpGrowth => Some(Box::new(FpGrowth::new(max_itemset_size, max_itemsets))),
            MinerChoice::PairCount => None,
        };
        Self {
            primary,
            fallback: Box::new(PairCount::new(max_itemsets)),
            quality_filter: false,
        }
    }

    /// Plugs in custom engines.
    pub fn with_engines(primary: Box<dyn MiningEngine>, fallback: Box<dyn MiningEngine>) -> Self {
        Self {
            primary: Some(primary),
            fallback,
            quality_filter: false,
        }
    }

    /// Keeps only transactions that carry a quality signal or enough content.
    pub fn with_quality_filter(mut self, enabled: bool) -> Self {
        self.quality_filter = enabled;
        self
    }

    pub fn mine(
        &self,
        transactions: &[Transaction],
        min_support: f64,
        min_confidence: f64,
    ) -> Result<MiningOutcome, MiningError> {
        check_threshold("min_support", min_support)?;
        check_threshold("min_confidence", min_confidence)?;

        let input_transactions = transactions.len();
        let average_transaction_length = if input_transactions == 0 {
            0.0
        } else {
            transactions.iter().map(Transaction::len).sum::<usize>() as f64
                / input_transactions as f64
        };

        let mut kept: Vec<&Transaction> = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            if transaction.is_empty() {
                warn!(workflow = %transaction.workflow_id, "dropping empty transaction");
                continue;
            }
            if transaction.items.iter().any(|item| item.trim().is_empty()) {
                return Err(MiningError::MalformedItem {
                    transaction: transaction.workflow_id.clone(),
                });
            }
            if self.quality_filter && !passes_quality_filter(transaction) {
                continue;
            }
            kept.push(transaction);
        }
        if kept.is_empty() {
            return Err(MiningError::EmptyCorpus);
        }

        let matrix = TransactionMatrix::from_transactions(kept.iter().copied());
        let min_count = min_count(min_support, matrix.len());
        info!(
            transactions = matrix.len(),
            items = matrix.item_count(),
            min_count,
            "mining frequent itemsets"
        );

        let (algorithm, sets) = self.run_engines(&matrix, min_count)?;
        let raw_rules = rules::generate_rules(&sets, matrix.len(), min_confidence);
        debug!(itemsets = sets.len(), rules = raw_rules.len(), "mining finished");

        let n = matrix.len() as f64;
        let mut itemsets: Vec<Itemset> = sets
            .iter()
            .map(|set| Itemset {
                items: resolve(&matrix, &set.items),
                support: set.count as f64 / n,
                count: set.count,
            })
            .collect();
        itemsets.sort_by(compare_itemsets);

        let mut rules: Vec<AssociationRule> = raw_rules
            .into_iter()
            .map(|rule| AssociationRule {
                antecedent: resolve(&matrix, &rule.antecedent),
                consequent: resolve(&matrix, &rule.consequent),
                support: rule.support,
                confidence: rule.confidence,
                lift: rule.lift,
                conviction: rule.conviction,
            })
            .collect();
        rules.sort_by(compare_rules);

        Ok(MiningOutcome {
            itemsets,
            rules,
            algorithm,
            input_transactions,
            mined_transactions: matrix.len(),
            average_transaction_length,
        })
    }

    fn run_engines(
        &self,
        matrix: &TransactionMatrix,
        min_count: usize,
    ) -> Result<(MiningAlgorithm, Vec<FrequentSet>), MiningError> {
        let Some(primary) = &self.primary else {
            return Ok((MiningAlgorithm::Fallback, self.fallback.mine(matrix, min_count)?));
        };
        match primary.mine(matrix, min_count) {
            Ok(sets) => Ok((MiningAlgorithm::Primary, sets)),
            Err(primary_err) => {
                warn!(
                    engine = primary.algorithm(),
                    fallback = self.fallback.algorithm(),
                    "primary mining engine failed, degrading: {}",
                    primary_err
                );
                match self.fallback.mine(matrix, min_count) {
                    Ok(sets) => Ok((MiningAlgorithm::Fallback, sets)),
                    Err(fallback_err) => Err(MiningError::AllEnginesFailed {
                        primary: Box::new(primary_err),
                        fallback: Box::new(fallback_err),
                    }),
                }
            }
        }
    }
}

/// Smallest integer count satisfying `count / n >= min_support`.
pub fn min_count(min_support: f64, transaction_count: usize) -> usize {
    let raw = (min_support * transaction_count as f64 - SUPPORT_EPSILON).ceil();
    (raw.max(1.0)) as usize
}

fn check_threshold(name: &str, value: f64) -> Result<(), MiningError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(MiningError::InvalidThreshold {
            name: name.to_string(),
            value,
        })
    }
}

fn passes_quality_filter(transaction: &Transaction) -> bool {
    let has_quality = transaction
        .items
        .iter()
        .any(|item| item.starts_with("quality:High") || item.starts_with("quality:Medium"));
    let has_error_handling = transaction.items.iter().any(|item| item.contains("ErrorHandling"));
    has_quality || has_error_handling || transaction.len() >= 3
}

fn resolve(matrix: &TransactionMatrix, ids: &[ItemId]) -> Vec<String> {
    let mut items: Vec<String> = ids.iter().map(|&id| matrix.item(id).to_string()).collect();
    items.sort();
    items
}

fn compare_itemsets(a: &Itemset, b: &Itemset) -> Ordering {
    a.items
        .len()
        .cmp(&b.items.len())
        .then(b.support.total_cmp(&a.support))
        .then_with(|| a.items.cmp(&b.items))
}

fn compare_rules(a: &AssociationRule, b: &AssociationRule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(b.support.total_cmp(&a.support))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_count_tolerates_float_error() {
        assert_eq!(min_count(0.1, 30), 3);
        assert_eq!(min_count(0.5, 4), 2);
        assert_eq!(min_count(0.3, 10), 3);
        assert_eq!(min_count(0.01, 5), 1);
    }

    #[test]
    fn test_quality_filter_rules() {
        assert!(passes_quality_filter(&Transaction::from_items("a", ["quality:Medium"])));
        assert!(passes_quality_filter(&Transaction::from_items("b", ["quality:ErrorHandling:Basic"])));
        assert!(passes_quality_filter(&Transaction::from_items("c", ["x", "y", "z"])));
        assert!(!passes_quality_filter(&Transaction::from_items("d", ["quality:Low", "x"])));
    }
}
