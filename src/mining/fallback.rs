use super::MiningEngine;
use super::matrix::{FrequentSet, ItemId, TransactionMatrix};
use crate::error::MiningError;
use ahash::AHashMap;

/// Two-pass miner limited to frequent single items and unordered pairs.
#[derive(Debug, Clone)]
pub struct PairCount {
    max_itemsets: usize,
}

impl PairCount {
    pub fn new(max_itemsets: usize) -> Self {
        Self { max_itemsets }
    }
}

impl MiningEngine for PairCount {
    fn algorithm(&self) -> &'static str {
        "pair-count"
    }

    fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_count: usize,
    ) -> Result<Vec<FrequentSet>, MiningError> {
        let counts = matrix.item_counts();
        let frequent: Vec<bool> = counts.iter().map(|&c| c >= min_count).collect();

        let mut out: Vec<FrequentSet> = counts
            .iter()
            .enumerate()
            .filter(|(id, _)| frequent[*id])
            .map(|(id, &count)| FrequentSet {
                items: vec![id as ItemId],
                count,
            })
            .collect();

        let mut pairs: AHashMap<(ItemId, ItemId), usize> = AHashMap::new();
        for row in matrix.rows() {
            let kept: Vec<ItemId> = row
                .iter()
                .copied()
                .filter(|&id| frequent[id as usize])
                .collect();
            for (i, &a) in kept.iter().enumerate() {
                for &b in &kept[i + 1..] {
                    *pairs.entry((a, b)).or_insert(0) += 1;
                }
            }
        }

        let mut frequent_pairs: Vec<FrequentSet> = pairs
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|((a, b), count)| FrequentSet {
                items: vec![a, b],
                count,
            })
            .collect();
        frequent_pairs.sort_unstable_by(|x, y| x.items.cmp(&y.items));
        out.extend(frequent_pairs);

        if out.len() > self.max_itemsets {
            return Err(MiningError::ItemsetLimitExceeded {
                limit: self.max_itemsets,
            });
        }
        Ok(out)
    }
}
