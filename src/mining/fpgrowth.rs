use super::MiningEngine;
use super::matrix::{FrequentSet, ItemId, TransactionMatrix};
use crate::error::MiningError;
use ahash::AHashMap;

const ROOT: usize = 0;

/// FP-Growth: compresses transactions into a prefix tree ordered by item
/// frequency, then mines conditional trees recursively.
#[derive(Debug, Clone)]
pub struct FpGrowth {
    max_itemset_size: Option<usize>,
    max_itemsets: usize,
}

impl FpGrowth {
    pub fn new(max_itemset_size: Option<usize>, max_itemsets: usize) -> Self {
        Self {
            max_itemset_size,
            max_itemsets,
        }
    }
}

impl MiningEngine for FpGrowth {
    fn algorithm(&self) -> &'static str {
        "fp-growth"
    }

    fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_count: usize,
    ) -> Result<Vec<FrequentSet>, MiningError> {
        let paths: Vec<(Vec<ItemId>, usize)> =
            matrix.rows().iter().map(|row| (row.clone(), 1)).collect();
        let tree = FpTree::build(&paths, min_count);

        let mut out = Vec::new();
        self.mine_tree(&tree, &[], min_count, &mut out)?;
        Ok(out)
    }
}

impl FpGrowth {
    fn mine_tree(
        &self,
        tree: &FpTree,
        suffix: &[ItemId],
        min_count: usize,
        out: &mut Vec<FrequentSet>,
    ) -> Result<(), MiningError> {
        // Least frequent first, the classic bottom-up header walk.
        for &item in tree.order.iter().rev() {
            let mut items = suffix.to_vec();
            items.push(item);
            items.sort_unstable();

            out.push(FrequentSet {
                items: items.clone(),
                count: tree.support(item),
            });
            if out.len() > self.max_itemsets {
                return Err(MiningError::ItemsetLimitExceeded {
                    limit: self.max_itemsets,
                });
            }
            if self.max_itemset_size.is_some_and(|max| items.len() >= max) {
                continue;
            }

            let base = tree.conditional_base(item);
            let conditional = FpTree::build(&base, min_count);
            if !conditional.order.is_empty() {
                self.mine_tree(&conditional, &items, min_count, out)?;
            }
        }
        Ok(())
    }
}

struct FpNode {
    item: ItemId,
    count: usize,
    parent: Option<usize>,
    children: Vec<(ItemId, usize)>,
}

struct FpTree {
    nodes: Vec<FpNode>,
    headers: AHashMap<ItemId, Vec<usize>>,
    supports: AHashMap<ItemId, usize>,
    /// Frequent items, most frequent first; ties by id.
    order: Vec<ItemId>,
}

impl FpTree {
    fn build(paths: &[(Vec<ItemId>, usize)], min_count: usize) -> Self {
        let mut supports: AHashMap<ItemId, usize> = AHashMap::new();
        for (path, weight) in paths {
            for &item in path {
                *supports.entry(item).or_insert(0) += weight;
            }
        }
        supports.retain(|_, count| *count >= min_count);

        let mut order: Vec<ItemId> = supports.keys().copied().collect();
        order.sort_unstable_by(|a, b| supports[b].cmp(&supports[a]).then(a.cmp(b)));
        let rank: AHashMap<ItemId, usize> =
            order.iter().enumerate().map(|(i, &item)| (item, i)).collect();

        let mut tree = Self {
            nodes: vec![FpNode {
                item: ItemId::MAX,
                count: 0,
                parent: None,
                children: Vec::new(),
            }],
            headers: AHashMap::new(),
            supports,
            order,
        };

        for (path, weight) in paths {
            let mut filtered: Vec<ItemId> = path
                .iter()
                .copied()
                .filter(|item| rank.contains_key(item))
                .collect();
            filtered.sort_unstable_by_key(|item| rank[item]);
            tree.insert(&filtered, *weight);
        }
        tree
    }

    fn insert(&mut self, items: &[ItemId], weight: usize) {
        let mut current = ROOT;
        for &item in items {
            let existing = self.nodes[current]
                .children
                .iter()
                .find(|(child_item, _)| *child_item == item)
                .map(|(_, idx)| *idx);
            current = match existing {
                Some(idx) => {
                    self.nodes[idx].count += weight;
                    idx
                }
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(FpNode {
                        item,
                        count: weight,
                        parent: Some(current),
                        children: Vec::new(),
                    });
                    self.nodes[current].children.push((item, idx));
                    self.headers.entry(item).or_default().push(idx);
                    idx
                }
            };
        }
    }

    fn support(&self, item: ItemId) -> usize {
        self.supports.get(&item).copied().unwrap_or(0)
    }

    /// Prefix paths leading to every occurrence of `item`, weighted by the
    /// occurrence count.
    fn conditional_base(&self, item: ItemId) -> Vec<(Vec<ItemId>, usize)> {
        let Some(occurrences) = self.headers.get(&item) else {
            return Vec::new();
        };
        occurrences
            .iter()
            .filter_map(|&idx| {
                let mut prefix = Vec::new();
                let mut cursor = self.nodes[idx].parent;
                while let Some(parent) = cursor {
                    if parent == ROOT {
                        break;
                    }
                    prefix.push(self.nodes[parent].item);
                    cursor = self.nodes[parent].parent;
                }
                (!prefix.is_empty()).then(|| (prefix, self.nodes[idx].count))
            })
            .collect()
    }
}
