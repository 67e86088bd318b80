use super::matrix::{FrequentSet, ItemId};
use ahash::AHashMap;
use itertools::Itertools;

/// A rule over interned items, before item names are resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRule {
    pub(crate) antecedent: Vec<ItemId>,
    pub(crate) consequent: Vec<ItemId>,
    pub(crate) support: f64,
    pub(crate) confidence: f64,
    pub(crate) lift: f64,
    pub(crate) conviction: Option<f64>,
}

/// Generates every rule `X → Y` with `X ∪ Y` frequent, `X` non-empty and
/// proper, and `confidence ≥ min_confidence`.
///
/// Subset counts are looked up among `sets`; a split whose antecedent or
/// consequent is not present is skipped.
pub(crate) fn generate_rules(
    sets: &[FrequentSet],
    transaction_count: usize,
    min_confidence: f64,
) -> Vec<RawRule> {
    if transaction_count == 0 {
        return Vec::new();
    }
    let n = transaction_count as f64;
    let counts: AHashMap<&[ItemId], usize> = sets
        .iter()
        .map(|s| (s.items.as_slice(), s.count))
        .collect();

    let mut rules = Vec::new();
    for set in sets.iter().filter(|s| s.items.len() >= 2) {
        for size in 1..set.items.len() {
            for antecedent in set.items.iter().copied().combinations(size) {
                let consequent: Vec<ItemId> = set
                    .items
                    .iter()
                    .copied()
                    .filter(|item| !antecedent.contains(item))
                    .collect();
                let (Some(&antecedent_count), Some(&consequent_count)) = (
                    counts.get(antecedent.as_slice()),
                    counts.get(consequent.as_slice()),
                ) else {
                    continue;
                };
                if antecedent_count == 0 || consequent_count == 0 {
                    continue;
                }

                let confidence = set.count as f64 / antecedent_count as f64;
                if confidence < min_confidence {
                    continue;
                }
                let consequent_support = consequent_count as f64 / n;
                let conviction = if confidence >= 1.0 {
                    None
                } else {
                    Some((1.0 - consequent_support) / (1.0 - confidence))
                };

                rules.push(RawRule {
                    antecedent,
                    consequent,
                    support: set.count as f64 / n,
                    confidence,
                    lift: confidence / consequent_support,
                    conviction,
                });
            }
        }
    }
    rules
}
