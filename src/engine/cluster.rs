use crate::mining::Itemset;
use serde::{Deserialize, Serialize};

/// Itemsets grouped into support bands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternClusters {
    pub high_frequency_patterns: Vec<Vec<String>>,
    pub medium_frequency_patterns: Vec<Vec<String>>,
    pub low_frequency_patterns: Vec<Vec<String>>,
}

/// Bands itemsets by support: above `high` is High, above `medium` is
/// Medium, anything else is Low.
#[derive(Debug, Clone)]
pub struct StatisticalCluster {
    high: f64,
    medium: f64,
}

impl Default for StatisticalCluster {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.3,
        }
    }
}

impl StatisticalCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cluster(&self, itemsets: &[Itemset]) -> PatternClusters {
        let mut clusters = PatternClusters::default();
        for itemset in itemsets {
            let band = if itemset.support > self.high {
                &mut clusters.high_frequency_patterns
            } else if itemset.support > self.medium {
                &mut clusters.medium_frequency_patterns
            } else {
                &mut clusters.low_frequency_patterns
            };
            band.push(itemset.items.clone());
        }
        clusters
    }
}
