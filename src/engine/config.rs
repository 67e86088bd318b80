use super::selector::Strategy;
use crate::error::ConfigError;
use crate::mining::{DEFAULT_MAX_ITEMSETS, MinerChoice};
use crate::validation::DEFAULT_SIGNIFICANCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings of a [`PatternEngine`](super::PatternEngine) run.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternEngineConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub enable_graph_analysis: bool,
    pub enable_statistical_clustering: bool,
    /// Picks the strategy from corpus complexity; when off, `strategy` is used.
    pub adaptive_selection: bool,
    pub quality_filter: bool,
    pub strategy: Strategy,
    pub validate_rules: bool,
    /// Rules need confidence strictly above this to survive validation.
    pub significance_threshold: f64,
    pub miner: MinerChoice,
    pub max_itemset_size: Option<usize>,
    pub max_itemsets: usize,
}

impl Default for PatternEngineConfig {
    fn default() -> Self {
        Self {
            min_support: 0.1,
            min_confidence: 0.6,
            enable_graph_analysis: true,
            enable_statistical_clustering: true,
            adaptive_selection: true,
            quality_filter: true,
            strategy: Strategy::FullHybrid,
            validate_rules: true,
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
            miner: MinerChoice::FpGrowth,
            max_itemset_size: None,
            max_itemsets: DEFAULT_MAX_ITEMSETS,
        }
    }
}

impl PatternEngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("Could not read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("min_support", self.min_support)?;
        unit_interval("min_confidence", self.min_confidence)?;
        if !(0.0..=1.0).contains(&self.significance_threshold) {
            return Err(invalid(
                "significance_threshold",
                self.significance_threshold,
                "must be in [0, 1]",
            ));
        }
        if self.max_itemsets == 0 {
            return Err(invalid("max_itemsets", 0, "must be positive"));
        }
        if self.max_itemset_size == Some(0) {
            return Err(invalid("max_itemset_size", 0, "must be positive when set"));
        }
        Ok(())
    }
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be in (0, 1]"))
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
