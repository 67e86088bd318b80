use crate::mining::AssociationRule;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.6;

/// Significance verdict for one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_significant: bool,
    pub quality_score: f64,
    pub lift: f64,
    pub conviction: Option<f64>,
}

/// Counts reported after a rule filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub rules_before: usize,
    pub rules_after: usize,
    pub threshold: f64,
}

/// Rule significance test: a rule is significant when its confidence is
/// strictly above the threshold.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    threshold: f64,
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}

impl PatternValidator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn validate(&self, rule: &AssociationRule) -> ValidationResult {
        ValidationResult {
            is_significant: rule.confidence > self.threshold,
            quality_score: rule.confidence,
            lift: rule.lift,
            conviction: rule.conviction,
        }
    }

    /// Keeps significant rules, preserving their order.
    pub fn filter_rules(&self, rules: Vec<AssociationRule>) -> (Vec<AssociationRule>, ValidationStats) {
        let rules_before = rules.len();
        let kept: Vec<AssociationRule> = rules
            .into_iter()
            .filter(|rule| self.validate(rule).is_significant)
            .collect();
        debug!(before = rules_before, after = kept.len(), "validated rules");
        let stats = ValidationStats {
            rules_before,
            rules_after: kept.len(),
            threshold: self.threshold,
        };
        (kept, stats)
    }
}
