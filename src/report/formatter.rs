use crate::engine::PatternResults;
use crate::mining::{AssociationRule, Itemset};
use std::fmt::Write;

/// Formats mining results into human-readable text.
pub struct RuleFormatter;

impl RuleFormatter {
    /// `{a, b} => {c}  (conf 0.75, supp 0.40, lift 1.20, conv 1.60)`
    pub fn format_rule(rule: &AssociationRule) -> String {
        let conviction = match rule.conviction {
            Some(c) => Self::format_number(c),
            None => "inf".to_string(),
        };
        format!(
            "{} => {}  (conf {}, supp {}, lift {}, conv {})",
            Self::format_items(&rule.antecedent),
            Self::format_items(&rule.consequent),
            Self::format_number(rule.confidence),
            Self::format_number(rule.support),
            Self::format_number(rule.lift),
            conviction
        )
    }

    pub fn format_itemset(itemset: &Itemset) -> String {
        format!(
            "{}  (supp {}, count {})",
            Self::format_items(&itemset.items),
            Self::format_number(itemset.support),
            itemset.count
        )
    }

    /// A multi-line run summary with the top `limit` itemsets and rules.
    pub fn format_summary(results: &PatternResults, limit: usize) -> String {
        let stats = &results.stats;
        let mut out = String::new();
        let algorithm = stats
            .mining_algorithm
            .map(|a| a.to_string())
            .unwrap_or_else(|| "none".to_string());

        let _ = writeln!(
            out,
            "{} workflows, {} transactions ({} mined), strategy {}, engine {}",
            stats.batch_size,
            stats.total_transactions,
            stats.filtered_transactions,
            stats.algorithm_used,
            algorithm
        );
        if stats.failed_workflows > 0 || stats.structural_issues > 0 {
            let _ = writeln!(
                out,
                "{} workflows failed, {} structural issues",
                stats.failed_workflows, stats.structural_issues
            );
        }
        if let Some(error) = &stats.error {
            let _ = writeln!(out, "error: {}", error);
            return out;
        }

        let _ = writeln!(out, "\nfrequent itemsets ({}):", stats.total_frequent_itemsets);
        // Largest sets are the interesting ones; itemsets come sorted by size ascending.
        for itemset in results.itemsets.iter().rev().take(limit) {
            let _ = writeln!(out, "  {}", Self::format_itemset(itemset));
        }

        let _ = writeln!(out, "\nrules ({}):", stats.total_rules);
        for rule in results.rules.iter().take(limit) {
            let _ = writeln!(out, "  {}", Self::format_rule(rule));
        }

        if let Some(structural) = &stats.structural_patterns {
            let _ = writeln!(
                out,
                "\nstructure: {} hubs, {} cycles, {} branches, {} chains",
                structural.hub_patterns.len(),
                structural.cycle_patterns.len(),
                structural.branch_patterns.len(),
                structural.sequential_patterns.len()
            );
        }
        if let Some(clusters) = &stats.pattern_clusters {
            let _ = writeln!(
                out,
                "clusters: {} high, {} medium, {} low",
                clusters.high_frequency_patterns.len(),
                clusters.medium_frequency_patterns.len(),
                clusters.low_frequency_patterns.len()
            );
        }
        out
    }

    fn format_items(items: &[String]) -> String {
        format!("{{{}}}", items.join(", "))
    }

    fn format_number(n: f64) -> String {
        if n.fract() == 0.0 && n.is_finite() {
            format!("{}", n as i64)
        } else {
            format!("{:.2}", n)
        }
    }
}
