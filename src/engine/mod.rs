//! The adaptive orchestrator.
//!
//! [`PatternEngine::discover_patterns`] makes one pass over a stream of
//! workflows, turning each into a transaction, then mines the corpus and
//! attaches whatever extra analysis the selected [`Strategy`] calls for.
//! Per-workflow failures are counted and skipped; a failed mining run is
//! reported through `stats.error`. The method itself never fails.

mod cluster;
mod config;
mod results;
mod selector;

pub use cluster::{PatternClusters, StatisticalCluster};
pub use config::PatternEngineConfig;
pub use results::{MiningStats, PatternResults};
pub use selector::{AdaptiveSelector, HYBRID_THRESHOLD, STRUCTURAL_THRESHOLD, Strategy};

use crate::error::{ConfigError, ExtractionError};
use crate::features::{ExtractedFeatures, FeatureExtractor};
use crate::mining::FrequentPatternMiner;
use crate::staging::StagingCache;
use crate::structural::{StructuralGraphAnalyzer, WorkflowTopology};
use crate::transaction::{Transaction, TransactionEncoder};
use crate::validation::PatternValidator;
use crate::workflow::WorkflowGraph;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use xxhash_rust::xxh3::xxh3_64;

pub struct PatternEngine {
    config: PatternEngineConfig,
    extractor: FeatureExtractor,
    encoder: TransactionEncoder,
    miner: FrequentPatternMiner,
    structural: StructuralGraphAnalyzer,
    clusterer: StatisticalCluster,
    validator: PatternValidator,
    cache: Option<Arc<dyn StagingCache>>,
}

pub struct PatternEngineBuilder {
    config: PatternEngineConfig,
    cache: Option<Arc<dyn StagingCache>>,
    miner: Option<FrequentPatternMiner>,
    extractor: Option<FeatureExtractor>,
    encoder: Option<TransactionEncoder>,
}

impl PatternEngineBuilder {
    pub fn new(config: PatternEngineConfig) -> Self {
        Self {
            config,
            cache: None,
            miner: None,
            extractor: None,
            encoder: None,
        }
    }

    /// Reuses extracted features across runs through a staging store.
    pub fn with_cache(mut self, cache: Arc<dyn StagingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the miner built from the config. The config's
    /// `quality_filter` is still applied to it.
    pub fn with_miner(mut self, miner: FrequentPatternMiner) -> Self {
        self.miner = Some(miner);
        self
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_encoder(mut self, encoder: TransactionEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn build(self) -> Result<PatternEngine, ConfigError> {
        self.config.validate()?;
        let config = self.config;
        let miner = self
            .miner
            .unwrap_or_else(|| {
                FrequentPatternMiner::with_limits(
                    config.miner,
                    config.max_itemset_size,
                    config.max_itemsets,
                )
            })
            .with_quality_filter(config.quality_filter);

        Ok(PatternEngine {
            extractor: self.extractor.unwrap_or_default(),
            encoder: self.encoder.unwrap_or_default(),
            miner,
            structural: StructuralGraphAnalyzer::default(),
            clusterer: StatisticalCluster::default(),
            validator: PatternValidator::new(config.significance_threshold),
            cache: self.cache,
            config,
        })
    }
}

// What survives the streaming pass.
#[derive(Default)]
struct Batch {
    transactions: Vec<Transaction>,
    topologies: Vec<WorkflowTopology>,
    selector: AdaptiveSelector,
    failed_workflows: usize,
    structural_issues: usize,
    cache_hits: usize,
}

impl PatternEngine {
    pub fn builder(config: PatternEngineConfig) -> PatternEngineBuilder {
        PatternEngineBuilder::new(config)
    }

    pub fn config(&self) -> &PatternEngineConfig {
        &self.config
    }

    pub fn discover_patterns<I>(&self, workflows: I) -> PatternResults
    where
        I: IntoIterator<Item = WorkflowGraph>,
    {
        let _span = info_span!("discover_patterns").entered();
        let batch = self.preprocess(workflows);

        let strategy = if self.config.adaptive_selection {
            batch.selector.select()
        } else {
            self.config.strategy
        };
        info!(
            workflows = batch.selector.observed(),
            transactions = batch.transactions.len(),
            failed = batch.failed_workflows,
            complexity = batch.selector.complexity(),
            %strategy,
            "preprocessing finished"
        );

        let mut stats = MiningStats::new(batch.selector.observed(), strategy);
        stats.total_transactions = batch.transactions.len();
        stats.failed_workflows = batch.failed_workflows;
        stats.structural_issues = batch.structural_issues;
        stats.cache_hits = batch.cache_hits;

        let outcome = match self.miner.mine(
            &batch.transactions,
            self.config.min_support,
            self.config.min_confidence,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("pattern mining failed: {}", e);
                stats.error = Some(e.to_string());
                return self.assemble(Vec::new(), Vec::new(), stats);
            }
        };

        stats.mining_algorithm = Some(outcome.algorithm);
        stats.average_transaction_length = outcome.average_transaction_length;
        stats.filtered_transactions = outcome.mined_transactions;

        if strategy.includes_structural() && self.config.enable_graph_analysis {
            stats.structural_patterns = Some(self.structural.analyze(&batch.topologies));
        }
        if strategy.includes_clustering() && self.config.enable_statistical_clustering {
            stats.pattern_clusters = Some(self.clusterer.cluster(&outcome.itemsets));
        }

        let rules = if self.config.validate_rules {
            let (kept, validation) = self.validator.filter_rules(outcome.rules);
            stats.validation = Some(validation);
            kept
        } else {
            outcome.rules
        };

        stats.total_frequent_itemsets = outcome.itemsets.len();
        stats.total_rules = rules.len();
        info!(
            itemsets = stats.total_frequent_itemsets,
            rules = stats.total_rules,
            algorithm = %outcome.algorithm,
            "pattern discovery finished"
        );
        self.assemble(outcome.itemsets, rules, stats)
    }

    fn preprocess<I>(&self, workflows: I) -> Batch
    where
        I: IntoIterator<Item = WorkflowGraph>,
    {
        let keep_topologies = self.config.enable_graph_analysis
            && (self.config.adaptive_selection || self.config.strategy.includes_structural());

        let mut batch = Batch::default();
        for workflow in workflows {
            batch.selector.observe(&workflow);

            let issues = workflow.structural_issues();
            for issue in &issues {
                warn!(workflow = %workflow.id, "structural issue: {}", issue);
            }
            batch.structural_issues += issues.len();

            match self.features_for(&workflow, &mut batch.cache_hits) {
                Ok(features) => batch.transactions.push(self.encoder.encode(
                    &workflow,
                    &features.node_features,
                    &features.connection_patterns,
                    &features.workflow_features,
                )),
                Err(e) => {
                    warn!(workflow = %workflow.id, "skipping workflow: {}", e);
                    batch.failed_workflows += 1;
                }
            }

            if keep_topologies {
                batch.topologies.push(WorkflowTopology::from(&workflow));
            }
        }
        batch
    }

    // Cache errors are never fatal: a failed lookup or store falls back to
    // plain extraction.
    fn features_for(
        &self,
        workflow: &WorkflowGraph,
        cache_hits: &mut usize,
    ) -> Result<ExtractedFeatures, ExtractionError> {
        let Some(cache) = &self.cache else {
            return self.extractor.extract(workflow);
        };
        let Some(key) = cache_key(workflow) else {
            return self.extractor.extract(workflow);
        };

        match cache.retrieve(&key) {
            Ok(Some(features)) => {
                debug!(workflow = %workflow.id, "staging cache hit");
                *cache_hits += 1;
                return Ok(features);
            }
            Ok(None) => {}
            Err(e) => warn!(workflow = %workflow.id, "staging lookup failed: {}", e),
        }

        let features = self.extractor.extract(workflow)?;
        if let Err(e) = cache.acquire(&key, &features) {
            warn!(workflow = %workflow.id, "staging store failed: {}", e);
        }
        Ok(features)
    }

    fn assemble(
        &self,
        itemsets: Vec<crate::mining::Itemset>,
        rules: Vec<crate::mining::AssociationRule>,
        stats: MiningStats,
    ) -> PatternResults {
        PatternResults {
            itemsets,
            rules,
            stats,
            mining_config: self.config.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Workflow id plus a fingerprint of its full content, so an edited workflow
/// never reuses stale features.
pub fn cache_key(workflow: &WorkflowGraph) -> Option<String> {
    let bytes = serde_json::to_vec(workflow).ok()?;
    Some(format!("{}:{:016x}", workflow.id, xxh3_64(&bytes)))
}
