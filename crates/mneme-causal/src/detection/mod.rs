//! Automatic causal detection. Runs every strategy against a freshly stored
//! entry; a failing strategy is logged and counted, never propagated.

pub mod strategies;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use mneme_core::config::CausalConfig;
use mneme_core::errors::{CausalError, MnemeResult};
use mneme_core::memory::{MemoryEntry, MetadataValue};
use mneme_core::models::{CausalRelation, CausalRelationType, Direction, RelationOptions};
use mneme_core::traits::{IMemoryStorage, ISimilaritySearch};

use crate::graph::CausalGraph;

/// Metadata key naming the strategy that produced a relation.
pub const DETECTED_BY_KEY: &str = "detected_by";

/// The detection heuristics, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    BugFix,
    ErrorResolution,
    Architecture,
    CrossInstance,
    SessionChain,
}

impl DetectionStrategy {
    pub const ALL: [DetectionStrategy; 5] = [
        Self::BugFix,
        Self::ErrorResolution,
        Self::Architecture,
        Self::CrossInstance,
        Self::SessionChain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BugFix => "bug_fix",
            Self::ErrorResolution => "error_resolution",
            Self::Architecture => "architecture",
            Self::CrossInstance => "cross_instance",
            Self::SessionChain => "session_chain",
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A relation a strategy wants to create.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedRelation {
    pub source_ids: BTreeSet<String>,
    pub target_ids: BTreeSet<String>,
    pub relation_type: CausalRelationType,
    pub strength: f64,
}

impl ProposedRelation {
    pub fn single(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: CausalRelationType,
        strength: f64,
    ) -> Self {
        Self {
            source_ids: BTreeSet::from([source.into()]),
            target_ids: BTreeSet::from([target.into()]),
            relation_type,
            strength,
        }
    }

    fn matches(&self, existing: &CausalRelation) -> bool {
        existing.relation_type == self.relation_type
            && existing.source_ids == self.source_ids
            && existing.target_ids == self.target_ids
    }
}

/// Everything a strategy may consult.
pub struct DetectionContext<'a> {
    pub similarity: &'a dyn ISimilaritySearch,
    pub storage: &'a dyn IMemoryStorage,
    pub config: &'a CausalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyFailure {
    pub strategy: DetectionStrategy,
    pub reason: String,
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    pub created: Vec<CausalRelation>,
    /// Proposals skipped because an identical relation already exists.
    pub duplicates: usize,
    pub failures: Vec<StrategyFailure>,
    pub per_strategy: BTreeMap<&'static str, usize>,
}

impl DetectionReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

pub struct DetectionEngine {
    graph: Arc<CausalGraph>,
    similarity: Arc<dyn ISimilaritySearch>,
    storage: Arc<dyn IMemoryStorage>,
    config: CausalConfig,
}

impl DetectionEngine {
    pub fn new(
        graph: Arc<CausalGraph>,
        similarity: Arc<dyn ISimilaritySearch>,
        storage: Arc<dyn IMemoryStorage>,
        config: CausalConfig,
    ) -> Self {
        Self {
            graph,
            similarity,
            storage,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.detection_enabled
    }

    /// Run every strategy for `entry`.
    pub fn detect(&self, entry: &MemoryEntry) -> DetectionReport {
        let mut report = DetectionReport::default();
        if !self.config.detection_enabled {
            return report;
        }

        let ctx = DetectionContext {
            similarity: self.similarity.as_ref(),
            storage: self.storage.as_ref(),
            config: &self.config,
        };

        let mut existing = match self.graph.get_relations_for_entry(&entry.id, Direction::Both) {
            Ok(rels) => rels,
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "could not load existing relations");
                Vec::new()
            }
        };

        for strategy in DetectionStrategy::ALL {
            let proposals = match run_strategy(strategy, &ctx, entry) {
                Ok(p) => p,
                Err(e) => {
                    record_failure(&mut report, strategy, entry, e.to_string());
                    continue;
                }
            };

            for proposal in proposals {
                if existing.iter().any(|r| proposal.matches(r)) {
                    report.duplicates += 1;
                    continue;
                }
                match self.create(strategy, &proposal) {
                    Ok(relation) => {
                        *report.per_strategy.entry(strategy.name()).or_default() += 1;
                        existing.push(relation.clone());
                        report.created.push(relation);
                    }
                    Err(e) => record_failure(&mut report, strategy, entry, e.to_string()),
                }
            }
        }

        if !report.created.is_empty() {
            debug!(
                entry_id = %entry.id,
                created = report.created.len(),
                failures = report.failures.len(),
                "causal detection complete"
            );
        }
        report
    }

    fn create(
        &self,
        strategy: DetectionStrategy,
        proposal: &ProposedRelation,
    ) -> MnemeResult<CausalRelation> {
        let options = RelationOptions::default()
            .with_metadata(DETECTED_BY_KEY, MetadataValue::from(strategy.name()));
        self.graph.add_relation(
            proposal.source_ids.iter().cloned(),
            proposal.target_ids.iter().cloned(),
            proposal.relation_type,
            proposal.strength,
            options,
        )
    }
}

fn run_strategy(
    strategy: DetectionStrategy,
    ctx: &DetectionContext<'_>,
    entry: &MemoryEntry,
) -> MnemeResult<Vec<ProposedRelation>> {
    match strategy {
        DetectionStrategy::BugFix => strategies::bug_fix::detect(ctx, entry),
        DetectionStrategy::ErrorResolution => strategies::error_resolution::detect(ctx, entry),
        DetectionStrategy::Architecture => strategies::architecture::detect(ctx, entry),
        DetectionStrategy::CrossInstance => strategies::cross_instance::detect(ctx, entry),
        DetectionStrategy::SessionChain => strategies::session_chain::detect(ctx, entry),
    }
}

fn record_failure(
    report: &mut DetectionReport,
    strategy: DetectionStrategy,
    entry: &MemoryEntry,
    reason: String,
) {
    let error = CausalError::DetectionFailed {
        strategy: strategy.name().to_string(),
        reason: reason.clone(),
    };
    warn!(entry_id = %entry.id, strategy = strategy.name(), error = %error, "causal detection strategy failed");
    report.failures.push(StrategyFailure { strategy, reason });
}
