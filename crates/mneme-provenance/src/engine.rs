//! ProvenanceEngine: L-Scores at store time, cached refreshes, lineage traces,
//! and threshold enforcement.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use mneme_core::config::ProvenanceConfig;
use mneme_core::constants::MAX_LINEAGE_DEPTH;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::{MemoryEntry, ProvenanceInfo, ProvenanceInput};
use mneme_core::models::LineageTree;
use mneme_core::traits::IMemoryStorage;

use crate::lineage;
use crate::lscore::{compute_l_score, LScoreInput};

pub struct ProvenanceEngine {
    storage: Arc<dyn IMemoryStorage>,
    config: ProvenanceConfig,
}

impl ProvenanceEngine {
    pub fn new(storage: Arc<dyn IMemoryStorage>, config: ProvenanceConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &ProvenanceConfig {
        &self.config
    }

    /// Compute an L-Score floored at the configured minimum.
    pub fn compute_l_score(&self, input: &LScoreInput) -> f64 {
        compute_l_score(input, self.config.min_l_score)
    }

    /// Derive lineage depth and the initial L-Score for a new entry.
    ///
    /// Unknown parents are kept as links but count as roots: depth 0 and
    /// neutral confidence/relevance.
    pub fn score_new_entry(&self, input: &ProvenanceInput) -> MnemeResult<ProvenanceInfo> {
        let confidence = input
            .confidence
            .unwrap_or(self.config.default_confidence)
            .clamp(0.0, 1.0);
        let relevance = input
            .relevance
            .unwrap_or(self.config.default_relevance)
            .clamp(0.0, 1.0);

        let mut info = ProvenanceInfo::root(confidence, relevance);
        info.parent_ids = input.parent_ids.clone();

        let parents = self.load_parents(&info)?;
        if !info.parent_ids.is_empty() {
            if parents.len() < info.parent_ids.len() {
                debug!(
                    missing = info.parent_ids.len() - parents.len(),
                    "new entry references unknown parents"
                );
            }
            let max_parent_depth = parents.values().map(|p| p.lineage_depth).max().unwrap_or(0);
            info.lineage_depth = max_parent_depth.saturating_add(1);
        }

        info.l_score = Some(self.score_with_parents(&info, &parents));
        Ok(info)
    }

    /// Recompute the L-Score of a stored entry and cache it.
    /// Returns `None` when the entry does not exist.
    pub fn refresh_l_score(&self, entry_id: &str) -> MnemeResult<Option<f64>> {
        let Some(info) = self.storage.get_provenance(entry_id)? else {
            return Ok(None);
        };
        let parents = self.load_parents(&info)?;
        let score = self.score_with_parents(&info, &parents);
        self.storage.update_l_score(entry_id, score)?;
        debug!(entry_id, l_score = score, "l-score refreshed");
        Ok(Some(score))
    }

    /// Persist a cached L-Score without touching any other provenance field.
    pub fn update_l_score(&self, entry_id: &str, score: f64) -> MnemeResult<bool> {
        self.storage.update_l_score(entry_id, score.clamp(0.0, 1.0))
    }

    /// Trace the lineage of `root_id` down to `max_depth` hops (configured
    /// default when `None`). Returns `None` when the root does not exist.
    pub fn trace_lineage(
        &self,
        root_id: &str,
        max_depth: Option<u32>,
    ) -> MnemeResult<Option<LineageTree>> {
        if self.storage.get_provenance(root_id)?.is_none() {
            return Ok(None);
        }
        let depth = max_depth
            .unwrap_or(self.config.lineage_max_depth)
            .min(MAX_LINEAGE_DEPTH);

        let links = self.storage.get_lineage_entry_ids(root_id, depth)?;

        let mut ids: Vec<String> = Vec::with_capacity(links.len() + 1);
        ids.push(root_id.to_string());
        ids.extend(links.iter().map(|l| l.parent_id.clone()));
        ids.sort();
        ids.dedup();
        let provenance = self.storage.get_batch_provenance(&ids)?;

        let tree = lineage::build_tree(root_id, depth, &links, &provenance);
        if tree.has_cycle {
            info!(root_id, "lineage contains a cycle");
        }
        Ok(Some(tree))
    }

    /// Reject a score below the threshold when enforcement is on.
    pub fn check_threshold(&self, score: f64) -> MnemeResult<()> {
        if self.config.enforce_threshold && score < self.config.l_score_threshold {
            return Err(MnemeError::LScoreBelowThreshold {
                score,
                threshold: self.config.l_score_threshold,
            });
        }
        Ok(())
    }

    /// Whether an entry survives threshold filtering. Entries without a
    /// cached score always pass.
    pub fn passes_threshold(&self, entry: &MemoryEntry) -> bool {
        !self.config.enforce_threshold
            || entry
                .provenance
                .l_score
                .map_or(true, |s| s >= self.config.l_score_threshold)
    }

    fn load_parents(&self, info: &ProvenanceInfo) -> MnemeResult<HashMap<String, ProvenanceInfo>> {
        if info.parent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<String> = info.parent_ids.iter().cloned().collect();
        self.storage.get_batch_provenance(&ids)
    }

    fn score_with_parents(
        &self,
        info: &ProvenanceInfo,
        parents: &HashMap<String, ProvenanceInfo>,
    ) -> f64 {
        let input = LScoreInput::new(info.lineage_depth, self.config.depth_decay)
            .with_confidences(
                std::iter::once(info.confidence).chain(parents.values().map(|p| p.confidence)),
            )
            .with_relevances(
                std::iter::once(info.relevance).chain(parents.values().map(|p| p.relevance)),
            );
        self.compute_l_score(&input)
    }
}
