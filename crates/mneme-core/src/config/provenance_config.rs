use serde::{Deserialize, Serialize};

use super::defaults;

/// Provenance / L-Score configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Multiplicative decay applied once per lineage step.
    pub depth_decay: f64,
    /// Floor for computed L-Scores.
    pub min_l_score: f64,
    /// Threshold used by `enforce_threshold`.
    pub l_score_threshold: f64,
    /// When true, entries below the threshold are rejected and filtered.
    pub enforce_threshold: bool,
    /// Default depth bound for lineage traces.
    pub lineage_max_depth: u32,
    /// Confidence assumed when the caller supplies none.
    pub default_confidence: f64,
    /// Relevance assumed when the caller supplies none.
    pub default_relevance: f64,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            depth_decay: defaults::DEFAULT_DEPTH_DECAY,
            min_l_score: defaults::DEFAULT_MIN_L_SCORE,
            l_score_threshold: defaults::DEFAULT_L_SCORE_THRESHOLD,
            enforce_threshold: defaults::DEFAULT_ENFORCE_THRESHOLD,
            lineage_max_depth: defaults::DEFAULT_LINEAGE_MAX_DEPTH,
            default_confidence: defaults::DEFAULT_CONFIDENCE,
            default_relevance: defaults::DEFAULT_RELEVANCE,
        }
    }
}
