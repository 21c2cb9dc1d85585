//! Two-phase MemRL ranking: similarity gate, then blended score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mneme_core::config::MemRlConfig;
use mneme_core::constants::Q_VALUE_INITIAL;
use mneme_core::models::RankedCandidate;

/// A retrieval candidate before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub entry_id: String,
    pub similarity: f64,
}

impl Candidate {
    pub fn new(entry_id: impl Into<String>, similarity: f64) -> Self {
        Self {
            entry_id: entry_id.into(),
            similarity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingParams {
    /// Phase one: candidates below this similarity are dropped.
    pub delta: f64,
    /// Phase two: weight of the Q-value in the blended score.
    pub lambda: f64,
}

impl RankingParams {
    pub fn from_config(config: &MemRlConfig) -> Self {
        Self {
            delta: config.delta,
            lambda: config.lambda,
        }
    }
}

impl Default for RankingParams {
    fn default() -> Self {
        Self::from_config(&MemRlConfig::default())
    }
}

/// Gate by `delta`, then order by `(1 − λ)·similarity + λ·Q` descending.
/// Entries without a known Q-value rank with the initial value. Duplicate
/// candidates keep their best similarity.
pub fn rank(
    candidates: &[Candidate],
    q_values: &HashMap<String, f64>,
    params: RankingParams,
) -> Vec<RankedCandidate> {
    let lambda = params.lambda.clamp(0.0, 1.0);

    let mut best: HashMap<&str, f64> = HashMap::new();
    for c in candidates.iter().filter(|c| c.similarity >= params.delta) {
        best.entry(c.entry_id.as_str())
            .and_modify(|s| *s = s.max(c.similarity))
            .or_insert(c.similarity);
    }

    let mut ranked: Vec<RankedCandidate> = best
        .into_iter()
        .map(|(id, similarity)| {
            let q_value = q_values.get(id).copied().unwrap_or(Q_VALUE_INITIAL);
            RankedCandidate {
                entry_id: id.to_string(),
                similarity,
                q_value,
                score: (1.0 - lambda) * similarity + lambda * q_value,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.similarity.total_cmp(&a.similarity))
            .then_with(|| a.entry_id.cmp(&b.entry_id))
    });
    ranked
}
