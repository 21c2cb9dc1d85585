use serde::{Deserialize, Serialize};

use super::defaults;

/// MemRL Q-learning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemRlConfig {
    /// Learning rate for the EMA update.
    pub alpha: f64,
    /// Similarity gate for phase-one candidate selection.
    pub delta: f64,
    /// Weight of the Q-value in the composite score.
    pub lambda: f64,
    /// Minimum auto/human score gap that counts as a disagreement.
    pub disagreement_threshold: u8,
    /// Q-values below this are bucketed as low.
    pub low_below: f64,
    /// Q-values at or above this are bucketed as high.
    pub high_from: f64,
}

impl Default for MemRlConfig {
    fn default() -> Self {
        Self {
            alpha: defaults::DEFAULT_ALPHA,
            delta: defaults::DEFAULT_DELTA,
            lambda: defaults::DEFAULT_LAMBDA,
            disagreement_threshold: defaults::DEFAULT_DISAGREEMENT_THRESHOLD,
            low_below: defaults::DEFAULT_Q_LOW_BELOW,
            high_from: defaults::DEFAULT_Q_HIGH_FROM,
        }
    }
}
