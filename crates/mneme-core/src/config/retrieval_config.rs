use serde::{Deserialize, Serialize};

use super::defaults;

/// Query defaults for the façade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    pub default_min_score: f64,
    /// Nearest-neighbor candidates requested per result slot, to leave room
    /// for post-search filtering.
    pub oversample_factor: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: defaults::DEFAULT_TOP_K,
            default_min_score: defaults::DEFAULT_MIN_SCORE,
            oversample_factor: defaults::DEFAULT_OVERSAMPLE_FACTOR,
        }
    }
}
