use serde::{Deserialize, Serialize};

use super::defaults;

/// Hot/warm/cold classification thresholds for vector mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TieringConfig {
    /// Access count at which a vector is hot regardless of recency.
    pub hot_min_access: u64,
    /// Vectors untouched for this many days drop to warm.
    pub warm_after_days: u32,
    /// Vectors untouched for this many days drop to cold.
    pub cold_after_days: u32,
}

impl Default for TieringConfig {
    fn default() -> Self {
        Self {
            hot_min_access: defaults::DEFAULT_HOT_MIN_ACCESS,
            warm_after_days: defaults::DEFAULT_WARM_AFTER_DAYS,
            cold_after_days: defaults::DEFAULT_COLD_AFTER_DAYS,
        }
    }
}
