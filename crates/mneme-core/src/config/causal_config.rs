use serde::{Deserialize, Serialize};

use super::defaults;

/// Inclusive strength range that a similarity margin is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRange {
    pub min: f64,
    pub max: f64,
}

impl StrengthRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Linearly scale `similarity` above `threshold` into this range.
    /// A similarity at the threshold maps to `min`, a perfect match to `max`.
    pub fn scale(&self, similarity: f64, threshold: f64) -> f64 {
        let span = (1.0 - threshold).max(f64::EPSILON);
        let margin = ((similarity - threshold) / span).clamp(0.0, 1.0);
        (self.min + margin * (self.max - self.min)).clamp(self.min, self.max)
    }
}

/// Causal graph and automatic detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalConfig {
    /// Run detection strategies after every store.
    pub detection_enabled: bool,
    /// Maximum similar entries requested per strategy.
    pub search_limit: usize,

    pub bug_fix_min_similarity: f64,
    pub bug_fix_strength: StrengthRange,

    pub error_resolution_min_similarity: f64,
    pub error_resolution_strength: StrengthRange,

    pub architecture_min_similarity: f64,
    pub architecture_strong_similarity: f64,
    pub architecture_shared_tag_strength: f64,
    pub architecture_similarity_strength: f64,

    pub cross_instance_min_similarity: f64,
    pub cross_instance_strength: f64,

    pub session_base_strength: f64,
    pub session_overlap_step: f64,
    pub session_max_strength: f64,
    /// Number of prior session entries inspected for file overlap.
    pub session_lookback: usize,
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            detection_enabled: defaults::DEFAULT_DETECTION_ENABLED,
            search_limit: defaults::DEFAULT_DETECTION_SEARCH_LIMIT,
            bug_fix_min_similarity: defaults::DEFAULT_BUG_FIX_MIN_SIMILARITY,
            bug_fix_strength: StrengthRange::new(
                defaults::DEFAULT_BUG_FIX_STRENGTH_MIN,
                defaults::DEFAULT_BUG_FIX_STRENGTH_MAX,
            ),
            error_resolution_min_similarity: defaults::DEFAULT_ERROR_RESOLUTION_MIN_SIMILARITY,
            error_resolution_strength: StrengthRange::new(
                defaults::DEFAULT_ERROR_RESOLUTION_STRENGTH_MIN,
                defaults::DEFAULT_ERROR_RESOLUTION_STRENGTH_MAX,
            ),
            architecture_min_similarity: defaults::DEFAULT_ARCH_MIN_SIMILARITY,
            architecture_strong_similarity: defaults::DEFAULT_ARCH_STRONG_SIMILARITY,
            architecture_shared_tag_strength: defaults::DEFAULT_ARCH_SHARED_TAG_STRENGTH,
            architecture_similarity_strength: defaults::DEFAULT_ARCH_SIMILARITY_STRENGTH,
            cross_instance_min_similarity: defaults::DEFAULT_CROSS_INSTANCE_MIN_SIMILARITY,
            cross_instance_strength: defaults::DEFAULT_CROSS_INSTANCE_STRENGTH,
            session_base_strength: defaults::DEFAULT_SESSION_BASE_STRENGTH,
            session_overlap_step: defaults::DEFAULT_SESSION_OVERLAP_STEP,
            session_max_strength: defaults::DEFAULT_SESSION_MAX_STRENGTH,
            session_lookback: defaults::DEFAULT_SESSION_LOOKBACK,
        }
    }
}
