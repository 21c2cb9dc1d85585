use serde::{Deserialize, Serialize};

use super::defaults;

/// Pattern matcher scoring and pruning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Matches scoring below this are dropped.
    pub min_confidence: f64,
    /// Weight of the matched-span ratio.
    pub span_weight: f64,
    /// Constant added to every match.
    pub base_confidence: f64,
    /// Bonus per priority point.
    pub priority_bonus_per_point: f64,
    /// Cap for the priority bonus.
    pub max_priority_bonus: f64,
    /// Spans shorter than this many characters are penalized.
    pub short_match_chars: usize,
    pub short_match_penalty: f64,
    /// Templates used fewer times than this are never pruned.
    pub prune_min_uses: u64,
    /// Templates at or above this success rate are never pruned.
    pub prune_max_success_rate: f64,
    /// Capacity of the compiled-matcher cache.
    pub compiled_cache_capacity: u64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_confidence: defaults::DEFAULT_PATTERN_MIN_CONFIDENCE,
            span_weight: defaults::DEFAULT_SPAN_WEIGHT,
            base_confidence: defaults::DEFAULT_BASE_CONFIDENCE,
            priority_bonus_per_point: defaults::DEFAULT_PRIORITY_BONUS_PER_POINT,
            max_priority_bonus: defaults::DEFAULT_MAX_PRIORITY_BONUS,
            short_match_chars: defaults::DEFAULT_SHORT_MATCH_CHARS,
            short_match_penalty: defaults::DEFAULT_SHORT_MATCH_PENALTY,
            prune_min_uses: defaults::DEFAULT_PRUNE_MIN_USES,
            prune_max_success_rate: defaults::DEFAULT_PRUNE_MAX_SUCCESS_RATE,
            compiled_cache_capacity: defaults::DEFAULT_COMPILED_CACHE_CAPACITY,
        }
    }
}
