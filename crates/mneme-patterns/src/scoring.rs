use mneme_core::config::PatternConfig;

/// Match confidence.
///
/// ```text
/// confidence = spanWeight × (span / total)
///   + baseConfidence
///   + min(priority × bonusPerPoint, maxBonus)
///   − shortMatchPenalty   (span shorter than shortMatchChars)
/// ```
///
/// Negative priorities earn no bonus. Result is clamped to [0.0, 1.0].
pub fn confidence(span_chars: usize, total_chars: usize, priority: i64, config: &PatternConfig) -> f64 {
    if total_chars == 0 || span_chars == 0 {
        return 0.0;
    }
    let coverage = (span_chars as f64 / total_chars as f64).min(1.0);
    let bonus = if priority > 0 {
        (priority as f64 * config.priority_bonus_per_point).min(config.max_priority_bonus)
    } else {
        0.0
    };
    let penalty = if span_chars < config.short_match_chars {
        config.short_match_penalty
    } else {
        0.0
    };
    (config.span_weight * coverage + config.base_confidence + bonus - penalty).clamp(0.0, 1.0)
}
