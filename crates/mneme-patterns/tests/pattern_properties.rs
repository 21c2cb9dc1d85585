//! Property tests for scoring and normalization.

use mneme_core::config::PatternConfig;
use mneme_patterns::normalize::normalize_number;
use mneme_patterns::scoring::confidence;
use proptest::prelude::*;

proptest! {
    #[test]
    fn confidence_is_bounded(span in 0usize..500, extra in 0usize..500, priority in -50i64..50) {
        let c = confidence(span, span + extra, priority, &PatternConfig::default());
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn integers_normalize_to_themselves(n in -1_000_000i64..1_000_000) {
        prop_assert_eq!(normalize_number(&n.to_string()), Some(n.to_string()));
    }
}
