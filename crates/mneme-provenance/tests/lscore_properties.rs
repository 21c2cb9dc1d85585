//! Property tests for the L-Score formula.

use mneme_provenance::{compute_l_score, LScoreInput};
use proptest::prelude::*;

proptest! {
    #[test]
    fn score_stays_within_floor_and_one(
        confidences in prop::collection::vec(-1.0f64..2.0, 0..8),
        relevances in prop::collection::vec(-1.0f64..2.0, 0..8),
        depth in 0u32..40,
        decay in 0.0f64..=1.0,
        floor in 0.0f64..0.5,
    ) {
        let input = LScoreInput::new(depth, decay)
            .with_confidences(confidences)
            .with_relevances(relevances);
        let score = compute_l_score(&input, floor);
        prop_assert!(score >= floor);
        prop_assert!(score <= 1.0);
    }

    #[test]
    fn deeper_never_scores_higher(
        confidences in prop::collection::vec(0.0f64..=1.0, 1..6),
        depth in 0u32..30,
        decay in 0.0f64..=1.0,
    ) {
        let shallow = LScoreInput::new(depth, decay).with_confidences(confidences.clone());
        let deep = LScoreInput::new(depth + 1, decay).with_confidences(confidences);
        prop_assert!(compute_l_score(&deep, 0.0) <= compute_l_score(&shallow, 0.0) + 1e-12);
    }
}
