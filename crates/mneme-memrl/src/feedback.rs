//! Feedback scores → rewards, and auto/human disagreement checks.

use mneme_core::constants::{FEEDBACK_SCORE_MAX, FEEDBACK_SCORE_MIN};
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::models::FeedbackRating;

pub fn validate_score(score: u8) -> MnemeResult<()> {
    if (FEEDBACK_SCORE_MIN..=FEEDBACK_SCORE_MAX).contains(&score) {
        Ok(())
    } else {
        Err(MnemeError::ValidationError(format!(
            "feedback score {score} outside {FEEDBACK_SCORE_MIN}..={FEEDBACK_SCORE_MAX}"
        )))
    }
}

/// Map a 1-10 score onto a reward in [0, 1].
pub fn score_to_reward(score: u8) -> f64 {
    let clamped = score.clamp(FEEDBACK_SCORE_MIN, FEEDBACK_SCORE_MAX);
    f64::from(clamped - FEEDBACK_SCORE_MIN) / f64::from(FEEDBACK_SCORE_MAX - FEEDBACK_SCORE_MIN)
}

/// The rating that counts: human over automatic.
pub fn authoritative(ratings: &[FeedbackRating]) -> Option<&FeedbackRating> {
    ratings
        .iter()
        .find(|r| !r.auto)
        .or_else(|| ratings.iter().find(|r| r.auto))
}

/// `(auto, human)` scores when both exist and differ by at least `threshold`.
pub fn disagreement(ratings: &[FeedbackRating], threshold: u8) -> Option<(u8, u8)> {
    let auto = ratings.iter().find(|r| r.auto)?;
    let human = ratings.iter().find(|r| !r.auto)?;
    (auto.score.abs_diff(human.score) >= threshold).then_some((auto.score, human.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mneme_core::time;

    fn rating(score: u8, auto: bool) -> FeedbackRating {
        FeedbackRating {
            query_id: "q".into(),
            score,
            auto,
            created_at: time::now(),
        }
    }

    #[test]
    fn rewards_span_unit_interval() {
        assert_eq!(score_to_reward(1), 0.0);
        assert_eq!(score_to_reward(10), 1.0);
        assert!((score_to_reward(4) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn score_bounds() {
        assert!(validate_score(0).is_err());
        assert!(validate_score(11).is_err());
        assert!(validate_score(1).is_ok());
        assert!(validate_score(10).is_ok());
    }

    #[test]
    fn human_wins() {
        let ratings = vec![rating(3, true), rating(8, false)];
        assert_eq!(authoritative(&ratings).unwrap().score, 8);
        assert_eq!(authoritative(&ratings[..1]).unwrap().score, 3);
        assert!(authoritative(&[]).is_none());
    }

    #[test]
    fn disagreement_needs_both_and_gap() {
        assert_eq!(disagreement(&[rating(3, true), rating(8, false)], 2), Some((3, 8)));
        assert_eq!(disagreement(&[rating(7, true), rating(8, false)], 2), None);
        assert_eq!(disagreement(&[rating(3, true)], 2), None);
        assert_eq!(disagreement(&[rating(7, true), rating(8, false)], 1), Some((7, 8)));
        assert_eq!(disagreement(&[rating(8, true), rating(8, false)], 1), None);
    }
}
