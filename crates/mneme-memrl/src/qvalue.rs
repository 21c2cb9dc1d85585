use mneme_core::constants::{Q_VALUE_MAX, Q_VALUE_MIN};

/// EMA Q-value update.
///
/// ```text
/// Q ← clamp(Q + α × (reward − Q), 0.1, 1.0)
/// ```
///
/// A non-finite reward or alpha leaves `q` unchanged (still clamped).
pub fn ema_update(q: f64, reward: f64, alpha: f64) -> f64 {
    if !reward.is_finite() || !alpha.is_finite() {
        return clamp_q(q);
    }
    clamp_q(q + alpha.clamp(0.0, 1.0) * (reward - q))
}

pub fn clamp_q(q: f64) -> f64 {
    if q.is_nan() {
        return Q_VALUE_MIN;
    }
    q.clamp(Q_VALUE_MIN, Q_VALUE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_full_reward_from_initial() {
        assert!((ema_update(0.5, 1.0, 0.1) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn clamps_both_ends() {
        assert_eq!(ema_update(1.0, 5.0, 1.0), 1.0);
        assert_eq!(ema_update(0.1, -3.0, 1.0), 0.1);
    }

    #[test]
    fn non_finite_reward_is_ignored() {
        assert_eq!(ema_update(0.4, f64::NAN, 0.1), 0.4);
        assert_eq!(ema_update(0.4, 1.0, f64::INFINITY), 0.4);
    }
}
