/// Inputs to the L-Score formula.
///
/// ```text
/// lScore = geomean(confidences) × geomean(relevances) × depthDecay^depth
/// ```
///
/// Empty lists are neutral (1.0). The result is floored by the caller-supplied
/// minimum and never exceeds 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct LScoreInput {
    pub confidences: Vec<f64>,
    pub relevances: Vec<f64>,
    pub depth: u32,
    pub depth_decay: f64,
}

impl LScoreInput {
    pub fn new(depth: u32, depth_decay: f64) -> Self {
        Self {
            confidences: Vec::new(),
            relevances: Vec::new(),
            depth,
            depth_decay,
        }
    }

    pub fn with_confidences(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.confidences.extend(values);
        self
    }

    pub fn with_relevances(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.relevances.extend(values);
        self
    }
}

/// Compute an L-Score, floored at `min_l_score`.
pub fn compute_l_score(input: &LScoreInput, min_l_score: f64) -> f64 {
    let confidence = aggregate(&input.confidences);
    let relevance = aggregate(&input.relevances);
    let decay = if input.depth_decay.is_finite() {
        input.depth_decay.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let depth_factor = decay.powi(input.depth.min(i32::MAX as u32) as i32);

    let floor = if min_l_score.is_finite() {
        min_l_score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (confidence * relevance * depth_factor).clamp(floor, 1.0)
}

/// Geometric mean of the values clamped to [0, 1]. Non-finite values are
/// skipped; an empty set is neutral.
fn aggregate(values: &[f64]) -> f64 {
    let clamped: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .collect();
    if clamped.is_empty() {
        return 1.0;
    }
    if clamped.iter().any(|v| *v == 0.0) {
        return 0.0;
    }
    let log_sum: f64 = clamped.iter().map(|v| v.ln()).sum();
    (log_sum / clamped.len() as f64).exp().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_neutral() {
        let input = LScoreInput::new(0, 0.9);
        assert_eq!(compute_l_score(&input, 0.0), 1.0);
    }

    #[test]
    fn root_score_is_own_confidence() {
        let input = LScoreInput::new(0, 0.9).with_confidences([0.7]);
        assert!((compute_l_score(&input, 0.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn geometric_mean_of_two() {
        assert!((aggregate(&[0.25, 1.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn depth_decays_multiplicatively() {
        let input = LScoreInput::new(2, 0.5).with_confidences([1.0]);
        assert!((compute_l_score(&input, 0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn floor_applies() {
        let input = LScoreInput::new(0, 0.9).with_confidences([0.0]);
        assert_eq!(compute_l_score(&input, 0.05), 0.05);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let input = LScoreInput::new(0, 0.9)
            .with_confidences([1.5])
            .with_relevances([f64::NAN, 2.0]);
        assert_eq!(compute_l_score(&input, 0.0), 1.0);
    }
}
