/// Causal graph errors.
#[derive(Debug, thiserror::Error)]
pub enum CausalError {
    #[error("relation requires at least one {side} entry")]
    EmptyEndpoints { side: &'static str },

    #[error("unknown relation type: {name}")]
    UnknownRelationType { name: String },

    #[error("detection strategy {strategy} failed: {reason}")]
    DetectionFailed { strategy: String, reason: String },
}
