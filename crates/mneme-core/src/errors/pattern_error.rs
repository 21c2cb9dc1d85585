/// Pattern template errors.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("template name already registered: {name}")]
    DuplicateName { name: String },

    #[error("invalid template {name}: {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error("template {name} failed to compile: {reason}")]
    CompileFailed { name: String, reason: String },
}
