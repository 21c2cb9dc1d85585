//! Error taxonomy. Subsystem errors fold into [`MnemeError`] via `From`.

mod causal_error;
mod pattern_error;
mod storage_error;

pub use causal_error::CausalError;
pub use pattern_error::PatternError;
pub use storage_error::StorageError;

/// Top-level error type for the Mneme engine.
#[derive(Debug, thiserror::Error)]
pub enum MnemeError {
    #[error("memory entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("MemRL query not found: {id}")]
    QueryNotFound { id: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("causal error: {0}")]
    CausalError(#[from] CausalError),

    #[error("pattern error: {0}")]
    PatternError(#[from] PatternError),

    #[error("L-Score {score:.3} is below the enforced threshold {threshold:.3}")]
    LScoreBelowThreshold { score: f64, threshold: f64 },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("embedding error: {0}")]
    EmbeddingError(String),

    #[error("vector index error: {0}")]
    IndexError(String),

    #[error("concurrency error: {0}")]
    ConcurrencyError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// Convenience alias used across the workspace.
pub type MnemeResult<T> = Result<T, MnemeError>;
