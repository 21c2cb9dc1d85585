use crate::errors::MnemeResult;

/// A nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    pub label: u64,
    /// Cosine similarity in [-1, 1].
    pub score: f64,
}

/// Approximate nearest-neighbor index keyed by integer label.
pub trait IVectorIndex: Send + Sync {
    /// Insert or replace the vector stored under `label`.
    fn insert(&self, label: u64, vector: &[f32]) -> MnemeResult<()>;
    fn remove(&self, label: u64) -> MnemeResult<bool>;
    /// Up to `k` hits, best first.
    fn search(&self, query: &[f32], k: usize) -> MnemeResult<Vec<VectorHit>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&self) -> MnemeResult<()>;
}
