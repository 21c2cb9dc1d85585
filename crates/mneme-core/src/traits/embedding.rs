use crate::errors::MnemeResult;

/// Text → dense vector.
pub trait IEmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> MnemeResult<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> MnemeResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
