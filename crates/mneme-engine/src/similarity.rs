//! Content similarity over the vector index, resolved back to stored entries.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::MemoryEntry;
use mneme_core::traits::{
    IEmbeddingProvider, IMemoryStorage, ISimilaritySearch, IVectorIndex, IVectorMappingStorage,
    SimilarMatch, SimilarityFilter, VectorHit,
};

/// Embeds text and runs nearest-neighbor searches against the index.
pub struct VectorSimilarity {
    embedder: Arc<dyn IEmbeddingProvider>,
    index: Arc<dyn IVectorIndex>,
    entries: Arc<dyn IMemoryStorage>,
    mappings: Arc<dyn IVectorMappingStorage>,
    oversample_factor: usize,
}

impl VectorSimilarity {
    pub fn new(
        embedder: Arc<dyn IEmbeddingProvider>,
        index: Arc<dyn IVectorIndex>,
        entries: Arc<dyn IMemoryStorage>,
        mappings: Arc<dyn IVectorMappingStorage>,
        oversample_factor: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            entries,
            mappings,
            oversample_factor: oversample_factor.max(1),
        }
    }

    /// Embed `text`, checking the provider's declared dimensions.
    pub fn embed(&self, text: &str) -> MnemeResult<Vec<f32>> {
        let vector = self.embedder.embed(text)?;
        if vector.len() != self.embedder.dimensions() {
            return Err(MnemeError::EmbeddingError(format!(
                "{} returned {} dimensions, expected {}",
                self.embedder.name(),
                vector.len(),
                self.embedder.dimensions()
            )));
        }
        Ok(vector)
    }

    /// Nearest entries for `text`, best first, with their cosine similarity.
    pub fn search(&self, text: &str, limit: usize) -> MnemeResult<Vec<(MemoryEntry, f64)>> {
        self.search_where(text, limit, f64::NEG_INFINITY, |_| true)
    }

    /// Up to `limit` nearest entries with similarity at least `min_similarity`
    /// that `accept` keeps, best first.
    ///
    /// The index is first asked for `limit × oversample` hits. While filtering
    /// leaves fewer than `limit`, the window doubles until the index is
    /// exhausted or the worst hit in the window falls below `min_similarity`.
    pub fn search_where<F>(
        &self,
        text: &str,
        limit: usize,
        min_similarity: f64,
        accept: F,
    ) -> MnemeResult<Vec<(MemoryEntry, f64)>>
    where
        F: Fn(&MemoryEntry) -> bool,
    {
        if limit == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embed(text)?;
        let mut k = limit.saturating_mul(self.oversample_factor);

        loop {
            let hits = self.index.search(&query, k)?;
            let exhausted = hits.len() < k || k >= self.index.len();
            let past_floor = hits.last().map_or(true, |h| h.score < min_similarity);

            let found: Vec<(MemoryEntry, f64)> = self
                .resolve(&hits)?
                .into_iter()
                .filter(|(entry, similarity)| *similarity >= min_similarity && accept(entry))
                .take(limit)
                .collect();
            if found.len() >= limit || exhausted || past_floor {
                return Ok(found);
            }
            trace!(window = k, found = found.len(), "widening similarity window");
            k = k.saturating_mul(2);
        }
    }

    /// Map hits to entries, keeping hit order. Labels without a mapping or
    /// entry are dropped.
    fn resolve(&self, hits: &[VectorHit]) -> MnemeResult<Vec<(MemoryEntry, f64)>> {
        if hits.is_empty() {
            return Ok(Vec::new());
        }
        let labels: Vec<u64> = hits.iter().map(|h| h.label).collect();
        let ids = self.mappings.get_entry_ids_for_labels(&labels)?;

        let wanted: Vec<String> = hits
            .iter()
            .filter_map(|h| ids.get(&h.label).cloned())
            .collect();
        let mut by_id: HashMap<String, MemoryEntry> = self
            .entries
            .get_batch_entries(&wanted)?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        Ok(hits
            .iter()
            .filter_map(|h| {
                let id = ids.get(&h.label)?;
                by_id.remove(id).map(|entry| (entry, h.score))
            })
            .collect())
    }
}

impl ISimilaritySearch for VectorSimilarity {
    fn find_similar(
        &self,
        content: &str,
        filter: &SimilarityFilter,
    ) -> MnemeResult<Vec<SimilarMatch>> {
        let found = self.search_where(content, filter.limit, filter.min_similarity, |entry| {
            filter.exclude_id.as_deref() != Some(entry.id.as_str())
                && (filter.any_tags.is_empty() || filter.any_tags.iter().any(|t| entry.has_tag(t)))
        })?;
        Ok(found
            .into_iter()
            .map(|(entry, similarity)| SimilarMatch { entry, similarity })
            .collect())
    }
}
