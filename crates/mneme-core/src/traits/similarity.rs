use crate::errors::MnemeResult;
use crate::memory::MemoryEntry;

/// Constraints on a similarity search run on behalf of causal detection.
#[derive(Debug, Clone, Default)]
pub struct SimilarityFilter {
    /// Candidates must carry at least one of these tags. Empty means no tag constraint.
    pub any_tags: Vec<String>,
    pub min_similarity: f64,
    pub limit: usize,
    pub exclude_id: Option<String>,
}

impl SimilarityFilter {
    pub fn new(min_similarity: f64, limit: usize) -> Self {
        Self {
            any_tags: Vec::new(),
            min_similarity,
            limit,
            exclude_id: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct SimilarMatch {
    pub entry: MemoryEntry,
    pub similarity: f64,
}

/// Content similarity over stored entries.
pub trait ISimilaritySearch: Send + Sync {
    fn find_similar(&self, content: &str, filter: &SimilarityFilter)
        -> MnemeResult<Vec<SimilarMatch>>;
}
