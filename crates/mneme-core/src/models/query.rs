use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::memory::MemoryEntry;

/// Post-search filters applied to candidate entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub tags: BTreeSet<String>,
    /// Require every tag instead of any tag.
    pub tag_match_all: bool,
    pub min_importance: Option<f64>,
}

impl QueryFilters {
    pub fn accepts(&self, entry: &MemoryEntry) -> bool {
        if let Some(min) = self.min_importance {
            if entry.metadata.importance < min {
                return false;
            }
        }
        if self.tags.is_empty() {
            return true;
        }
        if self.tag_match_all {
            self.tags.iter().all(|t| entry.metadata.tags.contains(t))
        } else {
            self.tags.iter().any(|t| entry.metadata.tags.contains(t))
        }
    }
}

/// Options for a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub top_k: usize,
    pub min_score: f64,
    pub filters: QueryFilters,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: crate::config::defaults::DEFAULT_TOP_K,
            min_score: crate::config::defaults::DEFAULT_MIN_SCORE,
            filters: QueryFilters::default(),
        }
    }
}

impl QueryOptions {
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn min_score(mut self, score: f64) -> Self {
        self.min_score = score;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I, match_all: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.tags = tags.into_iter().map(Into::into).collect();
        self.filters.tag_match_all = match_all;
        self
    }

    pub fn min_importance(mut self, importance: f64) -> Self {
        self.filters.min_importance = Some(importance);
        self
    }
}

/// One ranked query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub entry: MemoryEntry,
    pub similarity: f64,
}
