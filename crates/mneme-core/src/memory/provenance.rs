use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Derivation record for a memory entry.
///
/// `parent_ids` describe a DAG in principle; acyclicity is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceInfo {
    pub parent_ids: BTreeSet<String>,
    pub lineage_depth: u32,
    pub confidence: f64,
    pub relevance: f64,
    /// Cached L-Score. Refreshed only through `update_l_score`.
    pub l_score: Option<f64>,
}

impl ProvenanceInfo {
    /// A root entry with no parents.
    pub fn root(confidence: f64, relevance: f64) -> Self {
        Self {
            parent_ids: BTreeSet::new(),
            lineage_depth: 0,
            confidence: confidence.clamp(0.0, 1.0),
            relevance: relevance.clamp(0.0, 1.0),
            l_score: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

impl Default for ProvenanceInfo {
    fn default() -> Self {
        Self::root(1.0, 1.0)
    }
}

/// Caller-supplied provenance for a new entry. Depth and L-Score are derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceInput {
    pub parent_ids: BTreeSet<String>,
    pub confidence: Option<f64>,
    pub relevance: Option<f64>,
}

impl ProvenanceInput {
    pub fn derived_from<I, S>(parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent_ids: parents.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }
}
