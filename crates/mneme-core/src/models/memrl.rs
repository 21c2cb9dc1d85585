use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate as it was ranked, captured for later attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub entry_id: String,
    pub similarity: f64,
    pub q_value: f64,
    /// (1 − λ)·similarity + λ·Q at decision time.
    pub score: f64,
}

/// Snapshot of one ranking decision. Write-once except `has_feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemRlQueryRecord {
    pub id: String,
    pub query_text: String,
    pub candidates: Vec<RankedCandidate>,
    pub delta: f64,
    pub lambda: f64,
    pub has_feedback: bool,
    pub created_at: DateTime<Utc>,
}

/// A 1-10 rating of a query's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRating {
    pub query_id: String,
    pub score: u8,
    /// Produced by an automatic judge rather than a human.
    pub auto: bool,
    pub created_at: DateTime<Utc>,
}

/// An automatic and a human score for the same query that disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDisagreement {
    pub query_id: String,
    pub auto_score: u8,
    pub human_score: u8,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackDisagreement {
    pub fn gap(&self) -> u8 {
        self.auto_score.abs_diff(self.human_score)
    }
}

/// Q-value histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QValueDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl QValueDistribution {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}
