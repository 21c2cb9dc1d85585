use std::collections::HashMap;

use crate::errors::MnemeResult;
use crate::models::{FeedbackDisagreement, FeedbackRating, MemRlQueryRecord, QValueDistribution};

/// Update rule `(current_q, reward) -> new_q` applied inside the write transaction.
pub type QUpdateRule<'a> = &'a dyn Fn(f64, f64) -> f64;

/// Q-values, ranking snapshots, and feedback.
pub trait IMemRlStorage: Send + Sync {
    // --- Q-values ---
    /// `None` when the entry does not exist.
    fn get_q_value(&self, entry_id: &str) -> MnemeResult<Option<f64>>;
    fn get_q_values(&self, entry_ids: &[String]) -> MnemeResult<HashMap<String, f64>>;
    /// Apply `rule` to every `(entry_id, reward)` in a single transaction.
    /// Returns the new values of the entries that exist.
    fn update_q_values(
        &self,
        rewards: &[(String, f64)],
        rule: QUpdateRule<'_>,
    ) -> MnemeResult<HashMap<String, f64>>;

    // --- Queries ---
    fn insert_query_record(&self, record: &MemRlQueryRecord) -> MnemeResult<()>;
    fn get_query_record(&self, id: &str) -> MnemeResult<Option<MemRlQueryRecord>>;
    fn query_count(&self) -> MnemeResult<usize>;
    fn count_queries_without_feedback(&self) -> MnemeResult<usize>;

    // --- Feedback ---
    /// Insert or replace the rating for `(query_id, auto)` and flag the query.
    fn upsert_feedback(&self, rating: &FeedbackRating) -> MnemeResult<()>;
    fn get_feedback(&self, query_id: &str) -> MnemeResult<Vec<FeedbackRating>>;
    fn insert_disagreement(&self, disagreement: &FeedbackDisagreement) -> MnemeResult<()>;
    fn list_disagreements(&self) -> MnemeResult<Vec<FeedbackDisagreement>>;

    // --- Reporting ---
    fn q_value_distribution(&self, low_below: f64, high_from: f64)
        -> MnemeResult<QValueDistribution>;
}
