use chrono::{DateTime, Utc};

use crate::errors::MnemeResult;
use crate::models::{CausalRelation, Direction};

/// Persistence for causal hyperedges.
pub trait ICausalStorage: Send + Sync {
    /// Insert the relation and its source/target join rows atomically.
    fn insert_relation(&self, relation: &CausalRelation) -> MnemeResult<()>;
    fn get_relation(&self, id: &str) -> MnemeResult<Option<CausalRelation>>;
    fn get_batch_relations(&self, ids: &[String]) -> MnemeResult<Vec<CausalRelation>>;
    /// Each matching relation appears once.
    fn get_relations_for_entry(
        &self,
        entry_id: &str,
        direction: Direction,
    ) -> MnemeResult<Vec<CausalRelation>>;
    fn delete_relation(&self, id: &str) -> MnemeResult<bool>;

    // --- Expiry ---
    fn count_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<usize>;
    fn get_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<Vec<CausalRelation>>;
    /// Delete expired relations and their join rows; returns the deleted ids.
    fn delete_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<Vec<String>>;

    fn relation_count(&self) -> MnemeResult<usize>;
}
