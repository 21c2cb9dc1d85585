use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::TieringConfig;
use crate::errors::MnemeResult;
use crate::memory::{MemoryEntry, ProvenanceInfo};
use crate::models::{DeletionReport, LineageLink, TierCounts, VectorMapping};

/// Entries, tags, and provenance.
pub trait IMemoryStorage: Send + Sync {
    // --- CRUD ---
    /// Persist an entry with its tags, provenance, and parent links in one transaction.
    fn create_entry(&self, entry: &MemoryEntry) -> MnemeResult<()>;
    fn get_entry(&self, id: &str) -> MnemeResult<Option<MemoryEntry>>;
    /// Entries in input order; unknown ids are omitted.
    fn get_batch_entries(&self, ids: &[String]) -> MnemeResult<Vec<MemoryEntry>>;
    fn get_all_entries(&self) -> MnemeResult<Vec<MemoryEntry>>;
    /// Most recently created entries first.
    fn recent_entries(&self, limit: usize) -> MnemeResult<Vec<MemoryEntry>>;
    /// Newest entries whose context is a session summary, newest first.
    fn recent_session_entries(&self, limit: usize) -> MnemeResult<Vec<MemoryEntry>>;
    fn delete_entry(&self, id: &str) -> MnemeResult<DeletionReport>;
    /// Delete every entry carrying none of `keep_tags`.
    fn delete_except_tags(&self, keep_tags: &[String]) -> MnemeResult<DeletionReport>;
    fn count_entries(&self) -> MnemeResult<usize>;

    // --- Query ---
    fn query_by_tags(&self, tags: &[String], match_all: bool) -> MnemeResult<Vec<MemoryEntry>>;

    // --- Provenance ---
    fn get_provenance(&self, id: &str) -> MnemeResult<Option<ProvenanceInfo>>;
    fn get_batch_provenance(&self, ids: &[String])
        -> MnemeResult<HashMap<String, ProvenanceInfo>>;
    /// Returns false when the entry does not exist.
    fn update_l_score(&self, id: &str, l_score: f64) -> MnemeResult<bool>;
    /// Ancestor links reachable from `root_id` within `max_depth` hops.
    fn get_lineage_entry_ids(&self, root_id: &str, max_depth: u32)
        -> MnemeResult<Vec<LineageLink>>;
}

/// Entry ↔ ANN label mapping and access-driven tiering.
pub trait IVectorMappingStorage: Send + Sync {
    /// Assign (or return the existing) label for an entry.
    fn assign_vector_label(&self, entry_id: &str) -> MnemeResult<u64>;
    fn get_vector_mapping(&self, entry_id: &str) -> MnemeResult<Option<VectorMapping>>;
    fn get_entry_ids_for_labels(&self, labels: &[u64]) -> MnemeResult<HashMap<u64, String>>;
    /// Bump access counters; returns the number of mappings touched.
    fn record_vector_access(&self, entry_ids: &[String], at: DateTime<Utc>)
        -> MnemeResult<usize>;
    /// Reassign tiers; returns the number of mappings whose tier changed.
    fn update_compression_tiers(
        &self,
        policy: &TieringConfig,
        now: DateTime<Utc>,
    ) -> MnemeResult<usize>;
    fn tier_counts(&self) -> MnemeResult<TierCounts>;
    fn all_vector_mappings(&self) -> MnemeResult<Vec<VectorMapping>>;
}

/// Key/value system metadata.
pub trait IMetadataStorage: Send + Sync {
    fn get_metadata(&self, key: &str) -> MnemeResult<Option<String>>;
    fn set_metadata(&self, key: &str, value: &str) -> MnemeResult<()>;
}
