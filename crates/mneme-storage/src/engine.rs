//! StorageEngine: owns the connection pool and the label allocator, runs
//! migrations at startup, and implements every storage trait.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use mneme_core::config::{StorageConfig, TieringConfig};
use mneme_core::errors::MnemeResult;
use mneme_core::memory::{MemoryEntry, ProvenanceInfo};
use mneme_core::models::{
    CausalRelation, DeletionReport, Direction, FeedbackDisagreement, FeedbackRating,
    LineageLink, MemRlQueryRecord, PatternStats, PatternTemplate, QValueDistribution,
    StorageStats, TierCounts, VectorMapping,
};
use mneme_core::traits::{
    ICausalStorage, IMemRlStorage, IMemoryStorage, IMetadataStorage, IPatternStorage,
    IVectorMappingStorage, QUpdateRule,
};

use crate::labels::LabelAllocator;
use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{
    causal_ops, entry_ops, maintenance, memrl_ops, metadata_ops, pattern_ops, provenance_ops,
    vector_ops,
};

/// The main storage engine.
pub struct StorageEngine {
    pool: ConnectionPool,
    labels: LabelAllocator,
    schema_version: u32,
}

impl StorageEngine {
    /// Open a file-backed engine with default settings.
    pub fn open(path: &Path) -> MnemeResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> MnemeResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size, config.busy_timeout_ms)?;
        Self::initialize(pool, config)
    }

    /// Open an in-memory engine. All reads go through the writer.
    pub fn open_in_memory() -> MnemeResult<Self> {
        Self::open_in_memory_with_config(&StorageConfig::default())
    }

    pub fn open_in_memory_with_config(config: &StorageConfig) -> MnemeResult<Self> {
        let pool = ConnectionPool::open_in_memory(config.busy_timeout_ms)?;
        Self::initialize(pool, config)
    }

    /// Run migrations, then seed the label counter from the persisted maximum.
    fn initialize(pool: ConnectionPool, config: &StorageConfig) -> MnemeResult<Self> {
        let (schema_version, labels) = pool.writer.with_conn_sync(|conn| {
            let version = migrations::run_migrations(conn)?;
            let labels = LabelAllocator::seeded(conn, config.label_retry_limit)?;
            Ok((version, labels))
        })?;
        info!(
            schema_version,
            next_label = labels.peek(),
            file_backed = pool.is_file_backed(),
            "storage engine ready"
        );
        Ok(Self {
            pool,
            labels,
            schema_version,
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Label the allocator will try next.
    pub fn next_label(&self) -> u64 {
        self.labels.peek()
    }

    pub fn vacuum(&self) -> MnemeResult<()> {
        self.pool.writer.with_conn_sync(maintenance::full_vacuum)
    }

    pub fn stats(&self) -> MnemeResult<StorageStats> {
        self.with_reader(maintenance::stats)
    }

    /// File-backed: uses the read pool. In-memory: uses the writer.
    fn with_reader<F, T>(&self, f: F) -> MnemeResult<T>
    where
        F: FnOnce(&Connection) -> MnemeResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn_sync(f),
        }
    }

    fn with_writer<F, T>(&self, f: F) -> MnemeResult<T>
    where
        F: FnOnce(&Connection) -> MnemeResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }
}

impl IMemoryStorage for StorageEngine {
    fn create_entry(&self, entry: &MemoryEntry) -> MnemeResult<()> {
        self.with_writer(|conn| entry_ops::insert_entry(conn, entry))
    }

    fn get_entry(&self, id: &str) -> MnemeResult<Option<MemoryEntry>> {
        self.with_reader(|conn| entry_ops::get_entry(conn, id))
    }

    fn get_batch_entries(&self, ids: &[String]) -> MnemeResult<Vec<MemoryEntry>> {
        self.with_reader(|conn| entry_ops::get_batch_entries(conn, ids))
    }

    fn get_all_entries(&self) -> MnemeResult<Vec<MemoryEntry>> {
        self.with_reader(entry_ops::get_all_entries)
    }

    fn recent_entries(&self, limit: usize) -> MnemeResult<Vec<MemoryEntry>> {
        self.with_reader(|conn| entry_ops::recent_entries(conn, limit))
    }

    fn recent_session_entries(&self, limit: usize) -> MnemeResult<Vec<MemoryEntry>> {
        self.with_reader(|conn| entry_ops::recent_session_entries(conn, limit))
    }

    fn delete_entry(&self, id: &str) -> MnemeResult<DeletionReport> {
        self.with_writer(|conn| entry_ops::delete_entry(conn, id))
    }

    fn delete_except_tags(&self, keep_tags: &[String]) -> MnemeResult<DeletionReport> {
        self.with_writer(|conn| entry_ops::delete_except_tags(conn, keep_tags))
    }

    fn count_entries(&self) -> MnemeResult<usize> {
        self.with_reader(entry_ops::count_entries)
    }

    fn query_by_tags(&self, tags: &[String], match_all: bool) -> MnemeResult<Vec<MemoryEntry>> {
        self.with_reader(|conn| entry_ops::query_by_tags(conn, tags, match_all))
    }

    fn get_provenance(&self, id: &str) -> MnemeResult<Option<ProvenanceInfo>> {
        self.with_reader(|conn| provenance_ops::get_provenance(conn, id))
    }

    fn get_batch_provenance(&self, ids: &[String]) -> MnemeResult<HashMap<String, ProvenanceInfo>> {
        self.with_reader(|conn| provenance_ops::load_provenance_map(conn, ids))
    }

    fn update_l_score(&self, id: &str, l_score: f64) -> MnemeResult<bool> {
        self.with_writer(|conn| provenance_ops::update_l_score(conn, id, l_score))
    }

    fn get_lineage_entry_ids(&self, root_id: &str, max_depth: u32) -> MnemeResult<Vec<LineageLink>> {
        self.with_reader(|conn| provenance_ops::lineage_links(conn, root_id, max_depth))
    }
}

impl IVectorMappingStorage for StorageEngine {
    fn assign_vector_label(&self, entry_id: &str) -> MnemeResult<u64> {
        self.with_writer(|conn| self.labels.assign(conn, entry_id))
    }

    fn get_vector_mapping(&self, entry_id: &str) -> MnemeResult<Option<VectorMapping>> {
        self.with_reader(|conn| vector_ops::get_mapping(conn, entry_id))
    }

    fn get_entry_ids_for_labels(&self, labels: &[u64]) -> MnemeResult<HashMap<u64, String>> {
        self.with_reader(|conn| vector_ops::entry_ids_for_labels(conn, labels))
    }

    fn record_vector_access(&self, entry_ids: &[String], at: DateTime<Utc>) -> MnemeResult<usize> {
        self.with_writer(|conn| vector_ops::record_access(conn, entry_ids, at))
    }

    fn update_compression_tiers(&self, policy: &TieringConfig, now: DateTime<Utc>) -> MnemeResult<usize> {
        self.with_writer(|conn| vector_ops::update_tiers(conn, policy, now))
    }

    fn tier_counts(&self) -> MnemeResult<TierCounts> {
        self.with_reader(vector_ops::tier_counts)
    }

    fn all_vector_mappings(&self) -> MnemeResult<Vec<VectorMapping>> {
        self.with_reader(vector_ops::all_mappings)
    }
}

impl ICausalStorage for StorageEngine {
    fn insert_relation(&self, relation: &CausalRelation) -> MnemeResult<()> {
        self.with_writer(|conn| causal_ops::insert_relation(conn, relation))
    }

    fn get_relation(&self, id: &str) -> MnemeResult<Option<CausalRelation>> {
        self.with_reader(|conn| causal_ops::get_relation(conn, id))
    }

    fn get_batch_relations(&self, ids: &[String]) -> MnemeResult<Vec<CausalRelation>> {
        self.with_reader(|conn| causal_ops::load_relations(conn, ids))
    }

    fn get_relations_for_entry(&self, entry_id: &str, direction: Direction) -> MnemeResult<Vec<CausalRelation>> {
        self.with_reader(|conn| causal_ops::get_relations_for_entry(conn, entry_id, direction))
    }

    fn delete_relation(&self, id: &str) -> MnemeResult<bool> {
        self.with_writer(|conn| causal_ops::delete_relation(conn, id))
    }

    fn count_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<usize> {
        self.with_reader(|conn| causal_ops::count_expired(conn, now))
    }

    fn get_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<Vec<CausalRelation>> {
        self.with_reader(|conn| causal_ops::get_expired(conn, now))
    }

    fn delete_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<Vec<String>> {
        self.with_writer(|conn| causal_ops::delete_expired(conn, now))
    }

    fn relation_count(&self) -> MnemeResult<usize> {
        self.with_reader(causal_ops::relation_count)
    }
}

impl IPatternStorage for StorageEngine {
    fn insert_template(&self, template: &PatternTemplate) -> MnemeResult<()> {
        self.with_writer(|conn| pattern_ops::insert_template(conn, template))
    }

    fn update_template(&self, template: &PatternTemplate) -> MnemeResult<bool> {
        self.with_writer(|conn| pattern_ops::update_template(conn, template))
    }

    fn get_template(&self, id: &str) -> MnemeResult<Option<PatternTemplate>> {
        self.with_reader(|conn| pattern_ops::get_template(conn, id))
    }

    fn get_template_by_name(&self, name: &str) -> MnemeResult<Option<PatternTemplate>> {
        self.with_reader(|conn| pattern_ops::get_template_by_name(conn, name))
    }

    fn list_templates(&self) -> MnemeResult<Vec<PatternTemplate>> {
        self.with_reader(pattern_ops::list_templates)
    }

    fn delete_template(&self, id: &str) -> MnemeResult<bool> {
        self.with_writer(|conn| pattern_ops::delete_template(conn, id))
    }

    fn record_use(&self, id: &str, success: bool, at: DateTime<Utc>) -> MnemeResult<Option<PatternStats>> {
        self.with_writer(|conn| pattern_ops::record_use(conn, id, success, at))
    }

    fn get_stats(&self, id: &str) -> MnemeResult<Option<PatternStats>> {
        self.with_reader(|conn| pattern_ops::get_stats(conn, id))
    }

    fn get_all_stats(&self) -> MnemeResult<Vec<PatternStats>> {
        self.with_reader(pattern_ops::get_all_stats)
    }

    fn get_prune_candidates(&self, min_uses: u64, max_success_rate: f64) -> MnemeResult<Vec<PatternStats>> {
        self.with_reader(|conn| pattern_ops::get_prune_candidates(conn, min_uses, max_success_rate))
    }
}

impl IMemRlStorage for StorageEngine {
    fn get_q_value(&self, entry_id: &str) -> MnemeResult<Option<f64>> {
        self.with_reader(|conn| memrl_ops::get_q_value(conn, entry_id))
    }

    fn get_q_values(&self, entry_ids: &[String]) -> MnemeResult<HashMap<String, f64>> {
        self.with_reader(|conn| memrl_ops::get_q_values(conn, entry_ids))
    }

    fn update_q_values(&self, rewards: &[(String, f64)], rule: QUpdateRule<'_>) -> MnemeResult<HashMap<String, f64>> {
        self.with_writer(|conn| memrl_ops::update_q_values(conn, rewards, rule))
    }

    fn insert_query_record(&self, record: &MemRlQueryRecord) -> MnemeResult<()> {
        self.with_writer(|conn| memrl_ops::insert_query_record(conn, record))
    }

    fn get_query_record(&self, id: &str) -> MnemeResult<Option<MemRlQueryRecord>> {
        self.with_reader(|conn| memrl_ops::get_query_record(conn, id))
    }

    fn query_count(&self) -> MnemeResult<usize> {
        self.with_reader(memrl_ops::query_count)
    }

    fn count_queries_without_feedback(&self) -> MnemeResult<usize> {
        self.with_reader(memrl_ops::count_without_feedback)
    }

    fn upsert_feedback(&self, rating: &FeedbackRating) -> MnemeResult<()> {
        self.with_writer(|conn| memrl_ops::upsert_feedback(conn, rating))
    }

    fn get_feedback(&self, query_id: &str) -> MnemeResult<Vec<FeedbackRating>> {
        self.with_reader(|conn| memrl_ops::get_feedback(conn, query_id))
    }

    fn insert_disagreement(&self, disagreement: &FeedbackDisagreement) -> MnemeResult<()> {
        self.with_writer(|conn| memrl_ops::insert_disagreement(conn, disagreement))
    }

    fn list_disagreements(&self) -> MnemeResult<Vec<FeedbackDisagreement>> {
        self.with_reader(memrl_ops::list_disagreements)
    }

    fn q_value_distribution(&self, low_below: f64, high_from: f64) -> MnemeResult<QValueDistribution> {
        self.with_reader(|conn| memrl_ops::q_value_distribution(conn, low_below, high_from))
    }
}

impl IMetadataStorage for StorageEngine {
    fn get_metadata(&self, key: &str) -> MnemeResult<Option<String>> {
        self.with_reader(|conn| metadata_ops::get(conn, key))
    }

    fn set_metadata(&self, key: &str, value: &str) -> MnemeResult<()> {
        self.with_writer(|conn| metadata_ops::set(conn, key, value))
    }
}
