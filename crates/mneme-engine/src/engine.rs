//! MemoryEngine: the single entry point that wires storage, provenance,
//! causal detection, patterns, MemRL, and the vector index together.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use mneme_causal::{CausalGraph, DetectionEngine, DetectionReport};
use mneme_core::config::MnemeConfig;
use mneme_core::constants::{META_ENGINE_VERSION, META_LAST_TIER_UPDATE, VERSION};
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::{MemoryEntry, MemoryMetadata, ProvenanceInput};
use mneme_core::models::{
    CausalRelation, CausalRelationType, CleanupReport, DeletionReport, Direction, LineageTree,
    MemRlQueryRecord, PatternMatch, PatternStats, PatternTemplate, QueryOptions, QueryResult,
    RelationOptions, SlotDefinition, StorageStats,
};
use mneme_core::time;
use mneme_core::traits::{
    IEmbeddingProvider, IMemoryStorage, IMetadataStorage, IVectorIndex, IVectorMappingStorage,
};
use mneme_memrl::{Candidate, FeedbackOutcome, MemRlStats, RetrievalRanker};
use mneme_patterns::PatternMatcher;
use mneme_provenance::ProvenanceEngine;
use mneme_storage::StorageEngine;

use crate::embedder::HashedTermEmbedder;
use crate::health::{HealthReport, HealthSnapshot};
use crate::index::FlatIndex;
use crate::similarity::VectorSimilarity;

/// Entries embedded per batch during a reindex.
const REINDEX_BATCH: usize = 256;

/// A query hit after MemRL re-ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub entry: MemoryEntry,
    pub similarity: f64,
    pub q_value: f64,
    pub score: f64,
}

/// Re-ranked results plus the id under which the ranking was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedQuery {
    /// Handle for `record_feedback` / `apply_feedback`.
    pub query_id: String,
    pub results: Vec<RankedResult>,
}

pub struct MemoryEngine {
    storage: Arc<StorageEngine>,
    embedder: Arc<dyn IEmbeddingProvider>,
    index: Arc<dyn IVectorIndex>,
    similarity: Arc<VectorSimilarity>,
    provenance: ProvenanceEngine,
    graph: Arc<CausalGraph>,
    detector: DetectionEngine,
    patterns: PatternMatcher,
    ranker: RetrievalRanker,
    config: MnemeConfig,
}

impl MemoryEngine {
    /// Open a file-backed engine with the built-in embedder and flat index.
    /// The index is rebuilt from stored entries.
    pub fn open(path: &Path, config: MnemeConfig) -> MnemeResult<Self> {
        let storage = StorageEngine::open_with_config(path, &config.storage)?;
        Self::with_default_providers(storage, config)
    }

    pub fn open_in_memory(config: MnemeConfig) -> MnemeResult<Self> {
        let storage = StorageEngine::open_in_memory_with_config(&config.storage)?;
        Self::with_default_providers(storage, config)
    }

    fn with_default_providers(storage: StorageEngine, config: MnemeConfig) -> MnemeResult<Self> {
        let dims = config.embedding.dimensions;
        Self::with_providers(
            storage,
            Arc::new(HashedTermEmbedder::new(dims)),
            Arc::new(FlatIndex::new(dims)),
            config,
        )
    }

    /// Assemble an engine over caller-supplied embedding and index providers.
    /// An empty index over a non-empty store is rebuilt before returning.
    pub fn with_providers(
        storage: StorageEngine,
        embedder: Arc<dyn IEmbeddingProvider>,
        index: Arc<dyn IVectorIndex>,
        config: MnemeConfig,
    ) -> MnemeResult<Self> {
        let storage = Arc::new(storage);
        let similarity = Arc::new(VectorSimilarity::new(
            embedder.clone(),
            index.clone(),
            storage.clone(),
            storage.clone(),
            config.retrieval.oversample_factor,
        ));
        let graph = Arc::new(CausalGraph::new(storage.clone(), storage.clone()));
        let detector = DetectionEngine::new(
            graph.clone(),
            similarity.clone(),
            storage.clone(),
            config.causal.clone(),
        );

        let engine = Self {
            provenance: ProvenanceEngine::new(storage.clone(), config.provenance.clone()),
            patterns: PatternMatcher::new(storage.clone(), config.patterns.clone()),
            ranker: RetrievalRanker::new(storage.clone(), config.memrl.clone()),
            storage,
            embedder,
            index,
            similarity,
            graph,
            detector,
            config,
        };

        engine.storage.set_metadata(META_ENGINE_VERSION, VERSION)?;
        if engine.index.is_empty() && engine.storage.count_entries()? > 0 {
            engine.reindex()?;
        }
        info!(
            embedder = engine.embedder.name(),
            dimensions = engine.embedder.dimensions(),
            indexed = engine.index.len(),
            "memory engine ready"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &MnemeConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    pub fn provenance(&self) -> &ProvenanceEngine {
        &self.provenance
    }

    pub fn graph(&self) -> &CausalGraph {
        &self.graph
    }

    pub fn detector(&self) -> &DetectionEngine {
        &self.detector
    }

    pub fn patterns(&self) -> &PatternMatcher {
        &self.patterns
    }

    pub fn ranker(&self) -> &RetrievalRanker {
        &self.ranker
    }

    // --- Entries ---

    /// Store a root entry.
    pub fn store(
        &self,
        content: impl Into<String>,
        metadata: MemoryMetadata,
    ) -> MnemeResult<MemoryEntry> {
        self.store_derived(content, metadata, ProvenanceInput::default())
    }

    /// Store an entry derived from `provenance.parent_ids`.
    ///
    /// The L-Score is computed first and, when enforcement is on, a score
    /// under the threshold rejects the store. Embedding happens before any
    /// write, and an entry that cannot be labelled or indexed is removed
    /// again. Causal detection runs last and never fails the call.
    pub fn store_derived(
        &self,
        content: impl Into<String>,
        metadata: MemoryMetadata,
        provenance: ProvenanceInput,
    ) -> MnemeResult<MemoryEntry> {
        let (entry, _) = self.store_with_report(content, metadata, provenance)?;
        Ok(entry)
    }

    /// Like [`store_derived`](Self::store_derived), also returning what
    /// causal detection created.
    pub fn store_with_report(
        &self,
        content: impl Into<String>,
        metadata: MemoryMetadata,
        provenance: ProvenanceInput,
    ) -> MnemeResult<(MemoryEntry, DetectionReport)> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MnemeError::ValidationError("content is empty".to_string()));
        }
        let _span = info_span!("mneme.store", parents = provenance.parent_ids.len()).entered();

        let info = self.provenance.score_new_entry(&provenance)?;
        if let Some(score) = info.l_score {
            self.provenance.check_threshold(score)?;
        }

        let vector = self.similarity.embed(&content)?;
        let entry = MemoryEntry::new(content, metadata, info);
        self.storage.create_entry(&entry)?;
        let label = match self.index_entry(&entry.id, &vector) {
            Ok(label) => label,
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "indexing failed, removing stored entry");
                if let Err(cleanup) = self.storage.delete_entry(&entry.id) {
                    warn!(entry_id = %entry.id, error = %cleanup, "rollback of unindexed entry failed");
                }
                return Err(e);
            }
        };
        debug!(entry_id = %entry.id, label, "memory stored");

        let report = self.detector.detect(&entry);
        Ok((entry, report))
    }

    fn index_entry(&self, entry_id: &str, vector: &[f32]) -> MnemeResult<u64> {
        let label = self.storage.assign_vector_label(entry_id)?;
        self.index.insert(label, vector)?;
        Ok(label)
    }

    pub fn get_entry(&self, id: &str) -> MnemeResult<Option<MemoryEntry>> {
        self.storage.get_entry(id)
    }

    pub fn get_batch_entries(&self, ids: &[String]) -> MnemeResult<Vec<MemoryEntry>> {
        self.storage.get_batch_entries(ids)
    }

    pub fn get_all_entries(&self) -> MnemeResult<Vec<MemoryEntry>> {
        self.storage.get_all_entries()
    }

    pub fn query_by_tags(&self, tags: &[String], match_all: bool) -> MnemeResult<Vec<MemoryEntry>> {
        self.storage.query_by_tags(tags, match_all)
    }

    /// Delete one entry and drop its vector.
    pub fn delete_entry(&self, id: &str) -> MnemeResult<DeletionReport> {
        let report = self.storage.delete_entry(id)?;
        self.unindex(&report)?;
        Ok(report)
    }

    /// Delete every entry carrying none of `keep_tags` and drop their vectors.
    pub fn delete_except_tags(&self, keep_tags: &[String]) -> MnemeResult<DeletionReport> {
        let report = self.storage.delete_except_tags(keep_tags)?;
        self.unindex(&report)?;
        if !report.is_empty() {
            info!(
                deleted = report.entry_ids.len(),
                orphaned_relations = report.orphaned_relations,
                "entries reset"
            );
        }
        Ok(report)
    }

    fn unindex(&self, report: &DeletionReport) -> MnemeResult<()> {
        for label in &report.labels {
            self.index.remove(*label)?;
        }
        Ok(())
    }

    // --- Retrieval ---

    /// Query options seeded from the retrieval config.
    pub fn default_query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .top_k(self.config.retrieval.default_top_k)
            .min_score(self.config.retrieval.default_min_score)
    }

    /// Nearest entries to `text`, best first. Filters, `min_score`, and the
    /// L-Score threshold (when enforced) apply before `top_k`. Returned
    /// entries have their access counters bumped.
    pub fn query(&self, text: &str, options: &QueryOptions) -> MnemeResult<Vec<QueryResult>> {
        if options.top_k == 0 {
            return Ok(Vec::new());
        }
        let _span = info_span!("mneme.query", top_k = options.top_k).entered();

        let results: Vec<QueryResult> = self
            .similarity
            .search_where(text, options.top_k, options.min_score, |entry| {
                options.filters.accepts(entry) && self.provenance.passes_threshold(entry)
            })?
            .into_iter()
            .map(|(entry, similarity)| QueryResult { entry, similarity })
            .collect();

        if !results.is_empty() {
            let ids: Vec<String> = results.iter().map(|r| r.entry.id.clone()).collect();
            self.storage.record_vector_access(&ids, time::now())?;
        }
        debug!(returned = results.len(), "query complete");
        Ok(results)
    }

    /// Run [`query`](Self::query), then re-rank the hits with MemRL and record
    /// the decision for later feedback.
    pub fn query_ranked(&self, text: &str, options: &QueryOptions) -> MnemeResult<RankedQuery> {
        let results = self.query(text, options)?;
        let candidates: Vec<Candidate> = results
            .iter()
            .map(|r| Candidate::new(r.entry.id.clone(), r.similarity))
            .collect();
        let record = self.ranker.rank(text, &candidates, None)?;

        let mut by_id: HashMap<String, MemoryEntry> = results
            .into_iter()
            .map(|r| (r.entry.id.clone(), r.entry))
            .collect();
        let results = record
            .candidates
            .iter()
            .filter_map(|c| {
                by_id.remove(&c.entry_id).map(|entry| RankedResult {
                    entry,
                    similarity: c.similarity,
                    q_value: c.q_value,
                    score: c.score,
                })
            })
            .collect();
        Ok(RankedQuery {
            query_id: record.id,
            results,
        })
    }

    // --- Causal ---

    pub fn add_causal_relation<S, T>(
        &self,
        sources: S,
        targets: T,
        relation_type: CausalRelationType,
        strength: f64,
        options: RelationOptions,
    ) -> MnemeResult<CausalRelation>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.graph
            .add_relation(sources, targets, relation_type, strength, options)
    }

    pub fn get_causal_relation(&self, id: &str) -> MnemeResult<Option<CausalRelation>> {
        self.graph.get_relation(id)
    }

    pub fn get_relations_for_entry(
        &self,
        entry_id: &str,
        direction: Direction,
    ) -> MnemeResult<Vec<CausalRelation>> {
        self.graph.get_relations_for_entry(entry_id, direction)
    }

    pub fn get_expired_relation_count(&self) -> MnemeResult<usize> {
        self.graph.get_expired_relation_count(time::now())
    }

    pub fn cleanup_expired_relations(&self) -> MnemeResult<CleanupReport> {
        self.graph.cleanup_expired_relations(time::now())
    }

    // --- MemRL ---

    pub fn get_q_value(&self, entry_id: &str) -> MnemeResult<Option<f64>> {
        self.ranker.get_q_value(entry_id)
    }

    pub fn get_q_values(&self, entry_ids: &[String]) -> MnemeResult<HashMap<String, f64>> {
        self.ranker.get_q_values(entry_ids)
    }

    pub fn update_q_value(&self, entry_id: &str, reward: f64) -> MnemeResult<Option<f64>> {
        self.ranker.update_q_value(entry_id, reward)
    }

    pub fn update_q_values(&self, rewards: &[(String, f64)]) -> MnemeResult<HashMap<String, f64>> {
        self.ranker.update_q_values(rewards)
    }

    pub fn get_query_record(&self, query_id: &str) -> MnemeResult<Option<MemRlQueryRecord>> {
        self.ranker.get_query_record(query_id)
    }

    pub fn record_feedback(
        &self,
        query_id: &str,
        score: u8,
        auto: bool,
        context: Option<String>,
    ) -> MnemeResult<FeedbackOutcome> {
        self.ranker.record_feedback(query_id, score, auto, context)
    }

    pub fn apply_feedback(&self, query_id: &str) -> MnemeResult<HashMap<String, f64>> {
        self.ranker.apply_feedback(query_id)
    }

    pub fn memrl_stats(&self) -> MnemeResult<MemRlStats> {
        self.ranker.stats()
    }

    // --- Patterns ---

    pub fn register_template(
        &self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        slots: Vec<SlotDefinition>,
        priority: i64,
    ) -> MnemeResult<PatternTemplate> {
        self.patterns.register_template(name, pattern, slots, priority)
    }

    pub fn list_templates(&self) -> MnemeResult<Vec<PatternTemplate>> {
        self.patterns.list_templates()
    }

    pub fn delete_template(&self, id: &str) -> MnemeResult<bool> {
        self.patterns.delete_template(id)
    }

    pub fn match_text(&self, text: &str) -> MnemeResult<Vec<PatternMatch>> {
        self.patterns.match_text(text)
    }

    pub fn match_text_on(&self, text: &str, today: NaiveDate) -> MnemeResult<Vec<PatternMatch>> {
        self.patterns.match_text_on(text, today)
    }

    pub fn record_pattern_use(&self, id: &str, success: bool) -> MnemeResult<Option<PatternStats>> {
        self.patterns.record_use(id, success)
    }

    pub fn prune_patterns(&self) -> MnemeResult<Vec<String>> {
        self.patterns.prune_patterns()
    }

    // --- Provenance ---

    pub fn trace_lineage(
        &self,
        root_id: &str,
        max_depth: Option<u32>,
    ) -> MnemeResult<Option<LineageTree>> {
        self.provenance.trace_lineage(root_id, max_depth)
    }

    pub fn update_l_score(&self, id: &str, score: f64) -> MnemeResult<bool> {
        self.provenance.update_l_score(id, score)
    }

    pub fn refresh_l_score(&self, id: &str) -> MnemeResult<Option<f64>> {
        self.provenance.refresh_l_score(id)
    }

    // --- Maintenance ---

    /// Reassign compression tiers from access statistics and record when.
    pub fn update_compression_tiers(&self) -> MnemeResult<usize> {
        let now = time::now();
        let changed = self
            .storage
            .update_compression_tiers(&self.config.tiering, now)?;
        self.storage
            .set_metadata(META_LAST_TIER_UPDATE, &time::to_millis(&now).to_string())?;
        info!(changed, "compression tiers updated");
        Ok(changed)
    }

    pub fn last_tier_update(&self) -> MnemeResult<Option<DateTime<Utc>>> {
        Ok(self
            .storage
            .get_metadata(META_LAST_TIER_UPDATE)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(time::from_millis))
    }

    /// Rebuild the vector index from stored entries. Entries keep their
    /// existing labels; an entry without one is assigned a label now.
    /// Concurrent queries see a partially filled index until this returns.
    pub fn reindex(&self) -> MnemeResult<usize> {
        let _span = info_span!("mneme.reindex").entered();
        self.index.clear()?;

        let labels: HashMap<String, u64> = self
            .storage
            .all_vector_mappings()?
            .into_iter()
            .map(|m| (m.entry_id, m.label))
            .collect();
        let entries = self.storage.get_all_entries()?;

        let mut indexed = 0;
        for chunk in entries.chunks(REINDEX_BATCH) {
            let texts: Vec<String> = chunk.iter().map(|e| e.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != chunk.len() {
                return Err(MnemeError::EmbeddingError(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    chunk.len()
                )));
            }
            for (entry, vector) in chunk.iter().zip(vectors) {
                let label = match labels.get(&entry.id) {
                    Some(label) => *label,
                    None => self.storage.assign_vector_label(&entry.id)?,
                };
                self.index.insert(label, &vector)?;
                indexed += 1;
            }
        }
        info!(indexed, "vector index rebuilt");
        Ok(indexed)
    }

    pub fn stats(&self) -> MnemeResult<StorageStats> {
        self.storage.stats()
    }

    /// Snapshot every subsystem and grade it.
    pub fn health(&self) -> MnemeResult<HealthReport> {
        let stats = self.storage.stats()?;
        let snapshot = HealthSnapshot {
            schema_version: self.storage.schema_version(),
            entries: stats.entries,
            relations: stats.relations,
            expired_relations: self.get_expired_relation_count()?,
            templates: stats.templates,
            prune_candidates: self.patterns.get_prune_candidates()?.len(),
            vector_mappings: stats.vector_mappings,
            indexed_vectors: self.index.len(),
            tiers: self.storage.tier_counts()?,
            q_values: self.ranker.distribution()?,
            memrl_queries: stats.memrl_queries,
            disagreements: stats.disagreements,
        };
        Ok(HealthReport::build(snapshot))
    }
}
