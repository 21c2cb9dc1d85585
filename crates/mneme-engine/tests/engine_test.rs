//! Façade behavior with the built-in embedder and flat index.

use mneme_core::config::MnemeConfig;
use mneme_core::errors::MnemeError;
use mneme_core::memory::{MemoryMetadata, MemorySource, ProvenanceInput};
use mneme_core::models::QueryOptions;
use mneme_core::traits::IVectorMappingStorage;
use mneme_engine::{HealthStatus, MemoryEngine};

fn engine() -> MemoryEngine {
    MemoryEngine::open_in_memory(MnemeConfig::default()).unwrap()
}

#[test]
fn store_then_get_round_trips() {
    let engine = engine();
    let metadata = MemoryMetadata::default()
        .with_tags(["rust", "notes"])
        .with_source(MemorySource::User)
        .with_importance(0.8);
    let stored = engine
        .store("the borrow checker rejects aliasing mutable refs", metadata.clone())
        .unwrap();

    let loaded = engine.get_entry(&stored.id).unwrap().unwrap();
    assert_eq!(loaded.content, stored.content);
    assert_eq!(loaded.metadata, metadata);
    assert_eq!(loaded.provenance, stored.provenance);
    assert!(loaded.provenance.is_root());
    assert_eq!(loaded.provenance.l_score, Some(1.0));
    assert!(engine.storage().get_vector_mapping(&stored.id).unwrap().is_some());
}

#[test]
fn empty_content_is_rejected() {
    let err = engine().store("   ", MemoryMetadata::default()).unwrap_err();
    assert!(matches!(err, MnemeError::ValidationError(_)));
}

#[test]
fn query_ranks_shared_vocabulary_first() {
    let engine = engine();
    let rust = engine
        .store("rust borrow checker and lifetimes", MemoryMetadata::default())
        .unwrap();
    engine
        .store("sourdough bread needs a long proof", MemoryMetadata::default())
        .unwrap();

    let results = engine
        .query("borrow checker lifetimes", &QueryOptions::default().top_k(5))
        .unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].entry.id, rust.id);
    assert!(results[0].similarity > 0.5);
    assert!(results
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn query_applies_filters_and_limits() {
    let engine = engine();
    let keep = engine
        .store(
            "deploy pipeline failed on staging",
            MemoryMetadata::default().with_tags(["ops"]).with_importance(0.9),
        )
        .unwrap();
    engine
        .store(
            "deploy pipeline failed on production",
            MemoryMetadata::default().with_tags(["ops"]).with_importance(0.1),
        )
        .unwrap();
    engine
        .store(
            "deploy pipeline failed on preview",
            MemoryMetadata::default().with_tags(["web"]).with_importance(0.9),
        )
        .unwrap();

    let options = QueryOptions::default()
        .with_tags(["ops"], false)
        .min_importance(0.5);
    let results = engine.query("deploy pipeline failed", &options).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, keep.id);

    let one = engine
        .query("deploy pipeline failed", &QueryOptions::default().top_k(1))
        .unwrap();
    assert_eq!(one.len(), 1);
    assert!(engine
        .query("deploy pipeline failed", &QueryOptions::default().top_k(0))
        .unwrap()
        .is_empty());
    assert!(engine
        .query("deploy pipeline failed", &QueryOptions::default().min_score(1.1))
        .unwrap()
        .is_empty());
}

#[test]
fn query_records_access() {
    let engine = engine();
    let entry = engine
        .store("cache invalidation strategy", MemoryMetadata::default())
        .unwrap();
    engine
        .query("cache invalidation", &QueryOptions::default())
        .unwrap();
    engine
        .query("cache invalidation", &QueryOptions::default())
        .unwrap();

    let mapping = engine.storage().get_vector_mapping(&entry.id).unwrap().unwrap();
    assert_eq!(mapping.access_count, 2);
    assert!(mapping.last_accessed_at.is_some());
}

#[test]
fn delete_removes_entry_and_vector() {
    let engine = engine();
    let gone = engine.store("temporary scratch note", MemoryMetadata::default()).unwrap();
    let report = engine.delete_entry(&gone.id).unwrap();
    assert_eq!(report.entry_ids, vec![gone.id.clone()]);
    assert_eq!(report.labels.len(), 1);

    assert!(engine.get_entry(&gone.id).unwrap().is_none());
    assert!(engine
        .query("temporary scratch note", &QueryOptions::default())
        .unwrap()
        .is_empty());
    assert!(engine.delete_entry(&gone.id).unwrap().is_empty());
    assert!(engine.health().unwrap().is_healthy());
}

#[test]
fn delete_except_tags_keeps_tagged_entries() {
    let engine = engine();
    let pinned = engine
        .store("pinned guideline", MemoryMetadata::default().with_tags(["pinned"]))
        .unwrap();
    engine.store("loose note one", MemoryMetadata::default()).unwrap();
    engine
        .store("loose note two", MemoryMetadata::default().with_tags(["misc"]))
        .unwrap();

    let report = engine.delete_except_tags(&["pinned".to_string()]).unwrap();
    assert_eq!(report.entry_ids.len(), 2);

    let remaining = engine.get_all_entries().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, pinned.id);
    assert!(engine.health().unwrap().is_healthy());
}

#[test]
fn derived_entries_decay_and_trace() {
    let engine = engine();
    let root = engine.store("original observation", MemoryMetadata::default()).unwrap();
    let child = engine
        .store_derived(
            "summary of the observation",
            MemoryMetadata::default(),
            ProvenanceInput::derived_from([root.id.clone()]),
        )
        .unwrap();

    assert_eq!(child.provenance.lineage_depth, 1);
    let l = child.provenance.l_score.unwrap();
    assert!((l - 0.9).abs() < 1e-9);

    let tree = engine.trace_lineage(&child.id, None).unwrap().unwrap();
    assert!(tree.node(&root.id).is_some());
    assert!(!tree.has_cycle);
    assert!(engine.trace_lineage("missing", None).unwrap().is_none());

    assert!(engine.update_l_score(&child.id, 0.42).unwrap());
    let reloaded = engine.get_entry(&child.id).unwrap().unwrap();
    assert_eq!(reloaded.provenance.l_score, Some(0.42));
    assert_eq!(reloaded.provenance.lineage_depth, 1);
}

#[test]
fn enforced_threshold_rejects_and_filters() {
    let mut config = MnemeConfig::default();
    config.provenance.enforce_threshold = true;
    config.provenance.l_score_threshold = 0.5;
    let engine = MemoryEngine::open_in_memory(config).unwrap();

    let err = engine
        .store_derived(
            "weak hearsay",
            MemoryMetadata::default(),
            ProvenanceInput::default().with_confidence(0.2),
        )
        .unwrap_err();
    assert!(matches!(err, MnemeError::LScoreBelowThreshold { .. }));
    assert!(engine.get_all_entries().unwrap().is_empty());

    let entry = engine.store("solid finding", MemoryMetadata::default()).unwrap();
    assert_eq!(
        engine
            .query("solid finding", &QueryOptions::default())
            .unwrap()
            .len(),
        1
    );
    engine.update_l_score(&entry.id, 0.1).unwrap();
    assert!(engine
        .query("solid finding", &QueryOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn tiers_update_and_record_time() {
    let engine = engine();
    engine.store("tiering candidate", MemoryMetadata::default()).unwrap();
    assert!(engine.last_tier_update().unwrap().is_none());

    engine.update_compression_tiers().unwrap();
    assert!(engine.last_tier_update().unwrap().is_some());
    let tiers = engine.storage().tier_counts().unwrap();
    assert_eq!(tiers.hot + tiers.warm + tiers.cold, 1);
}

#[test]
fn reindex_restores_every_vector() {
    let engine = engine();
    for i in 0..5 {
        engine
            .store(format!("indexed note number {i}"), MemoryMetadata::default())
            .unwrap();
    }
    let labels_before = engine.storage().all_vector_mappings().unwrap();

    assert_eq!(engine.reindex().unwrap(), 5);
    assert_eq!(engine.storage().all_vector_mappings().unwrap(), labels_before);
    assert_eq!(engine.health().unwrap().metrics.indexed_vectors, 5);
}

#[test]
fn health_reports_expired_relations() {
    let engine = engine();
    let a = engine.store("first event", MemoryMetadata::default()).unwrap();
    let b = engine.store("second event", MemoryMetadata::default()).unwrap();
    engine
        .add_causal_relation(
            [a.id.clone()],
            [b.id.clone()],
            mneme_core::models::CausalRelationType::Precedes,
            0.5,
            mneme_core::models::RelationOptions::default()
                .with_ttl(std::time::Duration::from_millis(1)),
        )
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));

    let report = engine.health().unwrap();
    assert_eq!(report.overall_status, HealthStatus::Degraded);
    assert_eq!(report.metrics.expired_relations, 1);

    engine.cleanup_expired_relations().unwrap();
    assert!(engine.health().unwrap().is_healthy());
}
