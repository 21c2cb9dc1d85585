//! End-to-end scenarios with an embedder that makes every entry identical,
//! so similarity-driven behavior is deterministic.

use std::sync::Arc;
use std::time::Duration;

use mneme_core::config::MnemeConfig;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::{MemoryMetadata, MetadataValue};
use mneme_core::models::{
    CausalRelationType, Direction, QueryOptions, RelationOptions, SlotDefinition, SlotType,
};
use mneme_core::traits::IEmbeddingProvider;
use mneme_engine::{FlatIndex, MemoryEngine};
use mneme_storage::StorageEngine;

struct ConstantEmbedder;

impl IEmbeddingProvider for ConstantEmbedder {
    fn embed(&self, _text: &str) -> MnemeResult<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "constant"
    }
}

fn engine_with(config: MnemeConfig) -> MemoryEngine {
    MemoryEngine::with_providers(
        StorageEngine::open_in_memory().unwrap(),
        Arc::new(ConstantEmbedder),
        Arc::new(FlatIndex::new(4)),
        config,
    )
    .unwrap()
}

fn engine() -> MemoryEngine {
    engine_with(MnemeConfig::default())
}

fn tagged(tags: &[&str]) -> MemoryMetadata {
    MemoryMetadata::default().with_tags(tags.iter().copied())
}

#[test]
fn bug_then_fix_detects_one_causes_relation() {
    let engine = engine();
    let bug = engine
        .store("bug: crash on null input", tagged(&["bug"]))
        .unwrap();
    let fix = engine.store("fix: add null check", tagged(&["fix"])).unwrap();

    let relations = engine
        .get_relations_for_entry(&fix.id, Direction::Both)
        .unwrap();
    assert_eq!(relations.len(), 1);
    let rel = &relations[0];
    assert_eq!(rel.relation_type, CausalRelationType::Causes);
    assert!(rel.source_ids.contains(&bug.id));
    assert!(rel.target_ids.contains(&fix.id));
    assert!((0.70..=0.95).contains(&rel.strength));
    assert_eq!(
        rel.metadata.as_ref().unwrap()["detected_by"],
        MetadataValue::from("bug_fix")
    );
}

#[test]
fn store_with_report_exposes_detection() {
    let engine = engine();
    engine.store("bug: timeout", tagged(&["error"])).unwrap();
    let (_, report) = engine
        .store_with_report(
            "fix: raise timeout",
            tagged(&["bugfix"]),
            Default::default(),
        )
        .unwrap();
    assert_eq!(report.created_count(), 1);
    assert_eq!(report.failure_count(), 0);
}

#[test]
fn disabled_detection_creates_nothing() {
    let mut config = MnemeConfig::default();
    config.causal.detection_enabled = false;
    let engine = engine_with(config);
    engine.store("bug: crash", tagged(&["bug"])).unwrap();
    let fix = engine.store("fix: guard", tagged(&["fix"])).unwrap();
    assert!(engine
        .get_relations_for_entry(&fix.id, Direction::Both)
        .unwrap()
        .is_empty());
}

#[test]
fn seven_day_ttl_sets_expiry_and_nothing_expires() {
    let engine = engine();
    let a = engine.store("cause", MemoryMetadata::default()).unwrap();
    let b = engine.store("effect", MemoryMetadata::default()).unwrap();

    let rel = engine
        .add_causal_relation(
            [a.id.clone()],
            [b.id.clone()],
            CausalRelationType::Triggers,
            0.6,
            RelationOptions::default().with_ttl(Duration::from_secs(7 * 24 * 3600)),
        )
        .unwrap();

    assert_eq!(
        rel.expires_at,
        Some(rel.created_at + chrono::Duration::days(7))
    );
    assert_eq!(engine.get_expired_relation_count().unwrap(), 0);
    assert_eq!(engine.get_causal_relation(&rel.id).unwrap(), Some(rel));
}

#[test]
fn cleanup_removes_only_expired_relations() {
    let engine = engine();
    let a = engine.store("left", MemoryMetadata::default()).unwrap();
    let b = engine.store("right", MemoryMetadata::default()).unwrap();

    for _ in 0..3 {
        engine
            .add_causal_relation(
                [a.id.clone()],
                [b.id.clone()],
                CausalRelationType::Correlates,
                0.4,
                RelationOptions::default().with_ttl(Duration::from_millis(1)),
            )
            .unwrap();
    }
    let permanent = engine
        .add_causal_relation(
            [a.id.clone()],
            [b.id.clone()],
            CausalRelationType::Enables,
            0.9,
            RelationOptions::default(),
        )
        .unwrap();
    std::thread::sleep(Duration::from_millis(10));

    assert_eq!(engine.get_expired_relation_count().unwrap(), 3);
    let report = engine.cleanup_expired_relations().unwrap();
    assert_eq!(report.cleaned, 3);
    assert_eq!(engine.get_expired_relation_count().unwrap(), 0);
    assert!(engine.get_causal_relation(&permanent.id).unwrap().is_some());
    assert!(engine.graph().last_expiry_sweep().unwrap().is_some());
}

#[test]
fn multi_source_relation_round_trips() {
    let engine = engine();
    let a = engine.store("a", MemoryMetadata::default()).unwrap();
    let b = engine.store("b", MemoryMetadata::default()).unwrap();
    let c = engine.store("c", MemoryMetadata::default()).unwrap();

    let rel = engine
        .add_causal_relation(
            [b.id.clone(), a.id.clone()],
            [c.id.clone()],
            CausalRelationType::Causes,
            0.7,
            RelationOptions::default(),
        )
        .unwrap();
    assert_eq!(rel.source_ids.len(), 2);
    assert_eq!(
        engine
            .get_relations_for_entry(&a.id, Direction::Forward)
            .unwrap()
            .len(),
        1
    );
    assert!(engine
        .get_relations_for_entry(&a.id, Direction::Backward)
        .unwrap()
        .is_empty());

    let err = engine
        .add_causal_relation(
            Vec::<String>::new(),
            [c.id.clone()],
            CausalRelationType::Causes,
            0.7,
            RelationOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, MnemeError::CausalError(_)));
}

#[test]
fn hello_entity_template_matches() {
    let engine = engine();
    let template = engine
        .register_template(
            "greeting",
            "Hello {name}",
            vec![SlotDefinition::required("name", SlotType::Entity)],
            0,
        )
        .unwrap();

    let matches = engine.match_text("Hello Alice").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].template_id, template.id);
    assert_eq!(matches[0].bindings["name"], "Alice");
    assert!(matches[0].confidence > 0.0);

    assert!(engine.match_text("hello alice").unwrap().is_empty());

    let stats = engine.record_pattern_use(&template.id, true).unwrap().unwrap();
    assert_eq!(stats.use_count, 1);
    assert!(engine.prune_patterns().unwrap().is_empty());
}

#[test]
fn q_value_moves_by_alpha_and_stays_bounded() {
    let engine = engine();
    let entry = engine.store("useful memory", MemoryMetadata::default()).unwrap();
    assert_eq!(engine.get_q_value(&entry.id).unwrap(), Some(0.5));

    let q = engine.update_q_value(&entry.id, 1.0).unwrap().unwrap();
    assert!((q - 0.55).abs() < 1e-9);

    for _ in 0..200 {
        let q = engine.update_q_value(&entry.id, 1.0).unwrap().unwrap();
        assert!(q <= 1.0);
    }
    for _ in 0..200 {
        let q = engine.update_q_value(&entry.id, 0.0).unwrap().unwrap();
        assert!(q >= 0.1);
    }
    assert!(engine.update_q_value("missing", 1.0).unwrap().is_none());
}

#[test]
fn ranked_query_feedback_updates_candidates() {
    let engine = engine();
    let a = engine.store("alpha", MemoryMetadata::default()).unwrap();
    let b = engine.store("beta", MemoryMetadata::default()).unwrap();
    engine
        .update_q_values(&[(b.id.clone(), 1.0), (b.id.clone(), 1.0)])
        .unwrap();

    let ranked = engine
        .query_ranked("anything", &QueryOptions::default())
        .unwrap();
    assert_eq!(ranked.results.len(), 2);
    // Equal similarity, so the higher Q-value wins.
    assert_eq!(ranked.results[0].entry.id, b.id);
    assert!(ranked.results[0].score > ranked.results[1].score);

    let before = engine.get_q_value(&a.id).unwrap().unwrap();
    let outcome = engine
        .record_feedback(&ranked.query_id, 10, false, None)
        .unwrap();
    assert!(outcome.disagreement.is_none());

    let updated = engine.apply_feedback(&ranked.query_id).unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated[&a.id] > before);

    let record = engine.get_query_record(&ranked.query_id).unwrap().unwrap();
    assert!(record.has_feedback);
    assert_eq!(engine.memrl_stats().unwrap().queries, 1);
}

#[test]
fn feedback_disagreement_is_logged() {
    let engine = engine();
    engine.store("gamma", MemoryMetadata::default()).unwrap();
    let ranked = engine
        .query_ranked("gamma", &QueryOptions::default())
        .unwrap();

    engine
        .record_feedback(&ranked.query_id, 9, true, None)
        .unwrap();
    let outcome = engine
        .record_feedback(&ranked.query_id, 3, false, Some("judge too generous".into()))
        .unwrap();
    let d = outcome.disagreement.unwrap();
    assert_eq!((d.auto_score, d.human_score), (9, 3));

    assert!(matches!(
        engine.apply_feedback("no-such-query"),
        Err(MnemeError::QueryNotFound { .. })
    ));
}
