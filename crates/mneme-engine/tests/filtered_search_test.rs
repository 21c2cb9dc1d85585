//! Tag-scoped retrieval and detection on a store where many untagged entries
//! sit closer to the query than the tagged one.

use std::sync::Arc;

use mneme_core::config::MnemeConfig;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::MemoryMetadata;
use mneme_core::models::{CausalRelationType, Direction, QueryOptions};
use mneme_core::traits::IEmbeddingProvider;
use mneme_engine::{FlatIndex, MemoryEngine};
use mneme_storage::StorageEngine;

/// Bug reports embed at cosine 0.8 from everything else.
struct BugOffsetEmbedder;

impl IEmbeddingProvider for BugOffsetEmbedder {
    fn embed(&self, text: &str) -> MnemeResult<Vec<f32>> {
        if text.starts_with("bug") {
            Ok(vec![0.8, 0.6, 0.0, 0.0])
        } else {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "bug-offset"
    }
}

fn crowded_engine() -> (MemoryEngine, String) {
    let engine = MemoryEngine::with_providers(
        StorageEngine::open_in_memory().unwrap(),
        Arc::new(BugOffsetEmbedder),
        Arc::new(FlatIndex::new(4)),
        MnemeConfig::default(),
    )
    .unwrap();
    for i in 0..60 {
        engine
            .store(
                format!("note {i}"),
                MemoryMetadata::default().with_tags(["note"]),
            )
            .unwrap();
    }
    let bug = engine
        .store(
            "bug: cache returns stale rows",
            MemoryMetadata::default().with_tags(["bug"]),
        )
        .unwrap();
    (engine, bug.id)
}

#[test]
fn detection_finds_tagged_target_behind_closer_entries() {
    let (engine, bug_id) = crowded_engine();
    let fix = engine
        .store(
            "fix: invalidate cache on write",
            MemoryMetadata::default().with_tags(["fix"]),
        )
        .unwrap();

    let relations = engine
        .get_relations_for_entry(&fix.id, Direction::Both)
        .unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].relation_type, CausalRelationType::Causes);
    assert!(relations[0].source_ids.contains(&bug_id));
}

#[test]
fn tag_filtered_query_reaches_past_closer_entries() {
    let (engine, bug_id) = crowded_engine();
    let results = engine
        .query(
            "stale cache",
            &QueryOptions::default().top_k(5).with_tags(["bug"], false),
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, bug_id);
    assert!((results[0].similarity - 0.8).abs() < 1e-6);

    // A similarity floor above the tagged entry stops the search.
    assert!(engine
        .query(
            "stale cache",
            &QueryOptions::default()
                .top_k(5)
                .min_score(0.9)
                .with_tags(["bug"], false),
        )
        .unwrap()
        .is_empty());
}

#[test]
fn unindexable_entry_is_not_left_behind() {
    // Index dimensions disagree with the embedder, so every insert fails.
    let engine = MemoryEngine::with_providers(
        StorageEngine::open_in_memory().unwrap(),
        Arc::new(BugOffsetEmbedder),
        Arc::new(FlatIndex::new(8)),
        MnemeConfig::default(),
    )
    .unwrap();

    let err = engine
        .store("orphan candidate", MemoryMetadata::default())
        .unwrap_err();
    assert!(matches!(err, MnemeError::IndexError(_)));
    assert!(engine.get_all_entries().unwrap().is_empty());
    assert_eq!(engine.stats().unwrap().vector_mappings, 0);
}
