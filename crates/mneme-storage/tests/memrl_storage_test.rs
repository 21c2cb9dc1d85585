//! Q-values, query snapshots, feedback persistence.

use mneme_core::memory::*;
use mneme_core::models::{FeedbackDisagreement, FeedbackRating, MemRlQueryRecord, RankedCandidate};
use mneme_core::traits::{IMemRlStorage, IMemoryStorage};
use mneme_core::{time, MnemeError};
use mneme_storage::StorageEngine;

fn store(engine: &StorageEngine) -> String {
    let e = MemoryEntry::new("x", MemoryMetadata::default(), ProvenanceInfo::default());
    engine.create_entry(&e).unwrap();
    e.id
}

fn record(id: &str, entry_id: &str) -> MemRlQueryRecord {
    MemRlQueryRecord {
        id: id.to_string(),
        query_text: "auth failures".to_string(),
        candidates: vec![RankedCandidate {
            entry_id: entry_id.to_string(),
            similarity: 0.9,
            q_value: 0.5,
            score: 0.7,
        }],
        delta: 0.3,
        lambda: 0.5,
        has_feedback: false,
        created_at: time::now(),
    }
}

#[test]
fn new_entries_start_at_half() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = store(&engine);
    assert_eq!(engine.get_q_value(&id).unwrap(), Some(0.5));
    assert_eq!(engine.get_q_value("ghost").unwrap(), None);
}

#[test]
fn batch_update_applies_rule_in_one_pass() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let a = store(&engine);
    let b = store(&engine);
    let rewards = vec![(a.clone(), 1.0), (b.clone(), 0.0), ("ghost".to_string(), 1.0)];
    let updated = engine
        .update_q_values(&rewards, &|q: f64, r: f64| q + 0.1 * (r - q))
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!((updated[&a] - 0.55).abs() < 1e-12);
    assert!((updated[&b] - 0.45).abs() < 1e-12);

    let all = engine.get_q_values(&[a.clone(), b.clone()]).unwrap();
    assert!((all[&a] - 0.55).abs() < 1e-12);
}

#[test]
fn query_record_round_trips_and_feedback_flags_it() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let entry = store(&engine);
    let rec = record("q1", &entry);
    engine.insert_query_record(&rec).unwrap();
    assert_eq!(engine.get_query_record("q1").unwrap().unwrap(), rec);
    assert_eq!(engine.count_queries_without_feedback().unwrap(), 1);

    let rating = |score, auto| FeedbackRating {
        query_id: "q1".into(),
        score,
        auto,
        created_at: time::now(),
    };
    engine.upsert_feedback(&rating(4, true)).unwrap();
    engine.upsert_feedback(&rating(6, true)).unwrap();
    engine.upsert_feedback(&rating(9, false)).unwrap();

    let feedback = engine.get_feedback("q1").unwrap();
    assert_eq!(feedback.len(), 2);
    assert!(!feedback[0].auto);
    assert_eq!(feedback[0].score, 9);
    assert_eq!(feedback[1].score, 6);
    assert!(engine.get_query_record("q1").unwrap().unwrap().has_feedback);
    assert_eq!(engine.count_queries_without_feedback().unwrap(), 0);
    assert_eq!(engine.query_count().unwrap(), 1);
}

#[test]
fn feedback_for_unknown_query_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let err = engine
        .upsert_feedback(&FeedbackRating {
            query_id: "ghost".into(),
            score: 5,
            auto: false,
            created_at: time::now(),
        })
        .unwrap_err();
    assert!(matches!(err, MnemeError::QueryNotFound { .. }));
}

#[test]
fn disagreements_are_append_only() {
    let engine = StorageEngine::open_in_memory().unwrap();
    for human in [8, 9] {
        engine
            .insert_disagreement(&FeedbackDisagreement {
                query_id: "q".into(),
                auto_score: 3,
                human_score: human,
                context: Some("retrieval".into()),
                created_at: time::now(),
            })
            .unwrap();
    }
    let all = engine.list_disagreements().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].human_score, 9);
}

#[test]
fn distribution_buckets_q_values() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids: Vec<String> = (0..3).map(|_| store(&engine)).collect();
    engine
        .update_q_values(
            &[(ids[0].clone(), 0.1), (ids[2].clone(), 0.9)],
            &|_: f64, r: f64| r,
        )
        .unwrap();
    let dist = engine.q_value_distribution(0.4, 0.7).unwrap();
    assert_eq!((dist.low, dist.medium, dist.high), (1, 1, 1));
}
