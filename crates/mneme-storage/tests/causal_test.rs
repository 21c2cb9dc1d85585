//! Causal hyperedge persistence and expiry.

use chrono::Duration;

use mneme_core::memory::*;
use mneme_core::models::{CausalRelation, CausalRelationType, Direction};
use mneme_core::time;
use mneme_core::traits::{ICausalStorage, IMemoryStorage};
use mneme_storage::StorageEngine;

fn seed(engine: &StorageEngine, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let e = MemoryEntry::new(format!("entry {i}"), MemoryMetadata::default(), ProvenanceInfo::default());
            engine.create_entry(&e).unwrap();
            e.id
        })
        .collect()
}

fn relation(sources: &[String], targets: &[String], ttl_ms: Option<i64>) -> CausalRelation {
    let created_at = time::now();
    CausalRelation {
        id: uuid::Uuid::new_v4().to_string(),
        relation_type: CausalRelationType::Enables,
        source_ids: sources.iter().cloned().collect(),
        target_ids: targets.iter().cloned().collect(),
        strength: 0.75,
        metadata: None,
        created_at,
        ttl_ms,
        expires_at: ttl_ms.map(|ms| created_at + Duration::milliseconds(ms)),
    }
}

#[test]
fn relation_round_trip_ignores_endpoint_order() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 4);
    let forward = relation(&[ids[0].clone(), ids[1].clone()], &[ids[2].clone(), ids[3].clone()], None);
    let mut reversed = relation(&[ids[1].clone(), ids[0].clone()], &[ids[3].clone(), ids[2].clone()], None);
    reversed.id = "reversed".into();
    engine.insert_relation(&forward).unwrap();
    engine.insert_relation(&reversed).unwrap();

    let a = engine.get_relation(&forward.id).unwrap().unwrap();
    let b = engine.get_relation("reversed").unwrap().unwrap();
    assert_eq!(a, forward);
    assert_eq!(a.source_ids, b.source_ids);
    assert_eq!(a.target_ids, b.target_ids);
}

#[test]
fn relations_for_entry_respect_direction_and_dedupe() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 3);
    let out = relation(&[ids[0].clone()], &[ids[1].clone()], None);
    let inbound = relation(&[ids[2].clone()], &[ids[0].clone()], None);
    let self_loop = relation(&[ids[0].clone()], &[ids[0].clone()], None);
    for r in [&out, &inbound, &self_loop] {
        engine.insert_relation(r).unwrap();
    }

    let fwd = engine.get_relations_for_entry(&ids[0], Direction::Forward).unwrap();
    let back = engine.get_relations_for_entry(&ids[0], Direction::Backward).unwrap();
    let both = engine.get_relations_for_entry(&ids[0], Direction::Both).unwrap();
    assert_eq!(fwd.len(), 2);
    assert_eq!(back.len(), 2);
    assert_eq!(both.len(), 3);
}

#[test]
fn batch_relations_omit_missing() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 2);
    let r = relation(&[ids[0].clone()], &[ids[1].clone()], None);
    engine.insert_relation(&r).unwrap();
    let found = engine
        .get_batch_relations(&["missing".into(), r.id.clone()])
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(engine.relation_count().unwrap(), 1);
}

#[test]
fn seven_day_ttl_is_not_expired() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 2);
    let week = 7 * 24 * 60 * 60 * 1000;
    let r = relation(&[ids[0].clone()], &[ids[1].clone()], Some(week));
    engine.insert_relation(&r).unwrap();

    let stored = engine.get_relation(&r.id).unwrap().unwrap();
    assert_eq!(
        stored.expires_at.unwrap(),
        stored.created_at + Duration::days(7)
    );
    assert_eq!(engine.count_expired_relations(time::now()).unwrap(), 0);
}

#[test]
fn expired_relations_are_removed_with_join_rows() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 2);
    let permanent = relation(&[ids[0].clone()], &[ids[1].clone()], None);
    engine.insert_relation(&permanent).unwrap();
    let mut short = Vec::new();
    for _ in 0..3 {
        let r = relation(&[ids[0].clone()], &[ids[1].clone()], Some(1));
        engine.insert_relation(&r).unwrap();
        short.push(r.id);
    }

    let later = time::now() + Duration::milliseconds(10);
    assert_eq!(engine.count_expired_relations(later).unwrap(), 3);
    assert_eq!(engine.get_expired_relations(later).unwrap().len(), 3);

    let mut deleted = engine.delete_expired_relations(later).unwrap();
    deleted.sort();
    short.sort();
    assert_eq!(deleted, short);
    assert_eq!(engine.relation_count().unwrap(), 1);
    assert!(engine.get_relation(&permanent.id).unwrap().is_some());
    assert_eq!(
        engine.get_relations_for_entry(&ids[0], Direction::Both).unwrap().len(),
        1
    );
}

#[test]
fn relation_to_unknown_entry_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let ids = seed(&engine, 1);
    let r = relation(&[ids[0].clone()], &["ghost".to_string()], None);
    assert!(engine.insert_relation(&r).is_err());
    assert_eq!(engine.relation_count().unwrap(), 0);
}
