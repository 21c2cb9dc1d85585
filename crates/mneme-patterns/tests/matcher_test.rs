//! PatternMatcher over an in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;

use mneme_core::config::PatternConfig;
use mneme_core::errors::{MnemeError, PatternError};
use mneme_core::models::{SlotDefinition, SlotType};
use mneme_patterns::PatternMatcher;
use mneme_storage::StorageEngine;

fn matcher() -> PatternMatcher {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    PatternMatcher::new(storage, PatternConfig::default())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn hello_entity_template() {
    let m = matcher();
    let t = m
        .register_template("greeting", "Hello {name}", vec![SlotDefinition::required("name", SlotType::Entity)], 0)
        .unwrap();

    let found = m.match_text("Hello Alice").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].template_id, t.id);
    assert_eq!(found[0].template_name, "greeting");
    assert_eq!(found[0].bindings["name"], "Alice");
    assert_eq!(found[0].span.text, "Hello Alice");
    assert!((found[0].confidence - 1.0).abs() < 1e-9);

    assert!(m.match_text("hello alice").unwrap().is_empty());
}

#[test]
fn optional_slot_matches_with_positive_confidence() {
    let m = matcher();
    m.register_template(
        "meeting",
        "meet {person} {when}",
        vec![
            SlotDefinition::required("person", SlotType::Entity),
            SlotDefinition::optional("when", SlotType::Date),
        ],
        0,
    )
    .unwrap();

    let bare = m.match_text_on("please meet Grace Hopper", today()).unwrap();
    assert_eq!(bare.len(), 1);
    assert!(bare[0].confidence > 0.0);
    assert_eq!(bare[0].bindings["person"], "Grace Hopper");
    assert!(!bare[0].bindings.contains_key("when"));

    let dated = m.match_text_on("meet Grace on", today()).unwrap();
    assert_eq!(dated[0].bindings.get("when"), None);

    let full = m.match_text_on("meet Grace 2024-07-04", today()).unwrap();
    assert_eq!(full[0].bindings["when"], "2024-07-04");
}

#[test]
fn unmet_required_slot_yields_nothing() {
    let m = matcher();
    m.register_template(
        "deadline",
        "due {when}",
        vec![SlotDefinition::required("when", SlotType::Date)],
        0,
    )
    .unwrap();
    assert!(m.match_text_on("due 2024-13-45 sharp", today()).unwrap().is_empty());
    let ok = m.match_text_on("due tomorrow", today()).unwrap();
    assert_eq!(ok[0].bindings["when"], "2024-06-02");
}

#[test]
fn numbers_are_reparsed() {
    let m = matcher();
    m.register_template(
        "price",
        "costs {amount} dollars",
        vec![SlotDefinition::required("amount", SlotType::Number)],
        0,
    )
    .unwrap();
    let found = m.match_text("it costs +12.50 dollars").unwrap();
    assert_eq!(found[0].bindings["amount"], "12.5");
}

#[test]
fn results_sort_by_priority_then_confidence() {
    let m = matcher();
    let broad = m
        .register_template("broad", "{what}", vec![SlotDefinition::required("what", SlotType::Any)], 0)
        .unwrap();
    let specific = m
        .register_template(
            "task",
            "todo: {task}",
            vec![SlotDefinition::required("task", SlotType::Text)],
            5,
        )
        .unwrap();

    let found = m.match_text("todo: water the plants").unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].template_id, specific.id);
    assert_eq!(found[1].template_id, broad.id);
    assert!(found[1].confidence >= found[0].confidence - 0.2);
}

#[test]
fn low_confidence_matches_are_dropped() {
    let config = PatternConfig {
        min_confidence: 0.5,
        ..PatternConfig::default()
    };
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let m = PatternMatcher::new(storage, config);
    m.register_template("hi", "hi {name}", vec![SlotDefinition::required("name", SlotType::Entity)], 0)
        .unwrap();
    let long = format!("hi Bo {}", "filler ".repeat(20));
    assert!(m.match_text(&long).unwrap().is_empty());
}

#[test]
fn registration_validates() {
    let m = matcher();
    let err = m
        .register_template("bad", "Hello {name}", vec![], 0)
        .unwrap_err();
    assert!(matches!(
        err,
        MnemeError::PatternError(PatternError::InvalidTemplate { .. })
    ));

    m.register_template("dup", "Hi {n}", vec![SlotDefinition::required("n", SlotType::Entity)], 0)
        .unwrap();
    let err = m
        .register_template("dup", "Yo {n}", vec![SlotDefinition::required("n", SlotType::Entity)], 0)
        .unwrap_err();
    assert!(matches!(
        err,
        MnemeError::PatternError(PatternError::DuplicateName { .. })
    ));
    assert_eq!(m.list_templates().unwrap().len(), 1);
}

#[test]
fn update_invalidates_compiled_matcher() {
    let m = matcher();
    let mut t = m
        .register_template("greet", "Hello {name}", vec![SlotDefinition::required("name", SlotType::Entity)], 0)
        .unwrap();
    assert_eq!(m.match_text("Hello Bob").unwrap().len(), 1);

    t.pattern = "Goodbye {name}".to_string();
    assert!(m.update_template(&t).unwrap());
    assert!(m.match_text("Hello Bob").unwrap().is_empty());
    assert_eq!(m.match_text("Goodbye Bob").unwrap().len(), 1);

    let stored = m.get_template(&t.id).unwrap().unwrap();
    assert_eq!(stored.pattern, "Goodbye {name}");
    assert!(stored.updated_at >= stored.created_at);
    assert_eq!(m.get_template_by_name("greet").unwrap().unwrap().id, t.id);
}

#[test]
fn delete_removes_template_and_matches() {
    let m = matcher();
    let t = m
        .register_template("greet", "Hello {name}", vec![SlotDefinition::required("name", SlotType::Entity)], 0)
        .unwrap();
    assert!(m.delete_template(&t.id).unwrap());
    assert!(!m.delete_template(&t.id).unwrap());
    assert!(m.match_text("Hello Bob").unwrap().is_empty());
}

#[test]
fn usage_stats_accumulate() {
    let m = matcher();
    let t = m
        .register_template("greet", "Hello {name}", vec![SlotDefinition::required("name", SlotType::Entity)], 0)
        .unwrap();
    assert!(m.record_use("missing", true).unwrap().is_none());

    m.record_use(&t.id, true).unwrap();
    let stats = m.record_use(&t.id, false).unwrap().unwrap();
    assert_eq!(stats.use_count, 2);
    assert_eq!(stats.success_count, 1);
    assert!((stats.success_rate() - 0.5).abs() < 1e-12);
    assert!(stats.last_used_at.is_some());
    assert_eq!(m.get_stats(&t.id).unwrap().unwrap(), stats);
}

#[test]
fn pruning_respects_minimum_uses() {
    let m = matcher();
    let slots = || vec![SlotDefinition::required("n", SlotType::Entity)];
    let failing = m.register_template("failing", "A {n}", slots(), 0).unwrap();
    let young = m.register_template("young", "B {n}", slots(), 0).unwrap();
    let healthy = m.register_template("healthy", "C {n}", slots(), 0).unwrap();

    for i in 0..100 {
        m.record_use(&failing.id, i % 10 < 3).unwrap();
        m.record_use(&healthy.id, i % 10 < 5).unwrap();
    }
    for _ in 0..99 {
        m.record_use(&young.id, false).unwrap();
    }

    let candidates = m.get_prune_candidates().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].template_id, failing.id);
    assert!(candidates.iter().all(|c| c.use_count >= 100));

    assert_eq!(m.prune_patterns().unwrap(), vec![failing.id.clone()]);
    assert!(m.get_template(&failing.id).unwrap().is_none());
    assert!(m.get_stats(&failing.id).unwrap().is_none());
    assert_eq!(m.list_templates().unwrap().len(), 2);
}
