//! Detection strategies with a scripted similarity provider.

use std::sync::{Arc, Mutex};

use mneme_causal::detection::{DetectionStrategy, DETECTED_BY_KEY};
use mneme_causal::{CausalGraph, DetectionEngine};
use mneme_core::config::CausalConfig;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::{ContextPayload, MemoryEntry, MemoryMetadata, MetadataValue, ProvenanceInfo};
use mneme_core::models::CausalRelationType;
use mneme_core::traits::{IMemoryStorage, ISimilaritySearch, SimilarMatch, SimilarityFilter};
use mneme_storage::StorageEngine;

/// Returns every scripted candidate that passes the filter.
#[derive(Default)]
struct ScriptedSearch {
    candidates: Mutex<Vec<(MemoryEntry, f64)>>,
}

impl ScriptedSearch {
    fn add(&self, entry: &MemoryEntry, similarity: f64) {
        self.candidates.lock().unwrap().push((entry.clone(), similarity));
    }
}

impl ISimilaritySearch for ScriptedSearch {
    fn find_similar(&self, _content: &str, filter: &SimilarityFilter) -> MnemeResult<Vec<SimilarMatch>> {
        let candidates = self.candidates.lock().unwrap();
        Ok(candidates
            .iter()
            .filter(|(e, s)| {
                *s >= filter.min_similarity
                    && filter.exclude_id.as_deref() != Some(e.id.as_str())
                    && (filter.any_tags.is_empty()
                        || filter.any_tags.iter().any(|t| e.metadata.tags.contains(t)))
            })
            .take(filter.limit)
            .map(|(e, s)| SimilarMatch {
                entry: e.clone(),
                similarity: *s,
            })
            .collect())
    }
}

struct FailingSearch;

impl ISimilaritySearch for FailingSearch {
    fn find_similar(&self, _content: &str, _filter: &SimilarityFilter) -> MnemeResult<Vec<SimilarMatch>> {
        Err(MnemeError::IndexError("index offline".into()))
    }
}

struct Harness {
    storage: Arc<StorageEngine>,
    search: Arc<ScriptedSearch>,
    detector: DetectionEngine,
}

fn harness(config: CausalConfig) -> Harness {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let search = Arc::new(ScriptedSearch::default());
    let graph = Arc::new(CausalGraph::new(storage.clone(), storage.clone()));
    let detector = DetectionEngine::new(graph, search.clone(), storage.clone(), config);
    Harness {
        storage,
        search,
        detector,
    }
}

fn stored(h: &Harness, content: &str, metadata: MemoryMetadata) -> MemoryEntry {
    let entry = MemoryEntry::new(content, metadata, ProvenanceInfo::default());
    h.storage.create_entry(&entry).unwrap();
    entry
}

fn tagged(tags: &[&str]) -> MemoryMetadata {
    MemoryMetadata::default().with_tags(tags.iter().copied())
}

#[test]
fn bug_fix_creates_one_causes_edge() {
    let h = harness(CausalConfig::default());
    let bug = stored(&h, "login crashes on empty password", tagged(&["bug"]));
    assert_eq!(h.detector.detect(&bug).created_count(), 0);
    h.search.add(&bug, 1.0);

    let fix = stored(&h, "fixed login crash on empty password", tagged(&["fix"]));
    let report = h.detector.detect(&fix);
    assert_eq!(report.created_count(), 1);
    let rel = &report.created[0];
    assert_eq!(rel.relation_type, CausalRelationType::Causes);
    assert!(rel.source_ids.contains(&bug.id));
    assert!(rel.target_ids.contains(&fix.id));
    assert!((0.70..=0.95).contains(&rel.strength));
    assert!((rel.strength - 0.95).abs() < 1e-9);
    assert_eq!(
        rel.metadata.as_ref().unwrap()[DETECTED_BY_KEY],
        MetadataValue::from("bug_fix")
    );
}

#[test]
fn bug_fix_strength_at_threshold_is_minimum() {
    let h = harness(CausalConfig::default());
    let bug = stored(&h, "bug", tagged(&["error"]));
    h.search.add(&bug, 0.55);
    let fix = stored(&h, "fix", tagged(&["bugfix"]));
    let report = h.detector.detect(&fix);
    assert_eq!(report.created_count(), 1);
    assert!((report.created[0].strength - 0.70).abs() < 1e-9);
}

#[test]
fn repeated_detection_does_not_duplicate() {
    let h = harness(CausalConfig::default());
    let bug = stored(&h, "bug", tagged(&["bug"]));
    h.search.add(&bug, 0.9);
    let fix = stored(&h, "fix", tagged(&["fix"]));
    assert_eq!(h.detector.detect(&fix).created_count(), 1);
    let again = h.detector.detect(&fix);
    assert_eq!(again.created_count(), 0);
    assert_eq!(again.duplicates, 1);
}

#[test]
fn error_resolution_triggers() {
    let h = harness(CausalConfig::default());
    let error = stored(&h, "timeout talking to db", tagged(&["error-pattern"]));
    h.search.add(&error, 0.6);
    let resolution = stored(&h, "raise pool size", tagged(&["resolution"]));
    let report = h.detector.detect(&resolution);
    assert_eq!(report.created_count(), 1);
    assert_eq!(report.created[0].relation_type, CausalRelationType::Triggers);
    assert!((report.created[0].strength - 0.65).abs() < 1e-9);
}

#[test]
fn architecture_requires_shared_tag_or_strong_similarity() {
    let h = harness(CausalConfig::default());
    let shared = stored(&h, "auth uses tokens", tagged(&["architecture", "auth"]));
    let similar = stored(&h, "storage layering", tagged(&["design"]));
    let weak = stored(&h, "caching idea", tagged(&["design", "session:1"]));
    h.search.add(&shared, 0.62);
    h.search.add(&similar, 0.75);
    h.search.add(&weak, 0.65);

    let implementation = stored(&h, "token auth impl", tagged(&["implementation", "auth", "session:1"]));
    let report = h.detector.detect(&implementation);
    assert_eq!(report.created_count(), 2);

    let strength_of = |id: &str| {
        report
            .created
            .iter()
            .find(|r| r.source_ids.contains(id))
            .map(|r| r.strength)
    };
    assert_eq!(strength_of(shared.id.as_str()), Some(0.8));
    assert_eq!(strength_of(similar.id.as_str()), Some(0.75));
    assert_eq!(strength_of(weak.id.as_str()), None);
    assert!(report
        .created
        .iter()
        .all(|r| r.relation_type == CausalRelationType::Enables));
}

#[test]
fn cross_instance_mentions_link_other_instances() {
    let h = harness(CausalConfig::default());
    let remote = stored(&h, "beta rolled out the schema change", tagged(&["instance:beta"]));
    let unrelated = stored(&h, "gamma notes", tagged(&["instance:gamma"]));
    h.search.add(&remote, 0.7);
    h.search.add(&unrelated, 0.9);

    let local = stored(
        &h,
        "following instance:beta, applied the schema change",
        tagged(&["instance:alpha"]),
    );
    let report = h.detector.detect(&local);
    assert_eq!(report.created_count(), 1);
    let rel = &report.created[0];
    assert_eq!(rel.relation_type, CausalRelationType::Enables);
    assert!(rel.source_ids.contains(&remote.id));
    assert_eq!(rel.strength, 0.8);
}

#[test]
fn cross_instance_needs_own_instance_tag() {
    let h = harness(CausalConfig::default());
    let remote = stored(&h, "beta", tagged(&["instance:beta"]));
    h.search.add(&remote, 0.9);
    let untagged = stored(&h, "see instance:beta", MemoryMetadata::default());
    assert_eq!(h.detector.detect(&untagged).created_count(), 0);
}

fn session(id: &str, files: &[&str]) -> MemoryMetadata {
    MemoryMetadata::default()
        .with_session(id)
        .with_context(ContextPayload::Session {
            changed_files: files.iter().map(|f| f.to_string()).collect(),
            summary: None,
        })
}

#[test]
fn session_chain_links_overlapping_sessions() {
    let h = harness(CausalConfig::default());
    let first = stored(&h, "session one", session("s1", &["a.rs", "b.rs", "c.rs"]));
    let _other = stored(&h, "session two", session("s2", &["z.rs"]));
    let third = stored(&h, "session three", session("s3", &["a.rs", "b.rs"]));

    let report = h.detector.detect(&third);
    assert_eq!(report.created_count(), 1);
    let rel = &report.created[0];
    assert_eq!(rel.relation_type, CausalRelationType::Precedes);
    assert!(rel.source_ids.contains(&first.id));
    assert!(rel.target_ids.contains(&third.id));
    assert!((rel.strength - 0.7).abs() < 1e-9);
}

#[test]
fn session_chain_reaches_past_unrelated_writes() {
    let h = harness(CausalConfig::default());
    let earlier = stored(&h, "refactor session", session("s1", &["src/lib.rs"]));
    for i in 0..60 {
        stored(&h, &format!("scratch note {i}"), tagged(&["note"]));
    }
    let later = stored(&h, "follow-up session", session("s2", &["src/lib.rs"]));

    let report = h.detector.detect(&later);
    assert_eq!(report.created_count(), 1);
    let rel = &report.created[0];
    assert_eq!(rel.relation_type, CausalRelationType::Precedes);
    assert!(rel.source_ids.contains(&earlier.id));
    assert!(rel.target_ids.contains(&later.id));
}

#[test]
fn failing_strategy_is_counted_not_propagated() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = Arc::new(CausalGraph::new(storage.clone(), storage.clone()));
    let detector = DetectionEngine::new(
        graph,
        Arc::new(FailingSearch),
        storage.clone(),
        CausalConfig::default(),
    );
    let entry = MemoryEntry::new("fix", tagged(&["fix"]), ProvenanceInfo::default());
    storage.create_entry(&entry).unwrap();

    let report = detector.detect(&entry);
    assert_eq!(report.created_count(), 0);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].strategy, DetectionStrategy::BugFix);
}

#[test]
fn disabled_detection_does_nothing() {
    let config = CausalConfig {
        detection_enabled: false,
        ..CausalConfig::default()
    };
    let h = harness(config);
    let bug = stored(&h, "bug", tagged(&["bug"]));
    h.search.add(&bug, 1.0);
    let fix = stored(&h, "fix", tagged(&["fix"]));
    assert!(!h.detector.is_enabled());
    assert_eq!(h.detector.detect(&fix), Default::default());
}
