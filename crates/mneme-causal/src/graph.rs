//! CausalGraph: hyperedge creation, lookup, and expiry over `ICausalStorage`.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use mneme_core::constants::META_LAST_EXPIRY_SWEEP;
use mneme_core::errors::{CausalError, MnemeResult};
use mneme_core::models::{
    CausalRelation, CausalRelationType, CleanupReport, Direction, RelationOptions,
};
use mneme_core::time;
use mneme_core::traits::{ICausalStorage, IMetadataStorage};

pub struct CausalGraph {
    storage: Arc<dyn ICausalStorage>,
    metadata: Arc<dyn IMetadataStorage>,
}

impl CausalGraph {
    pub fn new(storage: Arc<dyn ICausalStorage>, metadata: Arc<dyn IMetadataStorage>) -> Self {
        Self { storage, metadata }
    }

    /// Create one hyperedge from `sources` to `targets`.
    ///
    /// Both endpoint sets must be non-empty. Strength is stored as given.
    /// A ttl fixes `expires_at` at creation time.
    pub fn add_relation<S, T>(
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
        let source_ids: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        let target_ids: BTreeSet<String> = targets.into_iter().map(Into::into).collect();
        if source_ids.is_empty() {
            return Err(CausalError::EmptyEndpoints { side: "source" }.into());
        }
        if target_ids.is_empty() {
            return Err(CausalError::EmptyEndpoints { side: "target" }.into());
        }

        let created_at = time::now();
        let ttl_ms = options
            .ttl
            .map(|ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));
        let expires_at = ttl_ms
            .and_then(Duration::try_milliseconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl));

        let relation = CausalRelation {
            id: uuid::Uuid::new_v4().to_string(),
            relation_type,
            source_ids,
            target_ids,
            strength,
            metadata: options.metadata,
            created_at,
            ttl_ms,
            expires_at,
        };
        self.storage.insert_relation(&relation)?;
        debug!(
            relation_id = %relation.id,
            relation_type = %relation.relation_type,
            sources = relation.source_ids.len(),
            targets = relation.target_ids.len(),
            strength,
            "causal relation added"
        );
        Ok(relation)
    }

    pub fn get_relation(&self, id: &str) -> MnemeResult<Option<CausalRelation>> {
        self.storage.get_relation(id)
    }

    pub fn get_batch_relations(&self, ids: &[String]) -> MnemeResult<Vec<CausalRelation>> {
        self.storage.get_batch_relations(ids)
    }

    /// Relations where `entry_id` is a source (`Forward`), a target
    /// (`Backward`), or either (`Both`). Each relation appears once.
    pub fn get_relations_for_entry(
        &self,
        entry_id: &str,
        direction: Direction,
    ) -> MnemeResult<Vec<CausalRelation>> {
        self.storage.get_relations_for_entry(entry_id, direction)
    }

    pub fn delete_relation(&self, id: &str) -> MnemeResult<bool> {
        self.storage.delete_relation(id)
    }

    pub fn relation_count(&self) -> MnemeResult<usize> {
        self.storage.relation_count()
    }

    pub fn get_expired_relation_count(&self, now: DateTime<Utc>) -> MnemeResult<usize> {
        self.storage.count_expired_relations(now)
    }

    pub fn get_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<Vec<CausalRelation>> {
        self.storage.get_expired_relations(now)
    }

    /// Delete every relation expired at `now` and record the sweep time.
    pub fn cleanup_expired_relations(&self, now: DateTime<Utc>) -> MnemeResult<CleanupReport> {
        let ids = self.storage.delete_expired_relations(now)?;
        self.metadata
            .set_metadata(META_LAST_EXPIRY_SWEEP, &time::to_millis(&now).to_string())?;
        if !ids.is_empty() {
            info!(cleaned = ids.len(), "expired causal relations removed");
        }
        Ok(CleanupReport {
            cleaned: ids.len(),
            ids,
        })
    }

    /// Time of the last expiry sweep, if one has run.
    pub fn last_expiry_sweep(&self) -> MnemeResult<Option<DateTime<Utc>>> {
        Ok(self
            .metadata
            .get_metadata(META_LAST_EXPIRY_SWEEP)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(time::from_millis))
    }
}
