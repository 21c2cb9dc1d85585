//! RetrievalRanker: Q-value updates, ranking snapshots, feedback intake and
//! application over `IMemRlStorage`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use mneme_core::config::MemRlConfig;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::models::{FeedbackDisagreement, FeedbackRating, MemRlQueryRecord, QValueDistribution};
use mneme_core::time;
use mneme_core::traits::IMemRlStorage;

use crate::feedback;
use crate::qvalue::ema_update;
use crate::ranking::{self, Candidate, RankingParams};

/// Result of recording one rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackOutcome {
    pub rating: FeedbackRating,
    /// Set when this rating left the auto and human scores far apart.
    pub disagreement: Option<FeedbackDisagreement>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemRlStats {
    pub queries: usize,
    pub queries_without_feedback: usize,
    pub disagreements: usize,
    pub q_values: QValueDistribution,
}

pub struct RetrievalRanker {
    storage: Arc<dyn IMemRlStorage>,
    config: MemRlConfig,
}

impl RetrievalRanker {
    pub fn new(storage: Arc<dyn IMemRlStorage>, config: MemRlConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &MemRlConfig {
        &self.config
    }

    pub fn default_params(&self) -> RankingParams {
        RankingParams::from_config(&self.config)
    }

    // --- Q-values ---

    pub fn get_q_value(&self, entry_id: &str) -> MnemeResult<Option<f64>> {
        self.storage.get_q_value(entry_id)
    }

    pub fn get_q_values(&self, entry_ids: &[String]) -> MnemeResult<HashMap<String, f64>> {
        self.storage.get_q_values(entry_ids)
    }

    /// Apply one reward with the configured learning rate.
    /// `None` when the entry does not exist.
    pub fn update_q_value(&self, entry_id: &str, reward: f64) -> MnemeResult<Option<f64>> {
        self.update_q_value_with_alpha(entry_id, reward, self.config.alpha)
    }

    pub fn update_q_value_with_alpha(
        &self,
        entry_id: &str,
        reward: f64,
        alpha: f64,
    ) -> MnemeResult<Option<f64>> {
        let mut updated = self.apply(&[(entry_id.to_string(), reward)], alpha)?;
        Ok(updated.remove(entry_id))
    }

    /// Apply every reward in one transaction. Unknown entries are skipped.
    pub fn update_q_values(&self, rewards: &[(String, f64)]) -> MnemeResult<HashMap<String, f64>> {
        self.apply(rewards, self.config.alpha)
    }

    fn apply(&self, rewards: &[(String, f64)], alpha: f64) -> MnemeResult<HashMap<String, f64>> {
        let rule = move |q: f64, reward: f64| ema_update(q, reward, alpha);
        let updated = self.storage.update_q_values(rewards, &rule)?;
        debug!(requested = rewards.len(), updated = updated.len(), alpha, "q-values updated");
        Ok(updated)
    }

    // --- Ranking ---

    /// Rank `candidates` and persist the decision snapshot. The returned
    /// record's id is the handle for later feedback.
    pub fn rank(
        &self,
        query_text: &str,
        candidates: &[Candidate],
        params: Option<RankingParams>,
    ) -> MnemeResult<MemRlQueryRecord> {
        let params = params.unwrap_or_else(|| self.default_params());
        let mut ids: Vec<String> = candidates.iter().map(|c| c.entry_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let q_values = self.storage.get_q_values(&ids)?;

        let record = MemRlQueryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            query_text: query_text.to_string(),
            candidates: ranking::rank(candidates, &q_values, params),
            delta: params.delta,
            lambda: params.lambda,
            has_feedback: false,
            created_at: time::now(),
        };
        self.storage.insert_query_record(&record)?;
        debug!(
            query_id = %record.id,
            offered = candidates.len(),
            kept = record.candidates.len(),
            "ranking recorded"
        );
        Ok(record)
    }

    pub fn get_query_record(&self, query_id: &str) -> MnemeResult<Option<MemRlQueryRecord>> {
        self.storage.get_query_record(query_id)
    }

    // --- Feedback ---

    /// Store (or replace) the automatic or human rating for a query. When both
    /// exist and differ by at least the configured threshold, the pair is
    /// appended to the disagreement log.
    pub fn record_feedback(
        &self,
        query_id: &str,
        score: u8,
        auto: bool,
        context: Option<String>,
    ) -> MnemeResult<FeedbackOutcome> {
        feedback::validate_score(score)?;
        let now = time::now();
        let rating = FeedbackRating {
            query_id: query_id.to_string(),
            score,
            auto,
            created_at: now,
        };
        self.storage.upsert_feedback(&rating)?;

        let ratings = self.storage.get_feedback(query_id)?;
        let disagreement = match feedback::disagreement(&ratings, self.config.disagreement_threshold) {
            Some((auto_score, human_score)) => {
                let d = FeedbackDisagreement {
                    query_id: query_id.to_string(),
                    auto_score,
                    human_score,
                    context,
                    created_at: now,
                };
                self.storage.insert_disagreement(&d)?;
                info!(query_id, auto_score, human_score, "feedback disagreement recorded");
                Some(d)
            }
            None => None,
        };
        Ok(FeedbackOutcome {
            rating,
            disagreement,
        })
    }

    pub fn get_feedback(&self, query_id: &str) -> MnemeResult<Vec<FeedbackRating>> {
        self.storage.get_feedback(query_id)
    }

    pub fn list_disagreements(&self) -> MnemeResult<Vec<FeedbackDisagreement>> {
        self.storage.list_disagreements()
    }

    /// Turn the authoritative rating of a query into a reward and apply it to
    /// every candidate in the query's snapshot. Returns the new Q-values;
    /// empty when the query has no rating yet.
    pub fn apply_feedback(&self, query_id: &str) -> MnemeResult<HashMap<String, f64>> {
        let record = self
            .storage
            .get_query_record(query_id)?
            .ok_or_else(|| MnemeError::QueryNotFound {
                id: query_id.to_string(),
            })?;
        let ratings = self.storage.get_feedback(query_id)?;
        let Some(rating) = feedback::authoritative(&ratings) else {
            return Ok(HashMap::new());
        };
        let reward = feedback::score_to_reward(rating.score);
        let rewards: Vec<(String, f64)> = record
            .candidates
            .iter()
            .map(|c| (c.entry_id.clone(), reward))
            .collect();
        self.update_q_values(&rewards)
    }

    // --- Reporting ---

    pub fn distribution(&self) -> MnemeResult<QValueDistribution> {
        self.storage
            .q_value_distribution(self.config.low_below, self.config.high_from)
    }

    pub fn stats(&self) -> MnemeResult<MemRlStats> {
        Ok(MemRlStats {
            queries: self.storage.query_count()?,
            queries_without_feedback: self.storage.count_queries_without_feedback()?,
            disagreements: self.storage.list_disagreements()?.len(),
            q_values: self.distribution()?,
        })
    }
}
