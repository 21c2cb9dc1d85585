//! PatternMatcher: template registry, cached compilation, matching, usage
//! stats, and pruning over `IPatternStorage`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use mneme_core::config::PatternConfig;
use mneme_core::errors::{MnemeResult, PatternError};
use mneme_core::models::{PatternMatch, PatternStats, PatternTemplate, SlotDefinition};
use mneme_core::time;
use mneme_core::traits::IPatternStorage;

use crate::cache::CompiledCache;
use crate::compiler::{self, CompiledTemplate};
use crate::scoring;

pub struct PatternMatcher {
    storage: Arc<dyn IPatternStorage>,
    cache: CompiledCache,
    config: PatternConfig,
}

impl PatternMatcher {
    pub fn new(storage: Arc<dyn IPatternStorage>, config: PatternConfig) -> Self {
        Self {
            storage,
            cache: CompiledCache::new(config.compiled_cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    // --- Registry ---

    /// Validate, compile, and persist a new template.
    pub fn register_template(
        &self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        slots: Vec<SlotDefinition>,
        priority: i64,
    ) -> MnemeResult<PatternTemplate> {
        let now = time::now();
        let template = PatternTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into().trim().to_string(),
            pattern: pattern.into(),
            slots,
            priority,
            created_at: now,
            updated_at: now,
        };
        let compiled = compiler::compile(&template)?;
        if self.storage.get_template_by_name(&template.name)?.is_some() {
            return Err(PatternError::DuplicateName {
                name: template.name,
            }
            .into());
        }
        self.storage.insert_template(&template)?;
        self.cache.insert(Arc::new(compiled));
        info!(template_id = %template.id, name = %template.name, "pattern template registered");
        Ok(template)
    }

    /// Replace a template's name, pattern, slots, and priority. Returns false
    /// when no template has this id.
    pub fn update_template(&self, template: &PatternTemplate) -> MnemeResult<bool> {
        compiler::validate(template)?;
        if let Some(other) = self.storage.get_template_by_name(&template.name)? {
            if other.id != template.id {
                return Err(PatternError::DuplicateName {
                    name: template.name.clone(),
                }
                .into());
            }
        }
        let mut updated = template.clone();
        updated.updated_at = time::now();
        let found = self.storage.update_template(&updated)?;
        self.cache.invalidate(&template.id);
        if found {
            debug!(template_id = %template.id, "pattern template updated");
        }
        Ok(found)
    }

    /// Delete a template and its stats.
    pub fn delete_template(&self, id: &str) -> MnemeResult<bool> {
        let deleted = self.storage.delete_template(id)?;
        self.cache.invalidate(id);
        Ok(deleted)
    }

    pub fn get_template(&self, id: &str) -> MnemeResult<Option<PatternTemplate>> {
        self.storage.get_template(id)
    }

    pub fn get_template_by_name(&self, name: &str) -> MnemeResult<Option<PatternTemplate>> {
        self.storage.get_template_by_name(name)
    }

    pub fn list_templates(&self) -> MnemeResult<Vec<PatternTemplate>> {
        self.storage.list_templates()
    }

    // --- Matching ---

    /// Run every template against `text`. Relative dates resolve against the
    /// current UTC day.
    pub fn match_text(&self, text: &str) -> MnemeResult<Vec<PatternMatch>> {
        self.match_text_on(text, Utc::now().date_naive())
    }

    /// Like [`match_text`](Self::match_text) with an explicit reference day.
    pub fn match_text_on(&self, text: &str, today: NaiveDate) -> MnemeResult<Vec<PatternMatch>> {
        let total_chars = text.chars().count();
        if total_chars == 0 {
            return Ok(Vec::new());
        }

        let templates = self.storage.list_templates()?;
        let priorities: HashMap<&str, i64> = templates
            .iter()
            .map(|t| (t.id.as_str(), t.priority))
            .collect();

        let mut matches = Vec::new();
        for template in &templates {
            let Some(compiled) = self.compiled(template) else {
                continue;
            };
            let Some(raw) = compiled.find(text, today) else {
                continue;
            };
            let confidence = scoring::confidence(
                raw.span.char_len(),
                total_chars,
                template.priority,
                &self.config,
            );
            if confidence < self.config.min_confidence {
                continue;
            }
            matches.push(PatternMatch {
                template_id: template.id.clone(),
                template_name: template.name.clone(),
                confidence,
                bindings: raw.bindings,
                span: raw.span,
            });
        }

        matches.sort_by(|a, b| {
            let pa = priorities.get(a.template_id.as_str()).copied().unwrap_or(0);
            let pb = priorities.get(b.template_id.as_str()).copied().unwrap_or(0);
            pb.cmp(&pa).then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        Ok(matches)
    }

    /// Cached compiled form; compiled on first use after a mutation.
    fn compiled(&self, template: &PatternTemplate) -> Option<Arc<CompiledTemplate>> {
        if let Some(hit) = self.cache.get(&template.id) {
            return Some(hit);
        }
        match compiler::compile(template) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.cache.insert(compiled.clone());
                Some(compiled)
            }
            Err(e) => {
                warn!(template_id = %template.id, error = %e, "stored template failed to compile");
                None
            }
        }
    }

    // --- Stats & pruning ---

    /// Count one use. `None` when no template has this id.
    pub fn record_use(&self, id: &str, success: bool) -> MnemeResult<Option<PatternStats>> {
        self.storage.record_use(id, success, time::now())
    }

    pub fn get_stats(&self, id: &str) -> MnemeResult<Option<PatternStats>> {
        self.storage.get_stats(id)
    }

    pub fn get_all_stats(&self) -> MnemeResult<Vec<PatternStats>> {
        self.storage.get_all_stats()
    }

    /// Templates with at least `prune_min_uses` uses and a success rate below
    /// `prune_max_success_rate`.
    pub fn get_prune_candidates(&self) -> MnemeResult<Vec<PatternStats>> {
        self.storage
            .get_prune_candidates(self.config.prune_min_uses, self.config.prune_max_success_rate)
    }

    /// Delete every prune candidate. Returns the deleted template ids.
    pub fn prune_patterns(&self) -> MnemeResult<Vec<String>> {
        let mut pruned = Vec::new();
        for stats in self.get_prune_candidates()? {
            if self.delete_template(&stats.template_id)? {
                pruned.push(stats.template_id);
            }
        }
        if !pruned.is_empty() {
            info!(count = pruned.len(), "pattern templates pruned");
        }
        Ok(pruned)
    }
}
