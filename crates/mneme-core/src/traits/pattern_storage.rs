use chrono::{DateTime, Utc};

use crate::errors::MnemeResult;
use crate::models::{PatternStats, PatternTemplate};

/// Template library and usage counters.
pub trait IPatternStorage: Send + Sync {
    fn insert_template(&self, template: &PatternTemplate) -> MnemeResult<()>;
    /// Returns false when no template has this id.
    fn update_template(&self, template: &PatternTemplate) -> MnemeResult<bool>;
    fn get_template(&self, id: &str) -> MnemeResult<Option<PatternTemplate>>;
    fn get_template_by_name(&self, name: &str) -> MnemeResult<Option<PatternTemplate>>;
    fn list_templates(&self) -> MnemeResult<Vec<PatternTemplate>>;
    /// Deletes the template and its stats.
    fn delete_template(&self, id: &str) -> MnemeResult<bool>;

    // --- Stats ---
    /// `None` when no template has this id.
    fn record_use(&self, id: &str, success: bool, at: DateTime<Utc>)
        -> MnemeResult<Option<PatternStats>>;
    fn get_stats(&self, id: &str) -> MnemeResult<Option<PatternStats>>;
    fn get_all_stats(&self) -> MnemeResult<Vec<PatternStats>>;
    fn get_prune_candidates(
        &self,
        min_uses: u64,
        max_success_rate: f64,
    ) -> MnemeResult<Vec<PatternStats>>;
}
