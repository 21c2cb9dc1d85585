//! Error → Resolution: a resolution-tagged entry is triggered by similar
//! recurring error patterns.

use mneme_core::errors::MnemeResult;
use mneme_core::memory::MemoryEntry;
use mneme_core::models::CausalRelationType;

use super::search_tagged;
use crate::detection::{DetectionContext, ProposedRelation};

pub const TRIGGER_TAGS: [&str; 3] = ["resolution", "resolved", "solution"];
pub const TARGET_TAGS: [&str; 2] = ["error-pattern", "error_pattern"];

pub fn detect(ctx: &DetectionContext<'_>, entry: &MemoryEntry) -> MnemeResult<Vec<ProposedRelation>> {
    if !entry.metadata.has_any_tag(&TRIGGER_TAGS) {
        return Ok(Vec::new());
    }
    let threshold = ctx.config.error_resolution_min_similarity;
    let matches = search_tagged(ctx, entry, &TARGET_TAGS, threshold)?;
    Ok(matches
        .into_iter()
        .map(|m| {
            let strength = ctx
                .config
                .error_resolution_strength
                .scale(m.similarity, threshold);
            ProposedRelation::single(m.entry.id, entry.id.clone(), CausalRelationType::Triggers, strength)
        })
        .collect())
}
