//! Session chain: a session summary is preceded by earlier sessions that
//! touched the same files.

use std::collections::BTreeSet;

use mneme_core::errors::MnemeResult;
use mneme_core::memory::MemoryEntry;
use mneme_core::models::CausalRelationType;

use crate::detection::{DetectionContext, ProposedRelation};

pub fn detect(ctx: &DetectionContext<'_>, entry: &MemoryEntry) -> MnemeResult<Vec<ProposedRelation>> {
    let Some(files) = entry.metadata.context.as_ref().and_then(|c| c.changed_files()) else {
        return Ok(Vec::new());
    };
    let files: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let config = ctx.config;
    let mut proposals = Vec::new();
    for prior in ctx.storage.recent_session_entries(config.session_lookback)? {
        if prior.id == entry.id || same_session(entry, &prior) {
            continue;
        }
        let Some(prior_files) = prior.metadata.context.as_ref().and_then(|c| c.changed_files())
        else {
            continue;
        };
        let overlap = prior_files
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .intersection(&files)
            .count();
        if overlap == 0 {
            continue;
        }
        let strength = chain_strength(
            overlap,
            config.session_base_strength,
            config.session_overlap_step,
            config.session_max_strength,
        );
        proposals.push(ProposedRelation::single(
            prior.id,
            entry.id.clone(),
            CausalRelationType::Precedes,
            strength,
        ));
    }
    Ok(proposals)
}

fn same_session(a: &MemoryEntry, b: &MemoryEntry) -> bool {
    matches!(
        (&a.metadata.session_id, &b.metadata.session_id),
        (Some(x), Some(y)) if x == y
    )
}

/// `base + step × overlap`, capped at `max`.
pub fn chain_strength(overlap: usize, base: f64, step: f64, max: f64) -> f64 {
    (base + step * overlap as f64).min(max)
}
