//! Architecture → Implementation: an implementation entry is enabled by the
//! design decisions it resembles or shares a topic tag with.

use mneme_core::errors::MnemeResult;
use mneme_core::memory::MemoryEntry;
use mneme_core::models::CausalRelationType;

use super::search_tagged;
use crate::detection::{DetectionContext, ProposedRelation};

pub const TRIGGER_TAGS: [&str; 2] = ["implementation", "impl"];
pub const TARGET_TAGS: [&str; 2] = ["architecture", "design"];

/// `namespace:value` tags in these namespaces describe bookkeeping, not topic.
const GENERIC_NAMESPACES: [&str; 3] = ["session", "date", "instance"];
const GENERIC_TAGS: [&str; 3] = ["implementation", "impl", "bugfix"];

pub fn detect(ctx: &DetectionContext<'_>, entry: &MemoryEntry) -> MnemeResult<Vec<ProposedRelation>> {
    if !entry.metadata.has_any_tag(&TRIGGER_TAGS) {
        return Ok(Vec::new());
    }
    let config = ctx.config;
    let matches = search_tagged(ctx, entry, &TARGET_TAGS, config.architecture_min_similarity)?;

    let mut proposals = Vec::new();
    for m in matches {
        let shared = shares_topic_tag(entry, &m.entry);
        let strength = if shared {
            config.architecture_shared_tag_strength
        } else if m.similarity >= config.architecture_strong_similarity {
            config.architecture_similarity_strength
        } else {
            continue;
        };
        proposals.push(ProposedRelation::single(
            m.entry.id,
            entry.id.clone(),
            CausalRelationType::Enables,
            strength,
        ));
    }
    Ok(proposals)
}

fn is_generic(tag: &str) -> bool {
    let lower = tag.to_ascii_lowercase();
    let namespace = lower.split_once(':').map_or(lower.as_str(), |(ns, _)| ns);
    GENERIC_NAMESPACES.contains(&namespace)
        || GENERIC_TAGS.contains(&lower.as_str())
        || TARGET_TAGS.contains(&lower.as_str())
}

fn shares_topic_tag(a: &MemoryEntry, b: &MemoryEntry) -> bool {
    a.metadata
        .tags
        .intersection(&b.metadata.tags)
        .any(|t| !is_generic(t))
}
