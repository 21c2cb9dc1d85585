//! Cross-instance: an instance-tagged entry that mentions another instance
//! is enabled by similar entries from that instance.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use mneme_core::errors::MnemeResult;
use mneme_core::memory::MemoryEntry;
use mneme_core::models::CausalRelationType;
use mneme_core::traits::SimilarityFilter;

use crate::detection::{DetectionContext, ProposedRelation};

pub const INSTANCE_TAG_PREFIX: &str = "instance:";

static MENTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\binstance:([A-Za-z0-9_.-]+)").ok());

pub fn detect(ctx: &DetectionContext<'_>, entry: &MemoryEntry) -> MnemeResult<Vec<ProposedRelation>> {
    let own: BTreeSet<&str> = entry
        .metadata
        .tags
        .iter()
        .filter_map(|t| t.strip_prefix(INSTANCE_TAG_PREFIX))
        .collect();
    if own.is_empty() {
        return Ok(Vec::new());
    }

    let mut proposals = Vec::new();
    for instance in mentioned_instances(&entry.content) {
        if own.contains(instance.as_str()) {
            continue;
        }
        let filter = SimilarityFilter::new(
            ctx.config.cross_instance_min_similarity,
            ctx.config.search_limit,
        )
        .with_tags([format!("{INSTANCE_TAG_PREFIX}{instance}")])
        .excluding(entry.id.clone());

        for m in ctx.similarity.find_similar(&entry.content, &filter)? {
            if m.entry.id == entry.id {
                continue;
            }
            proposals.push(ProposedRelation::single(
                m.entry.id,
                entry.id.clone(),
                CausalRelationType::Enables,
                ctx.config.cross_instance_strength,
            ));
        }
    }
    Ok(proposals)
}

/// Distinct instance identifiers mentioned in `content`, in order of appearance.
pub fn mentioned_instances(content: &str) -> Vec<String> {
    let Some(re) = MENTION.as_ref() else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    re.captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim_end_matches('.').to_string()))
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_distinct_mentions() {
        let found = mentioned_instances(
            "Synced with instance:beta and INSTANCE:gamma. Again instance:beta.",
        );
        assert_eq!(found, vec!["beta".to_string(), "gamma".to_string()]);
    }

    #[test]
    fn no_mentions() {
        assert!(mentioned_instances("plain text").is_empty());
    }
}
