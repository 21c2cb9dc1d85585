//! One module per heuristic. Each inspects the new entry and returns the
//! relations it proposes; the engine does the writing.

pub mod architecture;
pub mod bug_fix;
pub mod cross_instance;
pub mod error_resolution;
pub mod session_chain;

use mneme_core::errors::MnemeResult;
use mneme_core::memory::MemoryEntry;
use mneme_core::traits::{SimilarMatch, SimilarityFilter};

use super::DetectionContext;

/// Similar entries carrying at least one of `tags`, excluding `entry` itself.
pub(crate) fn search_tagged(
    ctx: &DetectionContext<'_>,
    entry: &MemoryEntry,
    tags: &[&str],
    min_similarity: f64,
) -> MnemeResult<Vec<SimilarMatch>> {
    let filter = SimilarityFilter::new(min_similarity, ctx.config.search_limit)
        .with_tags(tags.iter().copied())
        .excluding(entry.id.clone());
    let matches = ctx.similarity.find_similar(&entry.content, &filter)?;
    Ok(matches
        .into_iter()
        .filter(|m| m.entry.id != entry.id && m.similarity >= min_similarity)
        .collect())
}
