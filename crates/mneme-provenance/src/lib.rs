//! # mneme-provenance
//!
//! Derivation tracking for memory entries. Computes L-Scores from the
//! confidence and relevance of an entry and its parents, traces bounded
//! lineage trees, and enforces the configured L-Score threshold.

pub mod engine;
pub mod lineage;
pub mod lscore;

pub use engine::ProvenanceEngine;
pub use lscore::{compute_l_score, LScoreInput};
