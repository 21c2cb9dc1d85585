//! # mneme-memrl
//!
//! Retrieval re-ranking from observed feedback. Every entry carries a
//! Q-value updated by an exponential moving average of rewards; ranking
//! gates candidates by similarity and orders them by a blend of similarity
//! and Q-value; ratings of a ranking's results turn into rewards for the
//! candidates it returned.

pub mod engine;
pub mod feedback;
pub mod qvalue;
pub mod ranking;

pub use engine::{FeedbackOutcome, MemRlStats, RetrievalRanker};
pub use ranking::{Candidate, RankingParams};
