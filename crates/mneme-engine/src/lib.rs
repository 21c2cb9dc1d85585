//! # mneme-engine
//!
//! The façade over the Mneme workspace. [`MemoryEngine`] stores entries
//! (scoring provenance, embedding, indexing, and running causal detection),
//! answers similarity queries with optional MemRL re-ranking, and exposes
//! the causal, pattern, provenance, and maintenance operations of the
//! subsystem crates. Ships an in-process embedder and flat index for small
//! deployments and tests.

pub mod embedder;
pub mod engine;
pub mod health;
pub mod index;
pub mod similarity;
pub mod tracing_setup;

pub use embedder::HashedTermEmbedder;
pub use engine::{MemoryEngine, RankedQuery, RankedResult};
pub use health::{HealthReport, HealthStatus};
pub use index::FlatIndex;
pub use tracing_setup::init_tracing;
