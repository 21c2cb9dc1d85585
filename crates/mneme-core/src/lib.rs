//! # mneme-core
//!
//! Foundation crate for the Mneme memory engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod memory;
pub mod models;
pub mod time;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::MnemeConfig;
pub use errors::{MnemeError, MnemeResult};
pub use memory::{ContextPayload, MemoryEntry, MemoryMetadata, MemorySource, ProvenanceInfo};
pub use models::{CausalRelation, CausalRelationType, Direction, PatternTemplate};
