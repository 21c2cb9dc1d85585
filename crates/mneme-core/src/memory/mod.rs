pub mod context;
pub mod entry;
pub mod provenance;
pub mod source;

pub use context::{ContextPayload, MetadataValue};
pub use entry::{MemoryEntry, MemoryMetadata};
pub use provenance::{ProvenanceInfo, ProvenanceInput};
pub use source::MemorySource;
