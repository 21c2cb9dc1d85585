pub mod causal;
pub mod lineage;
pub mod memrl;
pub mod pattern;
pub mod query;
pub mod stats;
pub mod vector;

pub use causal::{CausalRelation, CausalRelationType, CleanupReport, Direction, RelationOptions};
pub use lineage::{LineageEdge, LineageLink, LineageNode, LineageTree};
pub use memrl::{
    FeedbackDisagreement, FeedbackRating, MemRlQueryRecord, QValueDistribution, RankedCandidate,
};
pub use pattern::{
    MatchSpan, PatternMatch, PatternStats, PatternTemplate, SlotDefinition, SlotType,
};
pub use query::{QueryFilters, QueryOptions, QueryResult};
pub use stats::{DeletionReport, StorageStats};
pub use vector::{CompressionTier, TierCounts, VectorMapping};
