mod causal_storage;
mod embedding;
mod memrl_storage;
mod pattern_storage;
mod similarity;
mod storage;
mod vector_index;

pub use causal_storage::ICausalStorage;
pub use embedding::IEmbeddingProvider;
pub use memrl_storage::{IMemRlStorage, QUpdateRule};
pub use pattern_storage::IPatternStorage;
pub use similarity::{ISimilaritySearch, SimilarMatch, SimilarityFilter};
pub use storage::{IMemoryStorage, IMetadataStorage, IVectorMappingStorage};
pub use vector_index::{IVectorIndex, VectorHit};
