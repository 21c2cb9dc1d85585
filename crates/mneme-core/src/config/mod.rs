//! Engine configuration, loadable from TOML. Every section falls back to the
//! values in [`defaults`].

pub mod defaults;

mod causal_config;
mod embedding_config;
mod memrl_config;
mod observability_config;
mod pattern_config;
mod provenance_config;
mod retrieval_config;
mod storage_config;
mod tiering_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use causal_config::{CausalConfig, StrengthRange};
pub use embedding_config::EmbeddingConfig;
pub use memrl_config::MemRlConfig;
pub use observability_config::ObservabilityConfig;
pub use pattern_config::PatternConfig;
pub use provenance_config::ProvenanceConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;
pub use tiering_config::TieringConfig;

use crate::errors::{MnemeError, MnemeResult};

/// Root configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MnemeConfig {
    pub storage: StorageConfig,
    pub provenance: ProvenanceConfig,
    pub causal: CausalConfig,
    pub patterns: PatternConfig,
    pub memrl: MemRlConfig,
    pub retrieval: RetrievalConfig,
    pub tiering: TieringConfig,
    pub embedding: EmbeddingConfig,
    pub observability: ObservabilityConfig,
}

impl MnemeConfig {
    /// Parse a TOML document. Missing sections and fields keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> MnemeResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MnemeError::ConfigError(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&raw).map_err(|e| MnemeError::ConfigError(e.to_string()))
    }
}
