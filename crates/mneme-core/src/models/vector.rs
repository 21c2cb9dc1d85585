use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MnemeError, MnemeResult};

/// Storage tier of a vector, driven by access frequency and recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionTier {
    #[default]
    Hot,
    Warm,
    Cold,
}

impl CompressionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }
}

impl fmt::Display for CompressionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionTier {
    type Err = MnemeError;

    fn from_str(s: &str) -> MnemeResult<Self> {
        match s {
            "hot" => Ok(Self::Hot),
            "warm" => Ok(Self::Warm),
            "cold" => Ok(Self::Cold),
            other => Err(MnemeError::ValidationError(format!(
                "unknown compression tier: {other}"
            ))),
        }
    }
}

/// Entry ↔ ANN label mapping plus access statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMapping {
    pub entry_id: String,
    pub label: u64,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub compression_tier: CompressionTier,
}

/// Number of vectors in each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
}
