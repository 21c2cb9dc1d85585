use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CausalError, MnemeError};
use crate::memory::MetadataValue;

/// Kind of causal hyperedge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CausalRelationType {
    Causes,
    Enables,
    Triggers,
    Prevents,
    Precedes,
    Correlates,
}

impl CausalRelationType {
    pub const ALL: [CausalRelationType; 6] = [
        Self::Causes,
        Self::Enables,
        Self::Triggers,
        Self::Prevents,
        Self::Precedes,
        Self::Correlates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Causes => "CAUSES",
            Self::Enables => "ENABLES",
            Self::Triggers => "TRIGGERS",
            Self::Prevents => "PREVENTS",
            Self::Precedes => "PRECEDES",
            Self::Correlates => "CORRELATES",
        }
    }
}

impl fmt::Display for CausalRelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CausalRelationType {
    type Err = MnemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CausalError::UnknownRelationType {
                    name: s.to_string(),
                }
                .into()
            })
    }
}

/// Which side of a relation an entry must be on to match a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Entry is a source.
    Forward,
    /// Entry is a target.
    Backward,
    #[default]
    Both,
}

/// A directed causal hyperedge between sets of memory entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalRelation {
    pub id: String,
    pub relation_type: CausalRelationType,
    pub source_ids: BTreeSet<String>,
    pub target_ids: BTreeSet<String>,
    pub strength: f64,
    pub metadata: Option<BTreeMap<String, MetadataValue>>,
    pub created_at: DateTime<Utc>,
    pub ttl_ms: Option<i64>,
    /// Fixed at creation as `created_at + ttl`; never recomputed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CausalRelation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn involves(&self, entry_id: &str) -> bool {
        self.source_ids.contains(entry_id) || self.target_ids.contains(entry_id)
    }
}

/// Optional settings for a new relation.
#[derive(Debug, Clone, Default)]
pub struct RelationOptions {
    pub ttl: Option<Duration>,
    pub metadata: Option<BTreeMap<String, MetadataValue>>,
}

impl RelationOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Outcome of an expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub cleaned: usize,
    pub ids: Vec<String>,
}
