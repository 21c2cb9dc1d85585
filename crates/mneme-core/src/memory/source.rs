use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{MnemeError, MnemeResult};

/// Who or what produced a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    User,
    #[default]
    Agent,
    Tool,
    System,
    External,
}

impl MemorySource {
    pub const ALL: [MemorySource; 5] = [
        Self::User,
        Self::Agent,
        Self::Tool,
        Self::System,
        Self::External,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::Tool => "tool",
            Self::System => "system",
            Self::External => "external",
        }
    }
}

impl fmt::Display for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemorySource {
    type Err = MnemeError;

    fn from_str(s: &str) -> MnemeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| MnemeError::ValidationError(format!("unknown memory source: {s}")))
    }
}
