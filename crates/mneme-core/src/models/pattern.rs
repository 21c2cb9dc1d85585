use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MnemeError, MnemeResult};

/// Capture rule family for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Text,
    Entity,
    Date,
    Number,
    Any,
}

impl SlotType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Entity => "entity",
            Self::Date => "date",
            Self::Number => "number",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotType {
    type Err = MnemeError;

    fn from_str(s: &str) -> MnemeResult<Self> {
        match s {
            "text" => Ok(Self::Text),
            "entity" => Ok(Self::Entity),
            "date" => Ok(Self::Date),
            "number" => Ok(Self::Number),
            "any" => Ok(Self::Any),
            other => Err(MnemeError::ValidationError(format!("unknown slot type: {other}"))),
        }
    }
}

/// A named, typed capture point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub required: bool,
}

impl SlotDefinition {
    pub fn required(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            name: name.into(),
            slot_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            name: name.into(),
            slot_type,
            required: false,
        }
    }
}

/// A registered extraction template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTemplate {
    pub id: String,
    pub name: String,
    /// Pattern text with `{slot}` placeholders.
    pub pattern: String,
    pub slots: Vec<SlotDefinition>,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatternTemplate {
    pub fn slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Byte span of a match in the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl MatchSpan {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A validated template match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub template_id: String,
    pub template_name: String,
    pub confidence: f64,
    /// Slot name → normalized value.
    pub bindings: BTreeMap<String, String>,
    pub span: MatchSpan,
}

/// Accumulated usage counters for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStats {
    pub template_id: String,
    pub use_count: u64,
    pub success_count: u64,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl PatternStats {
    pub fn empty(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            use_count: 0,
            success_count: 0,
            last_used_at: None,
        }
    }

    /// Fraction of uses that succeeded; 0.0 when never used.
    pub fn success_rate(&self) -> f64 {
        if self.use_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.use_count as f64
        }
    }
}
