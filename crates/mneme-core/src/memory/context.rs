//! Typed replacements for opaque context/metadata blobs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single metadata value. Untagged so stored JSON stays natural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Context attached to a memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextPayload {
    /// A work session summary with the files it touched.
    Session {
        changed_files: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    /// Free-form text context.
    Note { text: String },
    /// Typed key/value fields.
    Fields { fields: BTreeMap<String, MetadataValue> },
}

impl ContextPayload {
    /// Files changed during a session, if this is a session context.
    pub fn changed_files(&self) -> Option<&[String]> {
        match self {
            Self::Session { changed_files, .. } => Some(changed_files),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_payload_is_tagged() {
        let ctx = ContextPayload::Session {
            changed_files: vec!["src/lib.rs".into()],
            summary: None,
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["kind"], "session");
        assert_eq!(ctx.changed_files().unwrap(), ["src/lib.rs".to_string()]);
    }

    #[test]
    fn metadata_values_round_trip_untagged() {
        let mut fields = BTreeMap::new();
        fields.insert("count".to_string(), MetadataValue::Number(3.0));
        fields.insert("ok".to_string(), MetadataValue::Bool(true));
        fields.insert("who".to_string(), MetadataValue::from("agent-7"));
        let ctx = ContextPayload::Fields { fields };
        let raw = serde_json::to_string(&ctx).unwrap();
        let back: ContextPayload = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, ctx);
    }
}
