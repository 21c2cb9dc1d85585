use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContextPayload, MemorySource, ProvenanceInfo};

/// Caller-facing metadata for a memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub source: MemorySource,
    pub tags: BTreeSet<String>,
    /// Importance in [0.0, 1.0].
    pub importance: f64,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub context: Option<ContextPayload>,
}

impl Default for MemoryMetadata {
    fn default() -> Self {
        Self {
            source: MemorySource::default(),
            tags: BTreeSet::new(),
            importance: 0.5,
            session_id: None,
            agent_id: None,
            context: None,
        }
    }
}

impl MemoryMetadata {
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_source(mut self, source: MemorySource) -> Self {
        self.source = source;
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_context(mut self, context: ContextPayload) -> Self {
        self.context = Some(context);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }
}

/// A stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub content: String,
    pub metadata: MemoryMetadata,
    pub provenance: ProvenanceInfo,
    /// blake3 hex digest of `content`.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryEntry {
    /// Build a new entry with a fresh UUID and current timestamps.
    pub fn new(content: impl Into<String>, metadata: MemoryMetadata, provenance: ProvenanceInfo) -> Self {
        let content = content.into();
        let now = crate::time::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content_hash: Self::compute_content_hash(&content),
            content,
            metadata,
            provenance,
            created_at: now,
            updated_at: now,
        }
    }

    /// blake3 digest of the content, hex encoded.
    pub fn compute_content_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.has_tag(tag)
    }
}
