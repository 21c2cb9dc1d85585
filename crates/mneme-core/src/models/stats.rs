use serde::{Deserialize, Serialize};

/// Entries removed by a delete, with the vector labels they held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub entry_ids: Vec<String>,
    pub labels: Vec<u64>,
    /// Relations removed because an endpoint set became empty.
    pub orphaned_relations: usize,
}

impl DeletionReport {
    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }
}

/// Row counts per logical table group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub entries: usize,
    pub tags: usize,
    pub provenance_links: usize,
    pub relations: usize,
    pub templates: usize,
    pub vector_mappings: usize,
    pub memrl_queries: usize,
    pub disagreements: usize,
}
