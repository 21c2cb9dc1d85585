//! Compiled-matcher cache using moka, keyed by template id.

use std::sync::Arc;

use moka::sync::Cache;

use crate::compiler::CompiledTemplate;

pub struct CompiledCache {
    cache: Cache<String, Arc<CompiledTemplate>>,
}

impl CompiledCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, template_id: &str) -> Option<Arc<CompiledTemplate>> {
        self.cache.get(template_id)
    }

    pub fn insert(&self, compiled: Arc<CompiledTemplate>) {
        self.cache.insert(compiled.template_id.clone(), compiled);
    }

    /// Drop the compiled form of one template.
    pub fn invalidate(&self, template_id: &str) {
        self.cache.invalidate(template_id);
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mneme_core::models::{PatternTemplate, SlotDefinition, SlotType};
    use mneme_core::time;

    fn compiled(id: &str) -> Arc<CompiledTemplate> {
        let now = time::now();
        let template = PatternTemplate {
            id: id.into(),
            name: format!("name-{id}"),
            pattern: "Hello {name}".into(),
            slots: vec![SlotDefinition::required("name", SlotType::Entity)],
            priority: 0,
            created_at: now,
            updated_at: now,
        };
        Arc::new(crate::compiler::compile(&template).unwrap())
    }

    #[test]
    fn insert_get_invalidate() {
        let cache = CompiledCache::new(16);
        cache.insert(compiled("a"));
        cache.insert(compiled("b"));
        assert!(cache.get("a").is_some());
        cache.invalidate("a");
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        cache.clear();
        assert!(cache.get("b").is_none());
    }
}
