//! Concurrent cache of loaded definitions

use crate::key::SpecKey;
use crate::model::MessageStructureDefinition;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe cache keyed by [`SpecKey`].
///
/// Only successful loads are cached, so a definition added to disk later is
/// still found.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: DashMap<SpecKey, Arc<MessageStructureDefinition>>,
}

impl DefinitionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached definition for a key
    #[must_use]
    pub fn get(&self, key: &SpecKey) -> Option<Arc<MessageStructureDefinition>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Cache a definition, keeping an entry another thread stored first
    pub fn insert(
        &self,
        key: SpecKey,
        definition: Arc<MessageStructureDefinition>,
    ) -> Arc<MessageStructureDefinition> {
        Arc::clone(self.entries.entry(key).or_insert(definition).value())
    }

    pub fn contains(&self, key: &SpecKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
