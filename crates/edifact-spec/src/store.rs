//! Specification store interface and the in-memory store

use crate::key::SpecKey;
use crate::model::MessageStructureDefinition;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Read-only lookup of message structure definitions.
///
/// Implementations are shared between concurrent parses and must not change
/// the answer for a key while a parse is in flight.
pub trait MessageSpecificationStore: Send + Sync {
    /// Definition for a message type, or `None` when the store has no entry.
    ///
    /// # Errors
    ///
    /// Returns an error only when an entry exists but cannot be read.
    fn lookup(
        &self,
        message_type: &str,
        version: &str,
        release: &str,
        agency: &str,
    ) -> Result<Option<Arc<MessageStructureDefinition>>>;
}

/// Store holding definitions in a map, filled before it is shared
#[derive(Debug, Default, Clone)]
pub struct InMemorySpecificationStore {
    definitions: HashMap<SpecKey, Arc<MessageStructureDefinition>>,
}

impl InMemorySpecificationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition
    pub fn insert(&mut self, definition: MessageStructureDefinition) {
        self.definitions
            .insert(definition.key(), Arc::new(definition));
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with_definition(mut self, definition: MessageStructureDefinition) -> Self {
        self.insert(definition);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// An agency mismatch only counts when both sides name one
pub(crate) fn agency_matches(definition: &MessageStructureDefinition, agency: &str) -> bool {
    match definition.agency.as_deref() {
        Some(declared) if !agency.is_empty() => declared.eq_ignore_ascii_case(agency),
        _ => true,
    }
}

impl MessageSpecificationStore for InMemorySpecificationStore {
    fn lookup(
        &self,
        message_type: &str,
        version: &str,
        release: &str,
        agency: &str,
    ) -> Result<Option<Arc<MessageStructureDefinition>>> {
        let key = SpecKey::new(message_type, version, release);
        let found = self
            .definitions
            .get(&key)
            .filter(|definition| agency_matches(definition, agency))
            .cloned();
        trace!(%key, hit = found.is_some(), "in-memory specification lookup");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn definition(agency: Option<&str>) -> MessageStructureDefinition {
        MessageStructureDefinition {
            message_type: "DESADV".to_string(),
            version: "D".to_string(),
            release: "01B".to_string(),
            agency: agency.map(str::to_string),
            structure: Vec::new(),
            segments: BTreeMap::new(),
            elements: BTreeMap::new(),
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let store = InMemorySpecificationStore::new().with_definition(definition(Some("UN")));
        assert_eq!(store.len(), 1);

        let hit = store.lookup("DESADV", "D", "01B", "UN").unwrap();
        assert_eq!(hit.unwrap().message_type, "DESADV");
        assert!(store.lookup("desadv", "d", "01b", "").unwrap().is_some());
        assert!(store.lookup("ORDERS", "D", "01B", "UN").unwrap().is_none());
        assert!(store.lookup("DESADV", "D", "96A", "UN").unwrap().is_none());
    }

    #[test]
    fn test_agency_must_agree_when_declared() {
        let store = InMemorySpecificationStore::new().with_definition(definition(Some("UN")));
        assert!(store.lookup("DESADV", "D", "01B", "EAN").unwrap().is_none());

        let open = InMemorySpecificationStore::new().with_definition(definition(None));
        assert!(open.lookup("DESADV", "D", "01B", "EAN").unwrap().is_some());
    }

    #[test]
    fn test_shared_between_threads() {
        let store: Arc<dyn MessageSpecificationStore> =
            Arc::new(InMemorySpecificationStore::new().with_definition(definition(None)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.lookup("DESADV", "D", "01B", "UN").unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }
    }
}
