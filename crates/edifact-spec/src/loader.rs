//! Directory-backed specification store
//!
//! Definitions live under a root directory, one subdirectory per directory
//! version (`d01b`, `d96a`, ...). Two layouts are read:
//!
//! - converted: `<root>/d01b/converted/D01B_DESADV.struct.json`,
//!   `D01B_DESADV.segments.json` and `D01B_DESADV.elements.json`;
//! - combined: `<root>/d01b/DESADV.json` holding `messageStructureDefinition`,
//!   `segmentTable` and `elementTable` together.
//!
//! The converted layout is preferred when all three files exist.

use crate::key::{parse_directory, SpecKey};
use crate::model::{ElementEntry, MessageStructureDefinition, SegmentEntry, SegmentGroupRule};
use crate::registry::DefinitionCache;
use crate::store::{agency_matches, MessageSpecificationStore};
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Table wrapper of the combined download format
#[derive(Debug, Deserialize)]
struct TableFile<T> {
    entries: BTreeMap<String, T>,
}

/// Combined specification file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecificationFile {
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    controlling_agency: Option<String>,
    message_structure_definition: Vec<SegmentGroupRule>,
    segment_table: TableFile<SegmentEntry>,
    element_table: TableFile<ElementEntry>,
}

/// Store reading definitions from disk on first use and caching them
#[derive(Debug)]
pub struct DirectorySpecificationStore {
    root: PathBuf,
    cache: DefinitionCache,
}

impl DirectorySpecificationStore {
    /// Create a store rooted at `root`; nothing is read until a lookup
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: DefinitionCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Definitions loaded so far
    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    /// Load a definition, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when neither layout has the message type,
    /// [`Error::InvalidFormat`] for unreadable JSON and [`Error::Io`] for
    /// file system failures.
    pub fn load(&self, key: &SpecKey) -> Result<Arc<MessageStructureDefinition>> {
        if let Some(cached) = self.cache.get(key) {
            debug!(%key, "Cache hit for specification");
            return Ok(cached);
        }
        trace!(%key, "Cache miss for specification");

        let definition = self.load_from_disk(key)?;
        Ok(self.cache.insert(key.clone(), Arc::new(definition)))
    }

    fn load_from_disk(&self, key: &SpecKey) -> Result<MessageStructureDefinition> {
        if !key.is_path_safe() {
            return Err(Error::NotFound(format!(
                "{key} is not an alphanumeric specification key"
            )));
        }
        let version_dir = self.root.join(key.directory());

        let converted = version_dir.join("converted");
        let stem = key.file_stem();
        let struct_path = converted.join(format!("{stem}.struct.json"));
        let segments_path = converted.join(format!("{stem}.segments.json"));
        let elements_path = converted.join(format!("{stem}.elements.json"));

        if struct_path.exists() {
            if segments_path.exists() && elements_path.exists() {
                debug!(path = ?struct_path, "Loading converted specification");
                return Ok(MessageStructureDefinition {
                    message_type: key.message_type.clone(),
                    version: key.version.clone(),
                    release: key.release.clone(),
                    agency: None,
                    structure: read_json(&struct_path)?,
                    segments: read_json(&segments_path)?,
                    elements: read_json(&elements_path)?,
                });
            }
            warn!(
                path = ?struct_path,
                "Converted specification is missing its segment or element table"
            );
        }

        let combined = version_dir.join(format!("{}.json", key.message_type));
        if combined.exists() {
            debug!(path = ?combined, "Loading combined specification");
            let file: SpecificationFile = read_json(&combined)?;
            return Ok(MessageStructureDefinition {
                message_type: file.message_type.unwrap_or_else(|| key.message_type.clone()),
                version: file.version.unwrap_or_else(|| key.version.clone()),
                release: file.release.unwrap_or_else(|| key.release.clone()),
                agency: file.controlling_agency,
                structure: file.message_structure_definition,
                segments: file.segment_table.entries,
                elements: file.element_table.entries,
            });
        }

        Err(Error::NotFound(format!(
            "{key} under {}",
            version_dir.display()
        )))
    }

    /// Directory versions present under the root, as `(version, release)`.
    ///
    /// Entries whose names are not directory versions are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the root cannot be listed.
    pub fn versions(&self) -> Result<Vec<(String, String)>> {
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = ?self.root, error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            match parse_directory(&name.to_string_lossy()) {
                Ok(version) => versions.push(version),
                Err(_) => trace!(name = ?name, "Not a directory version"),
            }
        }
        versions.sort();
        Ok(versions)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::InvalidFormat(format!("{}: {e}", path.display())))
}

impl MessageSpecificationStore for DirectorySpecificationStore {
    fn lookup(
        &self,
        message_type: &str,
        version: &str,
        release: &str,
        agency: &str,
    ) -> Result<Option<Arc<MessageStructureDefinition>>> {
        let key = SpecKey::new(message_type, version, release);
        match self.load(&key) {
            Ok(definition) if agency_matches(&definition, agency) => Ok(Some(definition)),
            Ok(_) => Ok(None),
            Err(Error::NotFound(what)) => {
                trace!(%what, "No specification");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_a_miss() {
        let store = DirectorySpecificationStore::new("/nonexistent/specs");
        assert!(store.lookup("DESADV", "D", "01B", "UN").unwrap().is_none());
        assert!(matches!(
            store.load(&SpecKey::new("DESADV", "D", "01B")),
            Err(Error::NotFound(_))
        ));
        assert!(store.cache().is_empty());
    }
}
