use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use edifact_ir::{
    Component, DataElement, InterchangeHeader, InterchangeParts, Position, Scope, Segment,
    SegmentId, SeparatorSet, StructureIssueKind,
};
use edifact_spec::{
    DirectorySpecificationStore, Error, MessageSpecificationStore, annotate,
};
use tempfile::TempDir;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn spec_root() -> PathBuf {
    repo_root().join("testdata/specs")
}

const COMBINED_ORDERS: &str = r#"{
  "messageType": "ORDERS",
  "version": "D",
  "release": "96A",
  "controllingAgency": "UN",
  "messageStructureDefinition": [
    { "content": "UNH", "mandatory": true, "repetition": 1 },
    { "content": "BGM", "mandatory": true, "repetition": 1 },
    { "content": "UNT", "mandatory": true, "repetition": 1 }
  ],
  "segmentTable": { "entries": { "BGM": { "requires": 0, "elements": ["C002", "1004"] } } },
  "elementTable": { "entries": { "1004": { "requires": 0, "components": ["an..35"] } } }
}"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Push segments through an arena so they get real handles.
///
/// Each entry is a tag and its elements written with `+` and `:`.
fn message_segments(raw: &[(&str, &str)]) -> (InterchangeParts, Vec<SegmentId>) {
    let mut parts =
        InterchangeParts::new(SeparatorSet::default(), false, InterchangeHeader::default());
    let message = parts.next_message_id();
    let ids = raw
        .iter()
        .map(|(tag, data)| {
            let elements = if data.is_empty() {
                Vec::new()
            } else {
                data.split('+')
                    .map(|element| {
                        DataElement::from_components(
                            element.split(':').map(Component::from).collect(),
                        )
                    })
                    .collect()
            };
            parts.push_segment(Segment::new(
                *tag,
                elements,
                Position::default(),
                Scope::Message(message),
            ))
        })
        .collect();
    (parts, ids)
}

#[test]
fn loads_converted_layout_from_testdata() -> Result<()> {
    let store = DirectorySpecificationStore::new(spec_root());
    let definition = store
        .lookup("DESADV", "D", "01B", "UN")?
        .expect("DESADV D01B fixture should exist");

    assert_eq!(definition.message_type, "DESADV");
    assert_eq!(definition.release, "01B");
    assert!(definition.segment("NAD").is_some());
    assert_eq!(definition.segment("NAD").unwrap().requires, 1);
    assert_eq!(definition.component_formats("C082")?.len(), 3);
    assert_eq!(definition.max_repetition("CPS"), Some(9999));
    Ok(())
}

#[test]
fn repeated_lookups_share_the_cached_definition() -> Result<()> {
    let store = DirectorySpecificationStore::new(spec_root());
    let first = store.lookup("DESADV", "D", "01B", "UN")?.unwrap();
    let second = store.lookup("desadv", "d", "01b", "")?.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.cache().len(), 1);
    Ok(())
}

#[test]
fn unknown_message_type_is_a_miss() -> Result<()> {
    let store = DirectorySpecificationStore::new(spec_root());
    assert!(store.lookup("IFTSTA", "D", "01B", "UN")?.is_none());
    assert!(store.lookup("DESADV", "D", "96A", "UN")?.is_none());
    assert!(store.cache().is_empty());
    Ok(())
}

#[test]
fn loads_combined_layout() -> Result<()> {
    let dir = TempDir::new()?;
    write(&dir.path().join("d96a/ORDERS.json"), COMBINED_ORDERS);

    let store = DirectorySpecificationStore::new(dir.path());
    let definition = store.lookup("ORDERS", "D", "96A", "UN")?.unwrap();
    assert_eq!(definition.agency.as_deref(), Some("UN"));
    assert_eq!(
        definition.mandatory_segments().collect::<Vec<_>>(),
        vec!["UNH", "BGM", "UNT"]
    );

    // Declared agency must agree
    assert!(store.lookup("ORDERS", "D", "96A", "EAN")?.is_none());
    Ok(())
}

#[test]
fn incomplete_converted_layout_falls_back_to_combined() -> Result<()> {
    let dir = TempDir::new()?;
    write(
        &dir.path().join("d96a/converted/D96A_ORDERS.struct.json"),
        "[]",
    );
    assert!(
        DirectorySpecificationStore::new(dir.path())
            .lookup("ORDERS", "D", "96A", "UN")?
            .is_none()
    );

    write(&dir.path().join("d96a/ORDERS.json"), COMBINED_ORDERS);
    let definition = DirectorySpecificationStore::new(dir.path())
        .lookup("ORDERS", "D", "96A", "UN")?
        .unwrap();
    assert_eq!(definition.structure.len(), 3);
    Ok(())
}

#[test]
fn malformed_file_is_an_error_not_a_miss() -> Result<()> {
    let dir = TempDir::new()?;
    write(&dir.path().join("d96a/ORDERS.json"), "{ not json");

    let store = DirectorySpecificationStore::new(dir.path());
    let err = store.lookup("ORDERS", "D", "96A", "UN").unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));
    assert!(err.to_string().contains("ORDERS.json"));
    Ok(())
}

#[test]
fn keys_with_path_characters_never_leave_the_root() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path().join("specs");
    fs::create_dir_all(root.join("d01b"))?;
    write(&dir.path().join("EVIL.json"), "{ not json");
    write(&dir.path().join("d01b/ORDERS.json"), COMBINED_ORDERS);

    let store = DirectorySpecificationStore::new(&root);
    assert!(store.lookup("../../EVIL", "D", "01B", "UN")?.is_none());
    assert!(store.lookup("ORDERS", "../D", "01B", "UN")?.is_none());
    assert!(store.lookup("ORDERS", "D", "01B/..", "UN")?.is_none());
    assert!(store.cache().is_empty());
    Ok(())
}

#[test]
fn lists_directory_versions() -> Result<()> {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("d01b"))?;
    fs::create_dir_all(dir.path().join("d96a"))?;
    fs::create_dir_all(dir.path().join("notes"))?;
    fs::write(dir.path().join("d00a"), "not a directory")?;

    let store = DirectorySpecificationStore::new(dir.path());
    assert_eq!(
        store.versions()?,
        vec![
            ("D".to_string(), "01B".to_string()),
            ("D".to_string(), "96A".to_string())
        ]
    );
    Ok(())
}

#[test]
fn annotation_of_conformant_message_is_empty() -> Result<()> {
    let store = DirectorySpecificationStore::new(spec_root());
    let definition = store.lookup("DESADV", "D", "01B", "UN")?.unwrap();

    let (parts, ids) = message_segments(&[
        ("UNH", "3819000001+DESADV:D:01B:UN:EAN007"),
        ("BGM", "351+DES587441+9"),
        ("NAD", "SU+5411234512309::9"),
        ("UNT", "4+3819000001"),
    ]);
    let segments = ids.iter().map(|id| (*id, parts.segment(*id).unwrap()));
    let annotation = annotate(&definition, segments);

    assert_eq!(annotation.specification, "DESADV:D:01B");
    assert!(annotation.is_conformant(), "{:?}", annotation.issues);
    Ok(())
}

#[test]
fn annotation_reports_structural_findings() -> Result<()> {
    let store = DirectorySpecificationStore::new(spec_root());
    let definition = store.lookup("DESADV", "D", "01B", "UN")?.unwrap();

    let (parts, ids) = message_segments(&[
        ("UNH", "1+DESADV:D:01B:UN"),
        ("XYZ", "1"),
        ("DTM", ""),
        ("QTY", "12:20+EXTRA"),
        ("UNT", "5+1"),
    ]);
    let segments = ids.iter().map(|id| (*id, parts.segment(*id).unwrap()));
    let annotation = annotate(&definition, segments);

    let kinds: Vec<(&str, StructureIssueKind)> = annotation
        .issues
        .iter()
        .map(|issue| (issue.tag.as_str(), issue.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("XYZ", StructureIssueKind::UndefinedSegment),
            (
                "DTM",
                StructureIssueKind::MissingElements {
                    required: 1,
                    found: 0
                }
            ),
            (
                "QTY",
                StructureIssueKind::ExcessElements {
                    declared: 1,
                    found: 2
                }
            ),
            ("BGM", StructureIssueKind::MissingMandatorySegment),
        ]
    );
    assert_eq!(annotation.issues[0].segment, Some(ids[1]));
    assert_eq!(annotation.issues[3].segment, None);
    Ok(())
}
