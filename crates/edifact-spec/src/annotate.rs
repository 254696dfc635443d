//! Structural annotation of a message against its definition

use crate::model::MessageStructureDefinition;
use edifact_ir::{MessageAnnotation, Segment, SegmentId, StructureIssue, StructureIssueKind};
use std::collections::HashSet;
use tracing::debug;

/// Message envelope tags, checked by the parser rather than the tables
const ENVELOPE_TAGS: [&str; 2] = ["UNH", "UNT"];

/// Check a message's segments against `definition`.
///
/// Records tags the segment table does not know, element counts outside
/// `requires..=elements.len()` and mandatory top-level segments that never
/// occur. Content values are not inspected.
pub fn annotate<'a, I>(definition: &MessageStructureDefinition, segments: I) -> MessageAnnotation
where
    I: IntoIterator<Item = (SegmentId, &'a Segment)>,
{
    let mut annotation = MessageAnnotation::new(definition.key().to_string());
    let mut seen = HashSet::new();

    for (id, segment) in segments {
        let tag = segment.tag();
        seen.insert(tag.to_string());

        let Some(entry) = definition.segment(tag) else {
            if !ENVELOPE_TAGS.contains(&tag) {
                annotation.issues.push(StructureIssue {
                    segment: Some(id),
                    tag: tag.to_string(),
                    kind: StructureIssueKind::UndefinedSegment,
                });
            }
            continue;
        };

        let found = segment.elements().len();
        let kind = if found < entry.requires {
            Some(StructureIssueKind::MissingElements {
                required: entry.requires,
                found,
            })
        } else if found > entry.elements.len() {
            Some(StructureIssueKind::ExcessElements {
                declared: entry.elements.len(),
                found,
            })
        } else {
            None
        };
        if let Some(kind) = kind {
            annotation.issues.push(StructureIssue {
                segment: Some(id),
                tag: tag.to_string(),
                kind,
            });
        }
    }

    for tag in definition.mandatory_segments() {
        if !ENVELOPE_TAGS.contains(&tag) && !seen.contains(tag) {
            annotation.issues.push(StructureIssue {
                segment: None,
                tag: tag.to_string(),
                kind: StructureIssueKind::MissingMandatorySegment,
            });
        }
    }

    debug!(
        specification = %annotation.specification,
        issues = annotation.issues.len(),
        "Annotated message"
    );
    annotation
}
