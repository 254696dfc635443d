//! Structural annotations produced from a message specification

use crate::node::SegmentId;
use serde::Serialize;

/// Result of checking a message against its structure definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAnnotation {
    /// Definition the message was checked against, e.g. `DESADV:D:01B`
    pub specification: String,
    /// Findings in document order
    pub issues: Vec<StructureIssue>,
}

impl MessageAnnotation {
    /// Annotation without findings
    #[must_use]
    pub fn new(specification: impl Into<String>) -> Self {
        Self {
            specification: specification.into(),
            issues: Vec::new(),
        }
    }

    /// Whether no findings were recorded
    #[must_use]
    pub fn is_conformant(&self) -> bool {
        self.issues.is_empty()
    }
}

/// One structural finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureIssue {
    /// Offending segment, absent for segments that are missing altogether
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentId>,
    /// Tag concerned
    pub tag: String,
    /// What was found
    pub kind: StructureIssueKind,
}

/// Kinds of structural findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructureIssueKind {
    /// Tag is not in the segment table
    UndefinedSegment,
    /// Fewer elements than the segment requires
    MissingElements { required: usize, found: usize },
    /// More elements than the segment declares
    ExcessElements { declared: usize, found: usize },
    /// A mandatory top-level segment does not occur
    MissingMandatorySegment,
}
