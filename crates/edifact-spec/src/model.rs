//! Message structure definition model
//!
//! The shapes follow the JSON written by the UN/EDIFACT directory tooling:
//! an ordered structure of segment and segment-group rules, a segment table
//! (`tag -> {requires, elements}`) and an element table
//! (`id -> {requires, components}`) whose components are format strings
//! such as `an..35`.

use crate::key::SpecKey;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static FORMAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(an|a|n)(\.\.)?(\d+)$").expect("format pattern compiles"));

/// One entry of the message structure: a segment or a segment group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentGroupRule {
    /// Segment tag, or group name such as `SG10`
    pub content: String,
    pub mandatory: bool,
    /// Maximum number of occurrences
    pub repetition: usize,
    /// Message section (header, detail, summary), when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Nested rules of a segment group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<SegmentGroupRule>,
}

impl SegmentGroupRule {
    /// Whether the rule is a segment group rather than a single segment
    #[must_use]
    pub fn is_group(&self) -> bool {
        !self.data.is_empty() || self.content.starts_with("SG")
    }

    /// Tag that opens this rule: the segment itself, or a group's trigger
    #[must_use]
    pub fn trigger(&self) -> Option<&str> {
        if self.is_group() {
            self.data.first().and_then(SegmentGroupRule::trigger)
        } else {
            Some(&self.content)
        }
    }
}

/// Element composition of a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    /// Number of leading elements that must be present
    pub requires: usize,
    /// Element identifiers in positional order
    pub elements: Vec<String>,
}

/// Component composition of a data element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementEntry {
    /// Number of leading components that must be present
    pub requires: usize,
    /// Component format strings in positional order
    pub components: Vec<String>,
}

/// Character class of a component format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Alphabetic,
    Numeric,
    Alphanumeric,
}

/// A parsed component format such as `an..35` or `n3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentFormat {
    pub kind: FormatKind,
    /// Maximum (or, when fixed, exact) length
    pub length: usize,
    /// `..` was present: any length up to `length`
    pub variable: bool,
}

impl ComponentFormat {
    /// Parse a format string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for anything other than `a`, `n` or
    /// `an`, an optional `..`, and a length.
    pub fn parse(format: &str) -> Result<Self> {
        let captures = FORMAT_PATTERN
            .captures(format.trim())
            .ok_or_else(|| Error::InvalidFormat(format!("unknown component format '{format}'")))?;
        let kind = match &captures[1] {
            "a" => FormatKind::Alphabetic,
            "n" => FormatKind::Numeric,
            _ => FormatKind::Alphanumeric,
        };
        let length = captures[3]
            .parse()
            .map_err(|_| Error::InvalidFormat(format!("length out of range in '{format}'")))?;
        Ok(Self {
            kind,
            length,
            variable: captures.get(2).is_some(),
        })
    }

    /// Whether `value` fits this format.
    ///
    /// Numeric lengths do not count the decimal sign or a leading minus.
    #[must_use]
    pub fn accepts(&self, value: &str, decimal_sign: char) -> bool {
        let significant: Vec<char> = match self.kind {
            FormatKind::Numeric => value
                .chars()
                .filter(|c| *c != decimal_sign && *c != '-')
                .collect(),
            _ => value.chars().collect(),
        };
        let length_ok = if self.variable {
            significant.len() <= self.length
        } else {
            significant.len() == self.length
        };
        let chars_ok = match self.kind {
            FormatKind::Numeric => significant.iter().all(char::is_ascii_digit),
            FormatKind::Alphabetic => significant.iter().all(|c| !c.is_ascii_digit()),
            FormatKind::Alphanumeric => true,
        };
        length_ok && chars_ok
    }
}

/// Structural metadata of one message type in one directory version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStructureDefinition {
    pub message_type: String,
    pub version: String,
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    /// Segment and group rules in message order
    pub structure: Vec<SegmentGroupRule>,
    pub segments: BTreeMap<String, SegmentEntry>,
    pub elements: BTreeMap<String, ElementEntry>,
}

impl MessageStructureDefinition {
    /// Lookup key of this definition
    #[must_use]
    pub fn key(&self) -> SpecKey {
        SpecKey::new(&self.message_type, &self.version, &self.release)
    }

    /// Segment table entry for a tag
    #[must_use]
    pub fn segment(&self, tag: &str) -> Option<&SegmentEntry> {
        self.segments.get(tag)
    }

    /// Element table entry for an element id
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&ElementEntry> {
        self.elements.get(id)
    }

    /// Parsed component formats of an element
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown elements and
    /// [`Error::InvalidFormat`] for unreadable format strings.
    pub fn component_formats(&self, id: &str) -> Result<Vec<ComponentFormat>> {
        let entry = self
            .element(id)
            .ok_or_else(|| Error::NotFound(format!("element {id} in {}", self.key())))?;
        entry
            .components
            .iter()
            .map(|format| ComponentFormat::parse(format))
            .collect()
    }

    /// Segments the message must carry at top level, in order
    pub fn mandatory_segments(&self) -> impl Iterator<Item = &str> {
        self.structure
            .iter()
            .filter(|rule| rule.mandatory && !rule.is_group())
            .map(|rule| rule.content.as_str())
    }

    /// Maximum repetition of a top-level segment or group trigger
    #[must_use]
    pub fn max_repetition(&self, tag: &str) -> Option<usize> {
        self.structure
            .iter()
            .find(|rule| rule.trigger() == Some(tag))
            .map(|rule| rule.repetition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(content: &str, mandatory: bool, repetition: usize) -> SegmentGroupRule {
        SegmentGroupRule {
            content: content.to_string(),
            mandatory,
            repetition,
            section: None,
            data: Vec::new(),
        }
    }

    fn definition() -> MessageStructureDefinition {
        let mut group = rule("SG2", false, 99);
        group.data = vec![rule("NAD", true, 1), rule("LOC", false, 10)];

        let mut elements = BTreeMap::new();
        elements.insert(
            "C082".to_string(),
            ElementEntry {
                requires: 1,
                components: vec!["an..35".into(), "an..3".into(), "an..3".into()],
            },
        );
        elements.insert(
            "C999".to_string(),
            ElementEntry {
                requires: 0,
                components: vec!["x4".into()],
            },
        );

        MessageStructureDefinition {
            message_type: "DESADV".to_string(),
            version: "D".to_string(),
            release: "01B".to_string(),
            agency: Some("UN".to_string()),
            structure: vec![
                rule("UNH", true, 1),
                rule("BGM", true, 1),
                rule("DTM", false, 10),
                group,
                rule("UNT", true, 1),
            ],
            segments: BTreeMap::new(),
            elements,
        }
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(
            ComponentFormat::parse("an..35").unwrap(),
            ComponentFormat {
                kind: FormatKind::Alphanumeric,
                length: 35,
                variable: true
            }
        );
        assert_eq!(
            ComponentFormat::parse("n3").unwrap(),
            ComponentFormat {
                kind: FormatKind::Numeric,
                length: 3,
                variable: false
            }
        );
        assert_eq!(ComponentFormat::parse("a..3").unwrap().kind, FormatKind::Alphabetic);
        assert!(ComponentFormat::parse("x4").is_err());
        assert!(ComponentFormat::parse("an..").is_err());
    }

    #[test]
    fn test_format_accepts() {
        let qty = ComponentFormat::parse("n..15").unwrap();
        assert!(qty.accepts("263.2", '.'));
        assert!(qty.accepts("263,2", ','));
        assert!(!qty.accepts("26A", '.'));

        let code = ComponentFormat::parse("n3").unwrap();
        assert!(code.accepts("351", '.'));
        assert!(!code.accepts("35", '.'));

        let text = ComponentFormat::parse("an..3").unwrap();
        assert!(text.accepts("SU", '.'));
        assert!(!text.accepts("SUPP", '.'));
    }

    #[test]
    fn test_structure_queries() {
        let def = definition();
        assert_eq!(
            def.mandatory_segments().collect::<Vec<_>>(),
            vec!["UNH", "BGM", "UNT"]
        );
        assert_eq!(def.max_repetition("DTM"), Some(10));
        assert_eq!(def.max_repetition("NAD"), Some(99));
        assert_eq!(def.max_repetition("LIN"), None);
    }

    #[test]
    fn test_component_formats() {
        let def = definition();
        assert_eq!(def.component_formats("C082").unwrap().len(), 3);
        assert!(matches!(def.component_formats("C506"), Err(Error::NotFound(_))));
        assert!(matches!(
            def.component_formats("C999"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rule_deserializes_without_optional_fields() {
        let rule: SegmentGroupRule =
            serde_json::from_str(r#"{"content":"BGM","mandatory":true,"repetition":1}"#).unwrap();
        assert!(!rule.is_group());
        assert_eq!(rule.trigger(), Some("BGM"));
    }
}
