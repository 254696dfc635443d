//! Segment, data element and component types
#![allow(clippy::must_use_candidate)]

use crate::document::{GroupId, MessageId};
use crate::position::Position;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Handle of a segment inside its interchange's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SegmentId(pub(crate) usize);

impl SegmentId {
    /// Position of the segment in document order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Scope a segment was read in.
///
/// This is a relation, not ownership: it names the enclosing message or
/// group by handle and is never followed when serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Interchange service segments (UNB, UNZ)
    Interchange,
    /// Group service segments (UNG, UNE)
    Group(GroupId),
    /// Message content, including UNH and UNT
    Message(MessageId),
}

/// The smallest scalar unit of a segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Component(String);

impl Component {
    /// Create a component from an already unescaped value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The component value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the slot is blank
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the component, returning its value
    pub fn into_string(self) -> String {
        self.0
    }

    /// Interpret the value as a decimal number written with `decimal_sign`.
    ///
    /// Returns `None` for blank or non-numeric values.
    pub fn decimal_value(&self, decimal_sign: char) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let normalized: Cow<'_, str> = if decimal_sign == '.' {
            Cow::Borrowed(&self.0)
        } else {
            Cow::Owned(self.0.replace(decimal_sign, "."))
        };
        normalized.parse().ok()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Component {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Component {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for Component {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Component {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A data element (simple or composite)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DataElement {
    /// Simple element (single value)
    Simple(Component),
    /// Composite element (multiple components)
    Composite(Vec<Component>),
}

impl DataElement {
    /// Build an element from its components; a single component is simple.
    pub fn from_components(mut components: Vec<Component>) -> Self {
        match components.len() {
            0 => Self::Simple(Component::default()),
            1 => Self::Simple(components.remove(0)),
            _ => Self::Composite(components),
        }
    }

    /// All components in positional order
    pub fn components(&self) -> &[Component] {
        match self {
            Self::Simple(component) => std::slice::from_ref(component),
            Self::Composite(components) => components,
        }
    }

    /// Component at `index`, if present
    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components().get(index)
    }

    /// First component value (the whole value of a simple element)
    pub fn value(&self) -> &str {
        self.components().first().map_or("", Component::as_str)
    }

    /// Whether the element has more than one component
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Whether every component is blank
    pub fn is_empty(&self) -> bool {
        self.components().iter().all(Component::is_empty)
    }
}

/// A tagged segment with its data elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Segment tag (e.g. `UNB`, `NAD`, `LIN`)
    tag: String,
    /// Data elements in positional order
    elements: Vec<DataElement>,
    #[serde(skip)]
    position: Position,
    #[serde(skip)]
    scope: Scope,
}

impl Segment {
    /// Create a new segment
    pub fn new(
        tag: impl Into<String>,
        elements: Vec<DataElement>,
        position: Position,
        scope: Scope,
    ) -> Self {
        Self {
            tag: tag.into(),
            elements,
            position,
            scope,
        }
    }

    /// Segment tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Data elements in positional order
    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    /// Element at `index` (0-based, the tag is not counted)
    pub fn element(&self, index: usize) -> Option<&DataElement> {
        self.elements.get(index)
    }

    /// First component of the element at `index`
    pub fn value(&self, index: usize) -> Option<&str> {
        self.element(index).map(DataElement::value)
    }

    /// Component `component` of element `element`
    pub fn component(&self, element: usize, component: usize) -> Option<&str> {
        self.element(element)
            .and_then(|e| e.component(component))
            .map(Component::as_str)
    }

    /// Where the segment was read
    pub fn position(&self) -> Position {
        self.position
    }

    /// Enclosing scope (non-owning)
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Containing message, when the segment belongs to one
    pub fn message_id(&self) -> Option<MessageId> {
        match self.scope {
            Scope::Message(id) => Some(id),
            _ => None,
        }
    }
}
