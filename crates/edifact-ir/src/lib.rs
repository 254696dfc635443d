#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edifact-ir
//!
//! Tree structures for a parsed EDIFACT interchange.
//!
//! An [`Interchange`] owns every functional group, message and segment of one
//! document. Entities live in flat arenas addressed by integer handles
//! ([`SegmentId`], [`MessageId`], [`GroupId`]); a segment's link to its
//! enclosing scope is a plain handle, so the tree has no reference cycles and
//! serializes without them.

/// Structural findings attached to messages by a specification lookup.
pub mod annotation;
/// Interchange, functional group and message containers.
pub mod document;
/// Values extracted from service segments (UNB, UNG, UNH).
pub mod envelope;
/// Segment, data element and component primitives.
pub mod node;
/// Source positions.
pub mod position;
/// Control characters of one interchange.
pub mod separators;
/// Visitor and cursor helpers over an interchange.
pub mod traversal;

pub use annotation::{MessageAnnotation, StructureIssue, StructureIssueKind};
pub use document::{
    FunctionalGroup, GroupId, Interchange, InterchangeItem, InterchangeParts, Message, MessageId,
};
pub use envelope::{
    DateTime, GroupHeader, InterchangeHeader, MessageHeader, MessageTypeIdentifier, PartyId,
    SyntaxIdentifier,
};
pub use node::{Component, DataElement, Scope, Segment, SegmentId};
pub use position::Position;
pub use separators::SeparatorSet;
pub use traversal::{SegmentCursor, Traversal, walk};

use thiserror::Error;

/// Errors that can occur when working with the tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid separators: {reason}")]
    InvalidSeparators { reason: String },

    #[error("Segment not found: {tag}")]
    SegmentNotFound { tag: String },

    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },
}

impl Error {
    /// Build an invalid-separators error.
    pub fn invalid_separators(reason: impl Into<String>) -> Self {
        Self::InvalidSeparators {
            reason: reason.into(),
        }
    }

    /// Build a segment-not-found error for a tag lookup.
    pub fn segment_not_found(tag: impl Into<String>) -> Self {
        Self::SegmentNotFound { tag: tag.into() }
    }

    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
