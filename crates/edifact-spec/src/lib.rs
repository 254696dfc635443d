//! # edifact-spec
//!
//! Message structure definitions and the stores that serve them.
//!
//! A [`MessageSpecificationStore`] answers one question: given a message
//! type, version, release and controlling agency, is there a
//! [`MessageStructureDefinition`]? The parser consults it while building a
//! message and, on a hit, attaches a [`edifact_ir::MessageAnnotation`]
//! produced by [`annotate`]. Stores are read-only once shared.

pub mod annotate;
pub mod key;
pub mod loader;
pub mod model;
pub mod registry;
pub mod store;

pub use annotate::annotate;
pub use key::SpecKey;
pub use loader::DirectorySpecificationStore;
pub use model::{
    ComponentFormat, ElementEntry, FormatKind, MessageStructureDefinition, SegmentEntry,
    SegmentGroupRule,
};
pub use registry::DefinitionCache;
pub use store::{InMemorySpecificationStore, MessageSpecificationStore};

use thiserror::Error;

/// Errors that can occur when loading specifications
#[derive(Error, Debug)]
pub enum Error {
    #[error("Specification not found: {0}")]
    NotFound(String),

    #[error("Invalid specification format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
