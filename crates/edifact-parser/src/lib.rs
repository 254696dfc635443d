//! # edifact-parser
//!
//! Reads UN/EDIFACT interchanges into an [`edifact_ir::Interchange`] and
//! writes them back.
//!
//! Parsing runs in three stages: [`SeparatorResolver`] determines the
//! control characters (from `UNA` or from the caller), [`Tokenizer`] splits
//! the text into raw segments honoring the release character, and
//! [`InterchangeBuilder`] assembles the tree while checking envelope nesting,
//! control counts and control references. [`EdifactParser`] runs all three.
//!
//! ```
//! let interchange = edifact_parser::parse(
//!     "UNB+UNOC:3+SENDER+RECEIVER+250725:1503+1'UNH+1+DESADV:D:01B:UN'UNT+2+1'UNZ+1+1'",
//!     None,
//! )
//! .unwrap();
//! assert_eq!(interchange.sender().id, "SENDER");
//! ```

pub mod builder;
pub mod envelopes;
pub mod parser;
pub mod serializer;
pub mod syntax;
pub mod tokenizer;

pub use builder::{BuilderState, InterchangeBuilder};
pub use parser::EdifactParser;
pub use serializer::{EdifactSerializer, SerializerConfig};
pub use syntax::{ResolvedSeparators, SeparatorResolver};
pub use tokenizer::{RawSegment, Segments, Tokenizer};

use edifact_ir::{Interchange, Position, SeparatorSet};
use thiserror::Error;

/// Errors that can occur when parsing EDIFACT
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Malformed UNA header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Unterminated segment {tag} starting at {position}")]
    UnterminatedSegment { tag: String, position: Position },

    #[error("Syntax error at {position}: {message}")]
    Syntax { position: Position, message: String },

    #[error("Missing control segment: expected {expected}, found {found}")]
    MissingControlSegment { expected: String, found: String },

    #[error("Nesting error: {0}")]
    Nesting(String),

    #[error("Structure error: {0}")]
    Structure(String),

    #[error(
        "Control count mismatch in {scope} {reference}: declared {declared}, counted {actual}"
    )]
    ControlCount {
        scope: &'static str,
        reference: String,
        declared: usize,
        actual: usize,
    },

    #[error("Control reference mismatch in {trailer}: expected '{expected}', found '{found}'")]
    ControlReference {
        trailer: String,
        expected: String,
        found: String,
    },

    #[error("State error: {0}")]
    State(String),

    #[error("Envelope error in {tag}: {message}")]
    Envelope { tag: String, message: String },

    #[error("Specification store error: {0}")]
    Spec(#[from] edifact_spec::Error),

    #[error("{cause} (at {position}: `{fragment}`)")]
    AtFragment {
        position: Position,
        fragment: String,
        cause: Box<Error>,
    },
}

/// Kind of an [`Error`], independent of any fragment context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    MalformedHeader,
    UnterminatedSegment,
    Syntax,
    MissingControlSegment,
    Nesting,
    Structure,
    ControlCount,
    ControlReference,
    State,
    Envelope,
    Spec,
}

impl Error {
    /// Build an envelope error for a service segment.
    pub fn envelope(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Envelope {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Build a missing-control-segment error.
    pub fn missing_control_segment(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MissingControlSegment {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Attach the offending document fragment.
    #[must_use]
    pub fn at(self, position: Position, fragment: impl Into<String>) -> Self {
        match self {
            already @ Self::AtFragment { .. } => already,
            cause => Self::AtFragment {
                position,
                fragment: fragment.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// The underlying error, without fragment context
    #[must_use]
    pub fn cause(&self) -> &Error {
        match self {
            Self::AtFragment { cause, .. } => cause.cause(),
            other => other,
        }
    }

    /// Kind of the underlying error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.cause() {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            Self::UnterminatedSegment { .. } => ErrorKind::UnterminatedSegment,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::MissingControlSegment { .. } => ErrorKind::MissingControlSegment,
            Self::Nesting(_) => ErrorKind::Nesting,
            Self::Structure(_) => ErrorKind::Structure,
            Self::ControlCount { .. } => ErrorKind::ControlCount,
            Self::ControlReference { .. } => ErrorKind::ControlReference,
            Self::State(_) => ErrorKind::State,
            Self::Envelope { .. } => ErrorKind::Envelope,
            Self::Spec(_) => ErrorKind::Spec,
            Self::AtFragment { cause, .. } => cause.kind(),
        }
    }

    /// Source position, when the error is tied to one
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::AtFragment { position, .. }
            | Self::UnterminatedSegment { position, .. }
            | Self::Syntax { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl From<edifact_ir::Error> for Error {
    fn from(err: edifact_ir::Error) -> Self {
        match err {
            edifact_ir::Error::InvalidSeparators { reason } => Self::Configuration { reason },
            other => Self::Structure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parse a document with optional caller-supplied separators.
///
/// A leading `UNA` takes precedence over `separators`; with neither, the
/// default service characters `:+.? '` apply.
///
/// # Errors
///
/// Returns the first violation found; see [`ErrorKind`] for the categories.
pub fn parse(document: &str, separators: Option<SeparatorSet>) -> Result<Interchange> {
    let parser = match separators {
        Some(separators) => EdifactParser::new().with_separators(separators),
        None => EdifactParser::new(),
    };
    parser.parse(document)
}
