//! Source positions for error reporting
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].

use serde::Serialize;
use std::fmt;

/// Location of a segment in the source document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed, counted in characters)
    pub column: usize,

    /// Byte offset from start of the document
    pub offset: usize,

    /// Length in bytes, including the segment terminator
    pub length: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Byte offset one past the end of the covered span
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
