//! Segment tokenizer
//!
//! Splits document text into raw segments with one left-to-right scan. The
//! only carried state is whether the previous character was the release
//! indicator. Values are unescaped but otherwise left as written; numeric
//! content is never interpreted.

use crate::{Error, Result};
use edifact_ir::{Component, DataElement, Position, SeparatorSet};
use std::iter::Peekable;
use std::str::CharIndices;

/// Maximum tag length; tags are 3 or 4 upper-case letters
const MAX_TAG_LENGTH: usize = 4;
const MIN_TAG_LENGTH: usize = 3;

/// A tokenized segment before it is placed in a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub tag: String,
    pub elements: Vec<DataElement>,
    /// Span from the first tag character through the terminator
    pub position: Position,
}

impl RawSegment {
    /// Element at `index` (0-based, the tag is not counted)
    pub fn element(&self, index: usize) -> Option<&DataElement> {
        self.elements.get(index)
    }
}

/// Tokenizer over one document
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    start: usize,
    separators: SeparatorSet,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize all of `text`
    pub fn new(text: &'a str, separators: SeparatorSet) -> Self {
        Self {
            text,
            start: 0,
            separators,
        }
    }

    /// Begin scanning at byte `offset`, e.g. after a UNA header.
    ///
    /// Positions stay relative to the full text. An offset past the end is
    /// clamped, and one inside a multi-byte character moves back to the
    /// start of that character.
    #[must_use]
    pub fn starting_at(mut self, offset: usize) -> Self {
        let mut start = offset.min(self.text.len());
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        self.start = start;
        self
    }

    pub fn separators(&self) -> &SeparatorSet {
        &self.separators
    }

    /// A fresh pass over the segments; each call starts from the beginning
    pub fn segments(&self) -> Segments<'a> {
        let (line, column) = line_column(&self.text[..self.start]);
        let rest = &self.text[self.start..];
        Segments {
            text: rest,
            chars: rest.char_indices().peekable(),
            separators: self.separators,
            base: self.start,
            line,
            column,
            done: false,
        }
    }
}

impl<'a> IntoIterator for &Tokenizer<'a> {
    type Item = Result<RawSegment>;
    type IntoIter = Segments<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments()
    }
}

/// Line and column just after `prefix`
fn line_column(prefix: &str) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in prefix.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Lazy iterator of raw segments; stops after the first error
pub struct Segments<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    separators: SeparatorSet,
    base: usize,
    line: usize,
    column: usize,
    done: bool,
}

/// Accumulates the elements of the segment being read
#[derive(Default)]
struct SegmentBuffer {
    tag: Option<String>,
    current: String,
    components: Vec<Component>,
    elements: Vec<DataElement>,
}

impl SegmentBuffer {
    fn has_content(&self) -> bool {
        self.tag.is_some() || !self.current.is_empty()
    }

    fn close_component(&mut self) {
        self.components
            .push(Component::new(std::mem::take(&mut self.current)));
    }

    fn close_element(&mut self) {
        self.close_component();
        self.elements.push(DataElement::from_components(std::mem::take(
            &mut self.components,
        )));
    }

    /// Tag as far as it was read
    fn partial_tag(&self) -> String {
        self.tag.clone().unwrap_or_else(|| self.current.clone())
    }
}

impl Segments<'_> {
    fn bump(&mut self) -> Option<(usize, char)> {
        let (index, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some((index, c))
    }

    /// Skip inter-segment whitespace that is not itself a separator
    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() && !self.separators.is_special(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn here(&self, index: usize) -> Position {
        Position::new(self.line, self.column, self.base + index, 0)
    }

    fn syntax(&self, position: Position, message: impl Into<String>) -> Error {
        Error::Syntax {
            position,
            message: message.into(),
        }
    }

    fn read_segment(&mut self) -> Option<Result<RawSegment>> {
        self.skip_whitespace();
        let &(start_index, _) = self.chars.peek()?;
        let start = self.here(start_index);
        let sep = self.separators;
        let mut buffer = SegmentBuffer::default();
        let mut released = false;

        loop {
            let (line, column) = (self.line, self.column);
            let Some((index, c)) = self.bump() else {
                if released || buffer.has_content() {
                    return Some(Err(Error::UnterminatedSegment {
                        tag: buffer.partial_tag(),
                        position: start,
                    }));
                }
                return None;
            };

            if released {
                buffer.current.push(c);
                released = false;
            } else if c == sep.release() {
                if buffer.tag.is_none() {
                    return Some(Err(
                        self.syntax(start, "release indicator inside segment tag")
                    ));
                }
                released = true;
            } else if c == sep.segment() {
                let end = index + c.len_utf8();
                return Some(self.finish(buffer, start, end - start_index));
            } else if c == sep.element() {
                if buffer.tag.is_none() {
                    let tag = std::mem::take(&mut buffer.current);
                    if let Err(e) = self.check_tag(&tag, start) {
                        return Some(Err(e));
                    }
                    buffer.tag = Some(tag);
                } else {
                    buffer.close_element();
                }
            } else if c == sep.component() {
                if buffer.tag.is_none() {
                    return Some(Err(
                        self.syntax(start, "component separator inside segment tag")
                    ));
                }
                buffer.close_component();
            } else if c == '\r' || c == '\n' {
                let position = Position::new(line, column, self.base + index, 1);
                return Some(Err(
                    self.syntax(position, "unescaped line break inside segment")
                ));
            } else {
                buffer.current.push(c);
            }
        }
    }

    fn finish(&self, mut buffer: SegmentBuffer, start: Position, length: usize) -> Result<RawSegment> {
        let tag = match buffer.tag.take() {
            Some(tag) => {
                buffer.close_element();
                tag
            }
            None => {
                let tag = std::mem::take(&mut buffer.current);
                self.check_tag(&tag, start)?;
                tag
            }
        };

        Ok(RawSegment {
            tag,
            elements: buffer.elements,
            position: Position { length, ..start },
        })
    }

    fn check_tag(&self, tag: &str, start: Position) -> Result<()> {
        let valid = (MIN_TAG_LENGTH..=MAX_TAG_LENGTH).contains(&tag.len())
            && tag.bytes().all(|b| b.is_ascii_uppercase());
        if valid {
            Ok(())
        } else {
            let shown: String = self.text[start.offset - self.base..]
                .chars()
                .take(MAX_TAG_LENGTH + 1)
                .collect();
            Err(self.syntax(
                start,
                format!("expected a segment tag of 3 or 4 upper-case letters, found '{shown}'"),
            ))
        }
    }
}

impl Iterator for Segments<'_> {
    type Item = Result<RawSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.read_segment();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}
