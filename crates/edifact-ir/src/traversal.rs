//! Traversal and cursor APIs for navigating an interchange

use crate::document::{FunctionalGroup, Interchange, InterchangeItem, Message};
use crate::node::Segment;
use crate::{Error, Result};

/// Trait for walking an interchange in document order
pub trait Traversal {
    /// Visit a segment
    fn visit_segment(&mut self, segment: &Segment);

    /// Called before the segments of a functional group's messages
    fn enter_group(&mut self, _group: &FunctionalGroup) {}

    /// Called after the last message of a functional group
    fn leave_group(&mut self, _group: &FunctionalGroup) {}

    /// Called before the segments of a message
    fn enter_message(&mut self, _message: &Message) {}

    /// Called after UNT
    fn leave_message(&mut self, _message: &Message) {}

    /// Returns true if traversal should continue
    fn should_continue(&self) -> bool {
        true
    }
}

/// Walk every message of `interchange`, entering groups on the way.
///
/// Service segments of the interchange and its groups are not visited;
/// message envelopes (UNH, UNT) are.
pub fn walk<V: Traversal>(interchange: &Interchange, visitor: &mut V) {
    for item in interchange.items() {
        if !visitor.should_continue() {
            return;
        }
        match *item {
            InterchangeItem::Message(id) => {
                if let Some(message) = interchange.message(id) {
                    walk_message(interchange, message, visitor);
                }
            }
            InterchangeItem::Group(id) => {
                let Some(group) = interchange.group(id) else {
                    continue;
                };
                visitor.enter_group(group);
                for message in interchange.group_messages(group) {
                    if !visitor.should_continue() {
                        return;
                    }
                    walk_message(interchange, message, visitor);
                }
                visitor.leave_group(group);
            }
        }
    }
}

fn walk_message<V: Traversal>(interchange: &Interchange, message: &Message, visitor: &mut V) {
    visitor.enter_message(message);
    for segment in interchange.message_segments(message) {
        if !visitor.should_continue() {
            return;
        }
        visitor.visit_segment(segment);
    }
    visitor.leave_message(message);
}

/// A cursor over the segments of one message
pub struct SegmentCursor<'a> {
    segments: Vec<&'a Segment>,
    index: usize,
}

impl<'a> SegmentCursor<'a> {
    /// Create a cursor positioned at the message's UNH
    pub fn new(interchange: &'a Interchange, message: &'a Message) -> Self {
        Self {
            segments: interchange.message_segments(message).collect(),
            index: 0,
        }
    }

    /// Segment under the cursor
    #[must_use]
    pub fn current(&self) -> Option<&'a Segment> {
        self.segments.get(self.index).copied()
    }

    /// Move forward by one segment
    pub fn advance(&mut self) -> Option<&'a Segment> {
        if self.index < self.segments.len() {
            self.index += 1;
        }
        self.current()
    }

    /// Move to the next segment with `tag`, starting at the current one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SegmentNotFound`] when no such segment follows; the
    /// cursor is left where it was.
    pub fn seek(&mut self, tag: &str) -> Result<&'a Segment> {
        let offset = self.segments[self.index.min(self.segments.len())..]
            .iter()
            .position(|s| s.tag() == tag)
            .ok_or_else(|| Error::segment_not_found(tag))?;
        self.index += offset;
        Ok(self.segments[self.index])
    }

    /// First segment with `tag` anywhere in the message
    ///
    /// # Errors
    ///
    /// Returns [`Error::SegmentNotFound`] when the message has no such segment.
    pub fn find(&self, tag: &str) -> Result<&'a Segment> {
        self.segments
            .iter()
            .copied()
            .find(|s| s.tag() == tag)
            .ok_or_else(|| Error::segment_not_found(tag))
    }

    /// All segments with `tag`, in order
    #[must_use]
    pub fn find_all(&self, tag: &str) -> Vec<&'a Segment> {
        self.segments
            .iter()
            .copied()
            .filter(|s| s.tag() == tag)
            .collect()
    }

    /// Segments from the cursor up to (not including) the next one tagged
    /// `stop`, e.g. the details under one `LIN`
    #[must_use]
    pub fn take_until(&self, stop: &str) -> Vec<&'a Segment> {
        self.segments
            .iter()
            .skip(self.index + 1)
            .copied()
            .take_while(|s| s.tag() != stop)
            .collect()
    }
}
