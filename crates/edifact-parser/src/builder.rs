//! Interchange assembly
//!
//! [`InterchangeBuilder`] consumes raw segments in document order and tracks
//! which envelope is open. Every trailer is checked against its header
//! before the container it closes is stored, so a failed check never leaves
//! a partial message or group behind.

use std::fmt;
use std::sync::Arc;

use crate::envelopes::{self, Trailer};
use crate::tokenizer::RawSegment;
use crate::{Error, Result};
use edifact_ir::{
    FunctionalGroup, GroupHeader, GroupId, Interchange, InterchangeItem, InterchangeParts,
    Message, MessageHeader, MessageId, Scope, Segment, SegmentId, SeparatorSet,
};
use edifact_spec::{MessageSpecificationStore, MessageStructureDefinition};
use tracing::{debug, trace};

/// Where the builder is inside the envelope hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing read yet; only UNB is accepted
    ExpectingInterchangeHeader,
    /// Between messages or groups
    InInterchange,
    /// Inside UNG, outside any message
    InFunctionalGroup,
    /// Between UNH and UNT
    InMessage,
    /// UNZ has been read
    Closed,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExpectingInterchangeHeader => "expecting interchange header",
            Self::InInterchange => "in interchange",
            Self::InFunctionalGroup => "in functional group",
            Self::InMessage => "in message",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

struct OpenGroup {
    id: GroupId,
    header: GroupHeader,
    header_segment: SegmentId,
    messages: Vec<MessageId>,
}

struct OpenMessage {
    id: MessageId,
    header: MessageHeader,
    scope: Scope,
    segments: Vec<SegmentId>,
    definition: Option<Arc<MessageStructureDefinition>>,
}

/// State machine turning raw segments into an [`Interchange`]
pub struct InterchangeBuilder {
    separators: SeparatorSet,
    una_present: bool,
    store: Option<Arc<dyn MessageSpecificationStore>>,
    parts: Option<InterchangeParts>,
    group: Option<OpenGroup>,
    message: Option<OpenMessage>,
    closed: Option<Interchange>,
}

impl fmt::Debug for InterchangeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterchangeBuilder")
            .field("separators", &self.separators)
            .field("una_present", &self.una_present)
            .field("has_store", &self.store.is_some())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl InterchangeBuilder {
    /// Create a builder for a document read with `separators`
    #[must_use]
    pub fn new(separators: SeparatorSet, una_present: bool) -> Self {
        Self {
            separators,
            una_present,
            store: None,
            parts: None,
            group: None,
            message: None,
            closed: None,
        }
    }

    /// Annotate messages with definitions found in `store`
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageSpecificationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> BuilderState {
        if self.closed.is_some() {
            BuilderState::Closed
        } else if self.message.is_some() {
            BuilderState::InMessage
        } else if self.group.is_some() {
            BuilderState::InFunctionalGroup
        } else if self.parts.is_some() {
            BuilderState::InInterchange
        } else {
            BuilderState::ExpectingInterchangeHeader
        }
    }

    /// Feed the next segment.
    ///
    /// # Errors
    ///
    /// Returns the first nesting, structure, control count, control
    /// reference or state violation the segment causes.
    pub fn push(&mut self, segment: RawSegment) -> Result<()> {
        trace!(tag = %segment.tag, state = %self.state(), "segment");

        if self.closed.is_some() {
            return Err(Error::State(format!(
                "{} after interchange trailer UNZ",
                segment.tag
            )));
        }

        match segment.tag.as_str() {
            "UNB" => self.open_interchange(segment),
            "UNZ" => self.close_interchange(segment),
            "UNG" => self.open_group(segment),
            "UNE" => self.close_group(segment),
            "UNH" => self.open_message(segment),
            "UNT" => self.close_message(segment),
            _ => self.append(segment),
        }
    }

    /// Return the finished interchange.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingControlSegment`] naming the trailer (or UNB)
    /// that never arrived.
    pub fn finish(self) -> Result<Interchange> {
        if let Some(interchange) = self.closed {
            return Ok(interchange);
        }
        let expected = match self.state() {
            BuilderState::InMessage => "UNT",
            BuilderState::InFunctionalGroup => "UNE",
            BuilderState::InInterchange => "UNZ",
            _ => "UNB",
        };
        Err(Error::missing_control_segment(expected, "end of input"))
    }

    fn parts_mut(&mut self) -> Result<&mut InterchangeParts> {
        self.parts
            .as_mut()
            .ok_or_else(|| Error::State("no interchange is open".to_string()))
    }

    fn store_segment(parts: &mut InterchangeParts, raw: RawSegment, scope: Scope) -> SegmentId {
        parts.push_segment(Segment::new(raw.tag, raw.elements, raw.position, scope))
    }

    fn open_interchange(&mut self, segment: RawSegment) -> Result<()> {
        if self.parts.is_some() {
            return Err(Error::Nesting(
                "UNB inside an open interchange".to_string(),
            ));
        }
        let header = envelopes::parse_unb(&segment)?;
        debug!(
            control_ref = %header.control_ref,
            sender = %header.sender.id,
            receiver = %header.receiver.id,
            "interchange opened"
        );

        let mut parts = InterchangeParts::new(self.separators, self.una_present, header);
        Self::store_segment(&mut parts, segment, Scope::Interchange);
        self.parts = Some(parts);
        Ok(())
    }

    fn close_interchange(&mut self, segment: RawSegment) -> Result<()> {
        match self.state() {
            BuilderState::ExpectingInterchangeHeader => {
                return Err(Error::missing_control_segment("UNB", segment.tag));
            }
            BuilderState::InMessage | BuilderState::InFunctionalGroup => {
                return Err(Error::Nesting(format!(
                    "UNZ while {} is still open",
                    self.open_scope_name()
                )));
            }
            BuilderState::InInterchange | BuilderState::Closed => {}
        }

        let Trailer { count, reference } = envelopes::parse_trailer(&segment, "UNZ")?;
        let mut parts = self
            .parts
            .take()
            .ok_or_else(|| Error::State("no interchange is open".to_string()))?;

        let control_ref = parts.header().control_ref.clone();
        if reference != control_ref {
            return Err(Error::ControlReference {
                trailer: "UNZ".to_string(),
                expected: control_ref,
                found: reference,
            });
        }
        let actual = parts.items().len();
        if count != actual {
            return Err(Error::ControlCount {
                scope: "interchange",
                reference: control_ref,
                declared: count,
                actual,
            });
        }

        Self::store_segment(&mut parts, segment, Scope::Interchange);
        debug!(control_ref = %control_ref, items = actual, "interchange closed");
        self.closed = Some(parts.finish(count));
        Ok(())
    }

    fn open_group(&mut self, segment: RawSegment) -> Result<()> {
        match self.state() {
            BuilderState::ExpectingInterchangeHeader => {
                return Err(Error::missing_control_segment("UNB", segment.tag));
            }
            BuilderState::InFunctionalGroup | BuilderState::InMessage => {
                return Err(Error::Nesting(format!(
                    "UNG inside {}",
                    self.open_scope_name()
                )));
            }
            BuilderState::InInterchange | BuilderState::Closed => {}
        }

        let parts = self.parts_mut()?;
        if parts
            .items()
            .iter()
            .any(|item| matches!(item, InterchangeItem::Message(_)))
        {
            return Err(Error::Nesting(
                "functional group after interchange-level messages".to_string(),
            ));
        }

        let header = envelopes::parse_ung(&segment)?;
        let id = parts.next_group_id();
        let header_segment = Self::store_segment(parts, segment, Scope::Group(id));
        debug!(group_ref = %header.group_ref, group_id = %header.group_id, "group opened");

        self.group = Some(OpenGroup {
            id,
            header,
            header_segment,
            messages: Vec::new(),
        });
        Ok(())
    }

    fn close_group(&mut self, segment: RawSegment) -> Result<()> {
        match self.state() {
            BuilderState::ExpectingInterchangeHeader => {
                return Err(Error::missing_control_segment("UNB", segment.tag));
            }
            BuilderState::InMessage => {
                return Err(Error::Nesting(format!(
                    "UNE while {} is still open",
                    self.open_scope_name()
                )));
            }
            BuilderState::InInterchange => {
                return Err(Error::Structure(
                    "UNE without an open functional group".to_string(),
                ));
            }
            BuilderState::InFunctionalGroup | BuilderState::Closed => {}
        }

        let trailer = envelopes::parse_trailer(&segment, "UNE")?;
        let Some(group) = self.group.take() else {
            return Err(Error::State("no functional group is open".to_string()));
        };

        if trailer.reference != group.header.group_ref {
            return Err(Error::ControlReference {
                trailer: "UNE".to_string(),
                expected: group.header.group_ref,
                found: trailer.reference,
            });
        }
        if trailer.count != group.messages.len() {
            return Err(Error::ControlCount {
                scope: "functional group",
                reference: group.header.group_ref,
                declared: trailer.count,
                actual: group.messages.len(),
            });
        }

        let parts = self.parts_mut()?;
        let trailer_segment = Self::store_segment(parts, segment, Scope::Group(group.id));
        debug!(
            group_ref = %group.header.group_ref,
            messages = group.messages.len(),
            "group closed"
        );
        let id = parts.push_group(FunctionalGroup::new(
            group.header,
            group.messages,
            trailer.count,
            group.header_segment,
            trailer_segment,
        ));
        parts.push_item(InterchangeItem::Group(id));
        Ok(())
    }

    fn open_message(&mut self, segment: RawSegment) -> Result<()> {
        let scope = match self.state() {
            BuilderState::ExpectingInterchangeHeader => {
                return Err(Error::missing_control_segment("UNB", segment.tag));
            }
            BuilderState::InMessage => {
                return Err(Error::Nesting(format!(
                    "UNH inside {}",
                    self.open_scope_name()
                )));
            }
            BuilderState::InFunctionalGroup => match &self.group {
                Some(group) => Scope::Group(group.id),
                None => Scope::Interchange,
            },
            BuilderState::InInterchange | BuilderState::Closed => Scope::Interchange,
        };

        let parts = self.parts_mut()?;
        if scope == Scope::Interchange
            && parts
                .items()
                .iter()
                .any(|item| matches!(item, InterchangeItem::Group(_)))
        {
            return Err(Error::Nesting(
                "interchange-level message after functional groups".to_string(),
            ));
        }

        let header = envelopes::parse_unh(&segment)?;
        let id = parts.next_message_id();
        let unh = Self::store_segment(parts, segment, Scope::Message(id));

        let definition = match &self.store {
            Some(store) => {
                let identifier = &header.message_type;
                store.lookup(
                    &identifier.message_type,
                    &identifier.version,
                    &identifier.release,
                    &identifier.agency,
                )?
            }
            None => None,
        };
        debug!(
            message_ref = %header.message_ref,
            message_type = %header.message_type.message_type,
            annotated = definition.is_some(),
            "message opened"
        );

        self.message = Some(OpenMessage {
            id,
            header,
            scope,
            segments: vec![unh],
            definition,
        });
        Ok(())
    }

    fn close_message(&mut self, segment: RawSegment) -> Result<()> {
        match self.state() {
            BuilderState::ExpectingInterchangeHeader => {
                return Err(Error::missing_control_segment("UNB", segment.tag));
            }
            BuilderState::InInterchange | BuilderState::InFunctionalGroup => {
                return Err(Error::Structure(
                    "UNT without an open message".to_string(),
                ));
            }
            BuilderState::InMessage | BuilderState::Closed => {}
        }

        let trailer = envelopes::parse_trailer(&segment, "UNT")?;
        let Some(mut message) = self.message.take() else {
            return Err(Error::State("no message is open".to_string()));
        };

        if trailer.reference != message.header.message_ref {
            return Err(Error::ControlReference {
                trailer: "UNT".to_string(),
                expected: message.header.message_ref,
                found: trailer.reference,
            });
        }
        let actual = message.segments.len() + 1;
        if trailer.count != actual {
            return Err(Error::ControlCount {
                scope: "message",
                reference: message.header.message_ref,
                declared: trailer.count,
                actual,
            });
        }

        let parts = self
            .parts
            .as_mut()
            .ok_or_else(|| Error::State("no interchange is open".to_string()))?;
        let unt = Self::store_segment(parts, segment, Scope::Message(message.id));
        message.segments.push(unt);

        let annotation = message.definition.as_ref().map(|definition| {
            let segments = message
                .segments
                .iter()
                .filter_map(|id| parts.segment(*id).map(|segment| (*id, segment)));
            edifact_spec::annotate(definition, segments)
        });

        debug!(
            message_ref = %message.header.message_ref,
            segments = actual,
            "message closed"
        );
        let id = parts.push_message(Message::new(
            message.header,
            message.segments,
            trailer.count,
            message.scope,
            annotation,
        ));
        debug_assert_eq!(id, message.id);

        match &mut self.group {
            Some(group) => group.messages.push(id),
            None => parts.push_item(InterchangeItem::Message(id)),
        }
        Ok(())
    }

    fn append(&mut self, segment: RawSegment) -> Result<()> {
        let state = self.state();
        let Some(message) = self.message.as_mut() else {
            return Err(match state {
                BuilderState::ExpectingInterchangeHeader => {
                    Error::missing_control_segment("UNB", segment.tag)
                }
                _ => Error::Structure(format!(
                    "segment {} outside of any message ({state})",
                    segment.tag
                )),
            });
        };
        let parts = self
            .parts
            .as_mut()
            .ok_or_else(|| Error::State("no interchange is open".to_string()))?;
        let id = Self::store_segment(parts, segment, Scope::Message(message.id));
        trace!(segment = id.index(), message = message.id.index(), "appended");
        message.segments.push(id);
        Ok(())
    }

    fn open_scope_name(&self) -> String {
        if let Some(message) = &self.message {
            format!("message {}", message.header.message_ref)
        } else if let Some(group) = &self.group {
            format!("functional group {}", group.header.group_ref)
        } else {
            "interchange".to_string()
        }
    }
}
