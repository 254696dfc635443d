//! Interchange, functional group and message containers
//!
//! All entities of one interchange live in flat vectors owned by the
//! [`Interchange`]. Messages and groups refer to their segments by
//! [`SegmentId`]; segments refer back to their scope by handle only.
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].

use crate::annotation::MessageAnnotation;
use crate::envelope::{GroupHeader, InterchangeHeader, MessageHeader, MessageTypeIdentifier, PartyId};
use crate::node::{Scope, Segment, SegmentId};
use crate::separators::SeparatorSet;
use serde::{Serialize, Serializer};

/// Handle of a message inside its interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub(crate) usize);

impl MessageId {
    /// Position of the message among all messages, in document order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a functional group inside its interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// Position of the group in document order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Direct child of an interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterchangeItem {
    Message(MessageId),
    Group(GroupId),
}

/// A message bounded by UNH and UNT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    /// UNH first, UNT last
    segments: Vec<SegmentId>,
    declared_segment_count: usize,
    scope: Scope,
    annotation: Option<MessageAnnotation>,
}

impl Message {
    /// Assemble a closed message
    pub fn new(
        header: MessageHeader,
        segments: Vec<SegmentId>,
        declared_segment_count: usize,
        scope: Scope,
        annotation: Option<MessageAnnotation>,
    ) -> Self {
        Self {
            header,
            segments,
            declared_segment_count,
            scope,
            annotation,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// Message reference number
    pub fn reference(&self) -> &str {
        &self.header.message_ref
    }

    /// Message type code, e.g. `DESADV`
    pub fn message_type(&self) -> &str {
        &self.header.message_type.message_type
    }

    pub fn identifier(&self) -> &MessageTypeIdentifier {
        &self.header.message_type
    }

    /// Segment handles, UNH through UNT
    pub fn segment_ids(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Number of segments including UNH and UNT
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Count declared by UNT
    pub fn declared_segment_count(&self) -> usize {
        self.declared_segment_count
    }

    /// Enclosing scope: the interchange or a functional group
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Enclosing functional group, if any
    pub fn group_id(&self) -> Option<GroupId> {
        match self.scope {
            Scope::Group(id) => Some(id),
            _ => None,
        }
    }

    /// Structural findings, present when a specification was available
    pub fn annotation(&self) -> Option<&MessageAnnotation> {
        self.annotation.as_ref()
    }
}

/// A functional group bounded by UNG and UNE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalGroup {
    header: GroupHeader,
    messages: Vec<MessageId>,
    declared_message_count: usize,
    header_segment: SegmentId,
    trailer_segment: SegmentId,
}

impl FunctionalGroup {
    /// Assemble a closed group
    pub fn new(
        header: GroupHeader,
        messages: Vec<MessageId>,
        declared_message_count: usize,
        header_segment: SegmentId,
        trailer_segment: SegmentId,
    ) -> Self {
        Self {
            header,
            messages,
            declared_message_count,
            header_segment,
            trailer_segment,
        }
    }

    pub fn header(&self) -> &GroupHeader {
        &self.header
    }

    /// Group reference number
    pub fn reference(&self) -> &str {
        &self.header.group_ref
    }

    pub fn message_ids(&self) -> &[MessageId] {
        &self.messages
    }

    /// Count declared by UNE
    pub fn declared_message_count(&self) -> usize {
        self.declared_message_count
    }

    /// UNG segment handle
    pub fn header_segment(&self) -> SegmentId {
        self.header_segment
    }

    /// UNE segment handle
    pub fn trailer_segment(&self) -> SegmentId {
        self.trailer_segment
    }
}

/// Arena under construction.
///
/// A builder pushes entities in document order and turns the parts into an
/// [`Interchange`] once the trailer has been checked. Handles returned by the
/// `push_*` methods stay valid in the finished interchange.
#[derive(Debug, Clone)]
pub struct InterchangeParts {
    separators: SeparatorSet,
    una_present: bool,
    header: InterchangeHeader,
    segments: Vec<Segment>,
    messages: Vec<Message>,
    groups: Vec<FunctionalGroup>,
    items: Vec<InterchangeItem>,
}

impl InterchangeParts {
    /// Start an interchange from its header values
    pub fn new(separators: SeparatorSet, una_present: bool, header: InterchangeHeader) -> Self {
        Self {
            separators,
            una_present,
            header,
            segments: Vec::new(),
            messages: Vec::new(),
            groups: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn header(&self) -> &InterchangeHeader {
        &self.header
    }

    /// Store a segment, returning its handle
    pub fn push_segment(&mut self, segment: Segment) -> SegmentId {
        self.segments.push(segment);
        SegmentId(self.segments.len() - 1)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    /// Handle the next pushed message will receive
    pub fn next_message_id(&self) -> MessageId {
        MessageId(self.messages.len())
    }

    pub fn push_message(&mut self, message: Message) -> MessageId {
        self.messages.push(message);
        MessageId(self.messages.len() - 1)
    }

    /// Handle the next pushed group will receive
    pub fn next_group_id(&self) -> GroupId {
        GroupId(self.groups.len())
    }

    pub fn push_group(&mut self, group: FunctionalGroup) -> GroupId {
        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    /// Record a direct child of the interchange
    pub fn push_item(&mut self, item: InterchangeItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[InterchangeItem] {
        &self.items
    }

    /// Freeze the parts with the item count declared by UNZ
    pub fn finish(self, declared_item_count: usize) -> Interchange {
        Interchange {
            separators: self.separators,
            una_present: self.una_present,
            header: self.header,
            declared_item_count,
            segments: self.segments,
            messages: self.messages,
            groups: self.groups,
            items: self.items,
        }
    }
}

/// A complete interchange bounded by UNB and UNZ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interchange {
    separators: SeparatorSet,
    una_present: bool,
    header: InterchangeHeader,
    declared_item_count: usize,
    segments: Vec<Segment>,
    messages: Vec<Message>,
    groups: Vec<FunctionalGroup>,
    items: Vec<InterchangeItem>,
}

impl Interchange {
    /// Separators the interchange was read with
    pub fn separators(&self) -> &SeparatorSet {
        &self.separators
    }

    /// Whether the document declared its separators with UNA
    pub fn una_present(&self) -> bool {
        self.una_present
    }

    pub fn header(&self) -> &InterchangeHeader {
        &self.header
    }

    /// Interchange sender (UNB S002)
    pub fn sender(&self) -> &PartyId {
        &self.header.sender
    }

    /// Interchange recipient (UNB S003)
    pub fn receiver(&self) -> &PartyId {
        &self.header.receiver
    }

    /// Date of preparation as written (YYMMDD or CCYYMMDD)
    pub fn date(&self) -> &str {
        &self.header.datetime.date
    }

    /// Time of preparation as written (HHMM)
    pub fn time(&self) -> &str {
        &self.header.datetime.time
    }

    /// Interchange control reference
    pub fn control_reference(&self) -> &str {
        &self.header.control_ref
    }

    /// Date and time of preparation as a calendar value
    ///
    /// # Errors
    ///
    /// Returns a conversion error when UNB carries malformed date or time digits.
    pub fn prepared_at(&self) -> crate::Result<chrono::NaiveDateTime> {
        self.header.datetime.to_naive()
    }

    /// Count of messages or groups declared by UNZ
    pub fn declared_item_count(&self) -> usize {
        self.declared_item_count
    }

    /// Direct children: messages, or functional groups
    pub fn items(&self) -> &[InterchangeItem] {
        &self.items
    }

    /// Every segment in document order, UNB through UNZ
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    /// All messages in document order, including those inside groups
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(id.0)
    }

    /// First message with the given reference number
    pub fn find_message(&self, reference: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.reference() == reference)
    }

    pub fn groups(&self) -> impl Iterator<Item = &FunctionalGroup> {
        self.groups.iter()
    }

    pub fn group(&self, id: GroupId) -> Option<&FunctionalGroup> {
        self.groups.get(id.0)
    }

    /// Messages of one group, in order
    pub fn group_messages<'a>(
        &'a self,
        group: &'a FunctionalGroup,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        group.message_ids().iter().filter_map(|id| self.message(*id))
    }

    /// Segments of one message, UNH through UNT
    pub fn message_segments<'a>(
        &'a self,
        message: &'a Message,
    ) -> impl Iterator<Item = &'a Segment> + 'a {
        message.segment_ids().iter().filter_map(|id| self.segment(*id))
    }

    /// Message a segment belongs to, following its back-reference
    pub fn containing_message(&self, id: SegmentId) -> Option<&Message> {
        self.segment(id)
            .and_then(Segment::message_id)
            .and_then(|message| self.message(message))
    }

    /// 1-based position of a segment inside its message (UNH is 1)
    pub fn position_in_message(&self, id: SegmentId) -> Option<usize> {
        let message = self.containing_message(id)?;
        message
            .segment_ids()
            .iter()
            .position(|candidate| *candidate == id)
            .map(|index| index + 1)
    }

    /// All segments with a tag, in document order
    pub fn find_segments<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.tag() == tag)
    }

    fn message_view<'a>(&'a self, message: &'a Message) -> MessageView<'a> {
        MessageView {
            header: message.header(),
            segments: self.message_segments(message).collect(),
            annotation: message.annotation(),
        }
    }

    fn view(&self) -> InterchangeView<'_> {
        let mut messages = Vec::new();
        let mut groups = Vec::new();
        for item in &self.items {
            match *item {
                InterchangeItem::Message(id) => {
                    if let Some(message) = self.message(id) {
                        messages.push(self.message_view(message));
                    }
                }
                InterchangeItem::Group(id) => {
                    if let Some(group) = self.group(id) {
                        groups.push(GroupView {
                            header: group.header(),
                            messages: self
                                .group_messages(group)
                                .map(|m| self.message_view(m))
                                .collect(),
                        });
                    }
                }
            }
        }

        InterchangeView {
            separators: &self.separators,
            header: &self.header,
            messages,
            groups,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterchangeView<'a> {
    separators: &'a SeparatorSet,
    #[serde(flatten)]
    header: &'a InterchangeHeader,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<MessageView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<GroupView<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupView<'a> {
    #[serde(flatten)]
    header: &'a GroupHeader,
    messages: Vec<MessageView<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageView<'a> {
    #[serde(flatten)]
    header: &'a MessageHeader,
    segments: Vec<&'a Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<&'a MessageAnnotation>,
}

impl Serialize for Interchange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::DateTime;
    use crate::node::DataElement;
    use crate::position::Position;

    fn seg(tag: &str, values: &[&str], scope: Scope) -> Segment {
        Segment::new(
            tag,
            values
                .iter()
                .map(|v| DataElement::Simple((*v).into()))
                .collect(),
            Position::default(),
            scope,
        )
    }

    fn header() -> InterchangeHeader {
        InterchangeHeader {
            sender: PartyId::new("1234567891234").with_qualifier("14"),
            receiver: PartyId::new("4321987654321").with_qualifier("14"),
            datetime: DateTime {
                date: "250725".to_string(),
                time: "1503".to_string(),
            },
            control_ref: "38190".to_string(),
            ..InterchangeHeader::default()
        }
    }

    fn message_header(reference: &str) -> MessageHeader {
        MessageHeader {
            message_ref: reference.to_string(),
            message_type: MessageTypeIdentifier {
                message_type: "DESADV".to_string(),
                version: "D".to_string(),
                release: "01B".to_string(),
                agency: "UN".to_string(),
                association_code: None,
            },
            common_access_ref: None,
        }
    }

    /// UNB, one message of three segments, UNZ
    fn sample() -> (Interchange, Vec<SegmentId>) {
        let mut parts = InterchangeParts::new(SeparatorSet::default(), true, header());
        parts.push_segment(seg("UNB", &["UNOC"], Scope::Interchange));

        let message_id = parts.next_message_id();
        let ids = vec![
            parts.push_segment(seg("UNH", &["1"], Scope::Message(message_id))),
            parts.push_segment(seg("BGM", &["351"], Scope::Message(message_id))),
            parts.push_segment(seg("UNT", &["3", "1"], Scope::Message(message_id))),
        ];
        let message = Message::new(message_header("1"), ids.clone(), 3, Scope::Interchange, None);
        assert_eq!(parts.push_message(message), message_id);
        parts.push_item(InterchangeItem::Message(message_id));

        parts.push_segment(seg("UNZ", &["1", "38190"], Scope::Interchange));
        (parts.finish(1), ids)
    }

    #[test]
    fn test_header_accessors() {
        let (interchange, _) = sample();
        assert_eq!(interchange.sender().id, "1234567891234");
        assert_eq!(interchange.receiver().id, "4321987654321");
        assert_eq!(interchange.date(), "250725");
        assert_eq!(interchange.time(), "1503");
        assert_eq!(interchange.control_reference(), "38190");
        assert_eq!(
            interchange.prepared_at().unwrap().to_string(),
            "2025-07-25 15:03:00"
        );
        assert_eq!(interchange.declared_item_count(), 1);
    }

    #[test]
    fn test_message_navigation() {
        let (interchange, ids) = sample();
        assert_eq!(interchange.message_count(), 1);

        let message = interchange.messages().next().unwrap();
        assert_eq!(message.reference(), "1");
        assert_eq!(message.message_type(), "DESADV");
        assert_eq!(message.segment_count(), 3);
        assert_eq!(message.group_id(), None);

        let tags: Vec<&str> = interchange
            .message_segments(message)
            .map(Segment::tag)
            .collect();
        assert_eq!(tags, vec!["UNH", "BGM", "UNT"]);
        assert!(interchange.find_message("1").is_some());
        assert!(interchange.find_message("2").is_none());

        assert_eq!(interchange.position_in_message(ids[1]), Some(2));
    }

    #[test]
    fn test_back_reference_lookup() {
        let (interchange, ids) = sample();
        let owner = interchange.containing_message(ids[1]).unwrap();
        assert_eq!(owner.reference(), "1");

        // UNB belongs to the interchange itself
        assert!(interchange.containing_message(SegmentId(0)).is_none());
        assert!(interchange.containing_message(SegmentId(99)).is_none());
    }

    #[test]
    fn test_find_segments() {
        let (interchange, _) = sample();
        assert_eq!(interchange.find_segments("BGM").count(), 1);
        assert_eq!(interchange.find_segments("LIN").count(), 0);
        assert_eq!(interchange.segments().len(), 5);
    }

    #[test]
    fn test_serialized_view_is_nested() {
        let (interchange, _) = sample();
        let json = serde_json::to_value(&interchange).unwrap();

        assert_eq!(json["sender"]["id"], "1234567891234");
        assert_eq!(json["datetime"]["date"], "250725");
        assert_eq!(json["controlRef"], "38190");
        assert_eq!(json["separators"]["segment"], "'");
        assert_eq!(json["messages"][0]["messageRef"], "1");
        assert_eq!(json["messages"][0]["messageType"]["messageType"], "DESADV");
        assert_eq!(json["messages"][0]["segments"][1]["tag"], "BGM");
        assert!(json.get("groups").is_none());
    }

    #[test]
    fn test_groups_in_view() {
        let mut parts = InterchangeParts::new(SeparatorSet::default(), false, header());
        parts.push_segment(seg("UNB", &["UNOC"], Scope::Interchange));

        let group_id = parts.next_group_id();
        let ung = parts.push_segment(seg("UNG", &["DESADV"], Scope::Group(group_id)));
        let message_id = parts.next_message_id();
        let ids = vec![
            parts.push_segment(seg("UNH", &["7"], Scope::Message(message_id))),
            parts.push_segment(seg("UNT", &["2", "7"], Scope::Message(message_id))),
        ];
        parts.push_message(Message::new(
            message_header("7"),
            ids,
            2,
            Scope::Group(group_id),
            None,
        ));
        let une = parts.push_segment(seg("UNE", &["1", "G1"], Scope::Group(group_id)));
        let group = FunctionalGroup::new(
            GroupHeader {
                group_id: "DESADV".to_string(),
                group_ref: "G1".to_string(),
                ..GroupHeader::default()
            },
            vec![message_id],
            1,
            ung,
            une,
        );
        assert_eq!(parts.push_group(group), group_id);
        parts.push_item(InterchangeItem::Group(group_id));
        let interchange = parts.finish(1);

        let group = interchange.groups().next().unwrap();
        assert_eq!(group.reference(), "G1");
        assert_eq!(interchange.group_messages(group).count(), 1);
        assert_eq!(
            interchange.message(MessageId(0)).unwrap().group_id(),
            Some(group_id)
        );

        let json = serde_json::to_value(&interchange).unwrap();
        assert!(json.get("messages").is_none());
        assert_eq!(json["groups"][0]["groupRef"], "G1");
        assert_eq!(json["groups"][0]["messages"][0]["messageRef"], "7");
    }
}
