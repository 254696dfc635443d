//! Service segment readers
//!
//! Typed views of the envelope segments: UNB/UNZ (interchange), UNG/UNE
//! (functional group) and UNH/UNT (message). Readers check that mandatory
//! fields are present; nesting and control counts are the builder's job.

use crate::tokenizer::RawSegment;
use crate::{Error, Result};
use edifact_ir::{
    DataElement, DateTime, GroupHeader, InterchangeHeader, MessageHeader, MessageTypeIdentifier,
    PartyId, SyntaxIdentifier,
};

/// Trailer values shared by UNT, UNE and UNZ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// Declared number of segments (UNT), messages (UNE) or items (UNZ)
    pub count: usize,
    /// Reference that must repeat the header's
    pub reference: String,
}

/// Parse UNB into the interchange header values
pub fn parse_unb(segment: &RawSegment) -> Result<InterchangeHeader> {
    expect_tag(segment, "UNB")?;
    require_elements(segment, 5)?;

    let control_ref = required_string(segment, 4, "interchange control reference")?;

    Ok(InterchangeHeader {
        syntax_identifier: parse_syntax_identifier(segment)?,
        sender: parse_party_id(segment, 1, "sender")?,
        receiver: parse_party_id(segment, 2, "recipient")?,
        datetime: parse_datetime(segment, 3)?,
        control_ref,
        // Position 5 is the recipient's reference/password
        application_ref: optional_string(segment, 6),
        priority: optional_string(segment, 7),
        ack_request: optional_string(segment, 8),
        comms_agreement_id: optional_string(segment, 9),
        test_indicator: optional_string(segment, 10),
    })
}

/// Parse UNG into the functional group header values
pub fn parse_ung(segment: &RawSegment) -> Result<GroupHeader> {
    expect_tag(segment, "UNG")?;
    require_elements(segment, 5)?;

    let version = segment.element(6);
    Ok(GroupHeader {
        group_id: required_string(segment, 0, "message group identification")?,
        application_sender: parse_party_id(segment, 1, "application sender")?,
        application_recipient: parse_party_id(segment, 2, "application recipient")?,
        datetime: parse_datetime(segment, 3)?,
        group_ref: required_string(segment, 4, "group reference number")?,
        agency: optional_string(segment, 5),
        message_version: version.and_then(|e| non_empty(e, 0)),
        message_release: version.and_then(|e| non_empty(e, 1)),
    })
}

/// Parse UNH into the message header values
pub fn parse_unh(segment: &RawSegment) -> Result<MessageHeader> {
    expect_tag(segment, "UNH")?;
    require_elements(segment, 2)?;

    let message_ref = required_string(segment, 0, "message reference number")?;
    let identifier = &segment.elements[1];
    let part = |index: usize, field: &str| {
        non_empty(identifier, index).ok_or_else(|| {
            Error::envelope(
                "UNH",
                format!("message identifier has no {field} (S009 component {})", index + 1),
            )
        })
    };

    Ok(MessageHeader {
        message_ref,
        message_type: MessageTypeIdentifier {
            message_type: part(0, "message type")?,
            version: part(1, "version number")?,
            release: part(2, "release number")?,
            agency: part(3, "controlling agency")?,
            association_code: non_empty(identifier, 4),
        },
        common_access_ref: optional_string(segment, 2),
    })
}

/// Parse a trailer (UNT, UNE or UNZ): declared count and reference
pub fn parse_trailer(segment: &RawSegment, tag: &str) -> Result<Trailer> {
    expect_tag(segment, tag)?;
    require_elements(segment, 2)?;

    let raw_count = required_string(segment, 0, "control count")?;
    let count = raw_count.parse::<usize>().map_err(|_| {
        Error::envelope(tag, format!("invalid numeric value for control count: {raw_count}"))
    })?;

    Ok(Trailer {
        count,
        reference: required_string(segment, 1, "reference")?,
    })
}

fn expect_tag(segment: &RawSegment, tag: &str) -> Result<()> {
    if segment.tag == tag {
        Ok(())
    } else {
        Err(Error::envelope(
            tag,
            format!("expected {tag} segment, got {}", segment.tag),
        ))
    }
}

fn require_elements(segment: &RawSegment, minimum: usize) -> Result<()> {
    if segment.elements.len() < minimum {
        return Err(Error::envelope(
            &segment.tag,
            format!(
                "segment must have at least {minimum} elements, got {}",
                segment.elements.len()
            ),
        ));
    }
    Ok(())
}

fn non_empty(element: &DataElement, component: usize) -> Option<String> {
    element
        .component(component)
        .filter(|c| !c.is_empty())
        .map(|c| c.as_str().to_string())
}

fn optional_string(segment: &RawSegment, index: usize) -> Option<String> {
    segment.element(index).and_then(|e| non_empty(e, 0))
}

fn required_string(segment: &RawSegment, index: usize, field: &str) -> Result<String> {
    match segment.element(index) {
        Some(DataElement::Composite(_)) => Err(Error::envelope(
            &segment.tag,
            format!("expected simple value for {field}, got composite"),
        )),
        Some(element) if !element.is_empty() => Ok(element.value().to_string()),
        _ => Err(Error::envelope(&segment.tag, format!("missing {field}"))),
    }
}

fn parse_syntax_identifier(segment: &RawSegment) -> Result<SyntaxIdentifier> {
    let element = &segment.elements[0];
    let identifier = non_empty(element, 0)
        .ok_or_else(|| Error::envelope("UNB", "missing syntax identifier"))?;
    let version = non_empty(element, 1)
        .ok_or_else(|| Error::envelope("UNB", "missing syntax version number"))?;

    Ok(SyntaxIdentifier {
        identifier,
        version,
        service_code_list: non_empty(element, 2),
        encoding: non_empty(element, 3),
    })
}

fn parse_party_id(segment: &RawSegment, index: usize, role: &str) -> Result<PartyId> {
    let element = &segment.elements[index];
    let id = non_empty(element, 0)
        .ok_or_else(|| Error::envelope(&segment.tag, format!("missing {role} identification")))?;

    Ok(PartyId {
        id,
        qualifier: non_empty(element, 1),
        internal_id: non_empty(element, 2),
        internal_qualifier: non_empty(element, 3),
    })
}

fn parse_datetime(segment: &RawSegment, index: usize) -> Result<DateTime> {
    let element = &segment.elements[index];
    let (Some(date), Some(time)) = (non_empty(element, 0), non_empty(element, 1)) else {
        return Err(Error::envelope(
            &segment.tag,
            "date and time of preparation must be date:time",
        ));
    };
    Ok(DateTime { date, time })
}
