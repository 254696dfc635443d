//! Values carried by service segments
//!
//! These are the typed views of UNB (interchange header), UNG (functional
//! group header) and UNH (message header). Trailers only carry a count and a
//! reference, which the builder checks and the containers keep.
#![allow(clippy::must_use_candidate)]

use serde::Serialize;

/// Syntax identifier for the interchange (UNB S001)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxIdentifier {
    /// Syntax identifier (e.g., "UNOA", "UNOB", "UNOC")
    pub identifier: String,
    /// Syntax version number (e.g., "1", "2", "3", "4")
    pub version: String,
    /// Service code list directory version (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_code_list: Option<String>,
    /// Character encoding (optional, Coded character set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Default for SyntaxIdentifier {
    fn default() -> Self {
        Self {
            identifier: "UNOA".to_string(),
            version: "3".to_string(),
            service_code_list: None,
            encoding: None,
        }
    }
}

/// Party identifier (sender or receiver)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyId {
    /// Party identification (e.g., a GLN such as "1234567891234")
    pub id: String,
    /// Code qualifier (e.g., "14" for GS1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Internal identification (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Internal qualifier (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_qualifier: Option<String>,
}

impl PartyId {
    /// Party with an id and no qualifiers
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Attach a code qualifier
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// Date and time of preparation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DateTime {
    /// Date in YYMMDD or CCYYMMDD format
    pub date: String,
    /// Time in HHMM format
    pub time: String,
}

impl DateTime {
    /// Combine date and time into a calendar value.
    ///
    /// Six-digit dates are read with a two-digit year (`chrono`'s `%y`
    /// pivot); eight-digit dates carry the century.
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the fields are not valid digits.
    pub fn to_naive(&self) -> crate::Result<chrono::NaiveDateTime> {
        let date_format = match self.date.len() {
            6 => "%y%m%d",
            8 => "%Y%m%d",
            _ => {
                return Err(crate::Error::conversion(
                    "preparation date",
                    format!("unsupported date '{}'", self.date),
                ));
            }
        };
        let date = chrono::NaiveDate::parse_from_str(&self.date, date_format)
            .map_err(|e| crate::Error::conversion("preparation date", e.to_string()))?;
        let time = chrono::NaiveTime::parse_from_str(&self.time, "%H%M")
            .map_err(|e| crate::Error::conversion("preparation time", e.to_string()))?;
        Ok(date.and_time(time))
    }
}

/// UNB - Interchange Header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeHeader {
    /// Syntax identifier
    pub syntax_identifier: SyntaxIdentifier,
    /// Sender identification
    pub sender: PartyId,
    /// Receiver identification
    pub receiver: PartyId,
    /// Date and time of preparation
    pub datetime: DateTime,
    /// Interchange control reference
    pub control_ref: String,
    /// Application reference (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_ref: Option<String>,
    /// Processing priority code (optional, e.g., "A" for highest priority)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Acknowledgement request (optional, "1" = request)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_request: Option<String>,
    /// Communications agreement ID (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comms_agreement_id: Option<String>,
    /// Test indicator (optional, "1" = test)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_indicator: Option<String>,
}

/// Message type identifier (UNH S009)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTypeIdentifier {
    /// Message type (e.g., "ORDERS", "DESADV", "INVOIC")
    pub message_type: String,
    /// Message version number (e.g., "D")
    pub version: String,
    /// Message release number (e.g., "96A", "01B")
    pub release: String,
    /// Controlling agency (e.g., "UN")
    pub agency: String,
    /// Association assigned code (e.g., "EAN007")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_code: Option<String>,
}

impl MessageTypeIdentifier {
    /// Directory name of the message version, e.g. `d01b`
    pub fn directory(&self) -> String {
        format!("{}{}", self.version, self.release).to_lowercase()
    }
}

/// UNH - Message Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// Message reference number
    pub message_ref: String,
    /// Message type identifier
    pub message_type: MessageTypeIdentifier,
    /// Common access reference (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_access_ref: Option<String>,
}

/// UNG - Functional Group Header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHeader {
    /// Message group identification (e.g., "INVOIC")
    pub group_id: String,
    /// Application sender identification
    pub application_sender: PartyId,
    /// Application recipient identification
    pub application_recipient: PartyId,
    /// Date and time of preparation
    pub datetime: DateTime,
    /// Group reference number
    pub group_ref: String,
    /// Controlling agency (optional in syntax version 4)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    /// Message version number (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_version: Option<String>,
    /// Message release number (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_release: Option<String>,
}
