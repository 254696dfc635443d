//! EDIFACT serializer
//!
//! Writes an [`Interchange`] back to EDIFACT text. Content that collides with
//! a service character is re-escaped with the release indicator, so text
//! produced with the separators it was read with matches the source bytes
//! segment for segment.

use std::io::Write;

use edifact_ir::{DataElement, Interchange, SeparatorSet};
use tracing::{debug, trace};

/// Output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializerConfig {
    /// Separators to write with; `None` keeps the interchange's own
    pub separators: Option<SeparatorSet>,
    /// Whether to emit a service string advice; `None` follows the source
    pub una: Option<bool>,
    /// Line break after each segment terminator
    pub segment_newline: bool,
}

/// Serializer for EDIFACT documents
#[derive(Debug, Clone, Default)]
pub struct EdifactSerializer {
    config: SerializerConfig,
}

impl EdifactSerializer {
    /// Create a serializer with `config`
    #[must_use]
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Write with these separators instead of the interchange's
    #[must_use]
    pub fn with_separators(mut self, separators: SeparatorSet) -> Self {
        self.config.separators = Some(separators);
        self
    }

    /// Force the service string advice on or off
    #[must_use]
    pub fn with_una(mut self, una: bool) -> Self {
        self.config.una = Some(una);
        self
    }

    /// Terminate every segment with a line break
    #[must_use]
    pub fn with_segment_newline(mut self, segment_newline: bool) -> Self {
        self.config.segment_newline = segment_newline;
        self
    }

    /// Render the whole interchange, UNB through UNZ
    #[must_use]
    pub fn serialize(&self, interchange: &Interchange) -> String {
        let separators = self
            .config
            .separators
            .unwrap_or(*interchange.separators());

        let mut out = String::new();
        if self.config.una.unwrap_or(interchange.una_present()) {
            out.push_str(&separators.to_una());
            if self.config.segment_newline {
                out.push('\n');
            }
        }

        for segment in interchange.segments() {
            out.push_str(&segment_to_string(
                segment.tag(),
                segment.elements(),
                &separators,
            ));
            if self.config.segment_newline {
                out.push('\n');
            }
        }

        debug!(
            segments = interchange.segments().len(),
            bytes = out.len(),
            "Serialized interchange"
        );
        out
    }

    /// Write the rendered interchange to `writer`
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by `writer`.
    pub fn write<W: Write>(&self, mut writer: W, interchange: &Interchange) -> std::io::Result<()> {
        writer.write_all(self.serialize(interchange).as_bytes())?;
        writer.flush()
    }
}

/// Render one segment, terminator included
#[must_use]
pub fn segment_to_string(tag: &str, elements: &[DataElement], separators: &SeparatorSet) -> String {
    let mut out = String::from(tag);
    for element in elements {
        out.push(separators.element());
        for (index, component) in element.components().iter().enumerate() {
            if index > 0 {
                out.push(separators.component());
            }
            out.push_str(&escape(component.as_str(), separators));
        }
    }
    out.push(separators.segment());
    trace!(segment = %out, "Rendered segment");
    out
}

/// Prefix every service character in `value` with the release indicator
#[must_use]
pub fn escape(value: &str, separators: &SeparatorSet) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if separators.is_special(c) {
            escaped.push(separators.release());
        }
        escaped.push(c);
    }
    escaped
}
