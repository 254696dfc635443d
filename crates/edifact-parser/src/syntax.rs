//! Service string advice (UNA) and separator resolution

use crate::{Error, Result};
use edifact_ir::separators::SERVICE_CHARACTER_COUNT;
use edifact_ir::SeparatorSet;

/// Tag of the service string advice
pub const UNA_TAG: &str = "UNA";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Separators for one document and where its segments start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSeparators {
    pub separators: SeparatorSet,
    /// Whether the document declared its separators with UNA
    pub una_present: bool,
    /// Byte offset of the first segment after any byte-order mark and UNA
    pub content_offset: usize,
}

/// Determines the control characters of a document
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatorResolver;

impl SeparatorResolver {
    /// Resolve separators for `text`.
    ///
    /// A leading `UNA` (after an optional byte-order mark and whitespace)
    /// declares the six service characters positionally and wins over
    /// `supplied`. Without UNA, `supplied` is used verbatim, or the EDIFACT
    /// defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] when fewer than six characters
    /// follow `UNA` or they do not form a valid separator set.
    pub fn resolve(text: &str, supplied: Option<SeparatorSet>) -> Result<ResolvedSeparators> {
        let start = if text.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        let body = text[start..].trim_start();

        let Some(advice) = body.strip_prefix(UNA_TAG) else {
            return Ok(ResolvedSeparators {
                separators: supplied.unwrap_or_default(),
                una_present: false,
                content_offset: start,
            });
        };

        let declared: Vec<(usize, char)> = advice
            .char_indices()
            .take(SERVICE_CHARACTER_COUNT)
            .collect();
        let &[(_, c), (_, e), (_, d), (_, r), (_, s), (last, t)] = declared.as_slice() else {
            return Err(Error::MalformedHeader {
                reason: format!(
                    "UNA must be followed by {SERVICE_CHARACTER_COUNT} service characters, found {}",
                    declared.len()
                ),
            });
        };

        let separators = SeparatorSet::new(c, e, d, r, s, t).map_err(|err| Error::MalformedHeader {
            reason: err.to_string(),
        })?;

        Ok(ResolvedSeparators {
            separators,
            una_present: true,
            content_offset: text.len() - body.len() + UNA_TAG.len() + last + t.len_utf8(),
        })
    }

    /// Build separators from a caller-supplied delimiter string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] unless the string has six characters
    /// (seven with a repetition separator) that form a valid set.
    pub fn supplied(delimiters: &str) -> Result<SeparatorSet> {
        Ok(SeparatorSet::from_delimiters(delimiters)?)
    }
}
