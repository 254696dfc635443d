//! EDIFACT control characters
//!
//! A [`SeparatorSet`] is the service string advice of one interchange: the
//! characters that delimit components, data elements and segments, the
//! release (escape) character, the declared decimal sign and the reserved
//! position. It is validated on construction and immutable afterwards.
#![allow(clippy::must_use_candidate)]

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Default EDIFACT separators (when no UNA is present)
pub const DEFAULT_COMPONENT_SEPARATOR: char = ':';
pub const DEFAULT_ELEMENT_SEPARATOR: char = '+';
pub const DEFAULT_DECIMAL_SIGN: char = '.';
pub const DEFAULT_RELEASE_INDICATOR: char = '?';
pub const DEFAULT_RESERVED_SPACE: char = ' ';
pub const DEFAULT_SEGMENT_TERMINATOR: char = '\'';

/// Decimal signs a document may declare
pub const DECIMAL_SIGNS: [char; 2] = ['.', ','];

/// Number of service characters in the classic service string advice
pub const SERVICE_CHARACTER_COUNT: usize = 6;

/// Control characters used to read and write one interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeparatorSet {
    component: char,
    element: char,
    decimal: char,
    release: char,
    reserved: char,
    segment: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition: Option<char>,
}

impl Default for SeparatorSet {
    fn default() -> Self {
        Self {
            component: DEFAULT_COMPONENT_SEPARATOR,
            element: DEFAULT_ELEMENT_SEPARATOR,
            decimal: DEFAULT_DECIMAL_SIGN,
            release: DEFAULT_RELEASE_INDICATOR,
            reserved: DEFAULT_RESERVED_SPACE,
            segment: DEFAULT_SEGMENT_TERMINATOR,
            repetition: None,
        }
    }
}

impl SeparatorSet {
    /// Build a separator set from the six positional service characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeparators`] when two characters coincide or
    /// the decimal sign is neither `.` nor `,`.
    pub fn new(
        component: char,
        element: char,
        decimal: char,
        release: char,
        reserved: char,
        segment: char,
    ) -> Result<Self> {
        let set = Self {
            component,
            element,
            decimal,
            release,
            reserved,
            segment,
            repetition: None,
        };
        set.validate()?;
        Ok(set)
    }

    /// Enable repetition support with the given separator.
    ///
    /// The character is recorded and kept distinct from the other service
    /// characters. Elements are not split on it, so inside data it is an
    /// ordinary character and is never released.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeparators`] when the repetition separator
    /// collides with another service character.
    pub fn with_repetition(mut self, repetition: char) -> Result<Self> {
        self.repetition = Some(repetition);
        self.validate()?;
        Ok(self)
    }

    /// Parse a delimiter string in service string advice order.
    ///
    /// Six characters are component, element, decimal, release, reserved and
    /// terminator; an optional seventh is the repetition separator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeparators`] for a wrong length or an invalid set.
    pub fn from_delimiters(delimiters: &str) -> Result<Self> {
        let chars: Vec<char> = delimiters.chars().collect();
        match chars.as_slice() {
            [c, e, d, r, s, t] => Self::new(*c, *e, *d, *r, *s, *t),
            [c, e, d, r, s, t, rep] => Self::new(*c, *e, *d, *r, *s, *t)?.with_repetition(*rep),
            _ => Err(Error::invalid_separators(format!(
                "expected exactly {SERVICE_CHARACTER_COUNT} delimiter characters (or {} with a repetition separator), got {}",
                SERVICE_CHARACTER_COUNT + 1,
                chars.len()
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if !DECIMAL_SIGNS.contains(&self.decimal) {
            return Err(Error::invalid_separators(format!(
                "decimal sign must be '.' or ',', got {:?}",
                self.decimal
            )));
        }

        let chars = self.service_characters();
        for (i, a) in chars.iter().enumerate() {
            if let Some(b) = chars[i + 1..].iter().find(|b| b.1 == a.1) {
                return Err(Error::invalid_separators(format!(
                    "{} and {} are both {:?}",
                    a.0, b.0, a.1
                )));
            }
        }
        Ok(())
    }

    fn service_characters(&self) -> Vec<(&'static str, char)> {
        let mut chars = vec![
            ("component separator", self.component),
            ("element separator", self.element),
            ("decimal sign", self.decimal),
            ("release indicator", self.release),
            ("reserved space", self.reserved),
            ("segment terminator", self.segment),
        ];
        if let Some(repetition) = self.repetition {
            chars.push(("repetition separator", repetition));
        }
        chars
    }

    /// Component data element separator
    pub fn component(&self) -> char {
        self.component
    }

    /// Data element separator
    pub fn element(&self) -> char {
        self.element
    }

    /// Declared decimal sign
    pub fn decimal(&self) -> char {
        self.decimal
    }

    /// Release indicator (escape character)
    pub fn release(&self) -> char {
        self.release
    }

    /// Reserved position of the service string advice
    pub fn reserved(&self) -> char {
        self.reserved
    }

    /// Segment terminator
    pub fn segment(&self) -> char {
        self.segment
    }

    /// Repetition separator, when enabled
    pub fn repetition(&self) -> Option<char> {
        self.repetition
    }

    /// Check if a character must be released inside data
    pub fn is_special(&self, c: char) -> bool {
        c == self.component || c == self.element || c == self.segment || c == self.release
    }

    /// Render the service string advice segment (`UNA:+.? '`)
    pub fn to_una(&self) -> String {
        let mut una = String::with_capacity(9);
        una.push_str("UNA");
        una.push(self.component);
        una.push(self.element);
        una.push(self.decimal);
        una.push(self.release);
        una.push(self.reserved);
        una.push(self.segment);
        una
    }
}

impl fmt::Display for SeparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, c) in self.service_characters() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_separators() {
        let sep = SeparatorSet::default();
        assert_eq!(sep.component(), ':');
        assert_eq!(sep.element(), '+');
        assert_eq!(sep.decimal(), '.');
        assert_eq!(sep.release(), '?');
        assert_eq!(sep.reserved(), ' ');
        assert_eq!(sep.segment(), '\'');
        assert_eq!(sep.repetition(), None);
    }

    #[test]
    fn test_from_delimiters_matches_default() {
        let sep = SeparatorSet::from_delimiters(":+.? '").unwrap();
        assert_eq!(sep, SeparatorSet::default());
    }

    #[test]
    fn test_from_delimiters_with_repetition() {
        let sep = SeparatorSet::from_delimiters(":+.? '*").unwrap();
        assert_eq!(sep.repetition(), Some('*'));
        assert!(!sep.is_special('*'));
    }

    #[test]
    fn test_from_delimiters_wrong_length() {
        let err = SeparatorSet::from_delimiters(":+.?'").unwrap_err();
        assert!(err.to_string().contains("exactly 6"));

        assert!(SeparatorSet::from_delimiters(":+.? '*!").is_err());
        assert!(SeparatorSet::from_delimiters("").is_err());
    }

    #[test]
    fn test_duplicate_characters_rejected() {
        let err = SeparatorSet::new(':', ':', '.', '?', ' ', '\'').unwrap_err();
        assert!(matches!(err, Error::InvalidSeparators { .. }));
        assert!(err.to_string().contains("component separator"));
        assert!(err.to_string().contains("element separator"));

        let err = SeparatorSet::default().with_repetition('+').unwrap_err();
        assert!(err.to_string().contains("repetition separator"));
    }

    #[test]
    fn test_decimal_sign_restricted() {
        assert!(SeparatorSet::new(':', '+', ',', '?', ' ', '\'').is_ok());
        assert!(SeparatorSet::new(':', '+', '_', '?', ' ', '\'').is_err());
    }

    #[test]
    fn test_multibyte_delimiters_count_characters() {
        let sep = SeparatorSet::from_delimiters("§+.? ¦").unwrap();
        assert_eq!(sep.component(), '§');
        assert_eq!(sep.segment(), '¦');
    }

    #[test]
    fn test_is_special() {
        let sep = SeparatorSet::default();
        assert!(sep.is_special(':'));
        assert!(sep.is_special('+'));
        assert!(sep.is_special('?'));
        assert!(sep.is_special('\''));
        assert!(!sep.is_special('.'));
        assert!(!sep.is_special(' '));
        assert!(!sep.is_special('A'));
    }

    #[test]
    fn test_to_una_and_display() {
        let sep = SeparatorSet::default();
        assert_eq!(sep.to_una(), "UNA:+.? '");
        assert_eq!(sep.to_string(), ":+.? '");

        let custom = SeparatorSet::new('*', '=', ',', '#', ' ', '~').unwrap();
        assert_eq!(custom.to_una(), "UNA*=,# ~");
    }
}
