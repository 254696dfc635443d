//! Lookup keys and directory names

use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static DIRECTORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z])(\d{2}[a-z])$").expect("directory pattern compiles")
});

static KEY_PART_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("key part pattern compiles"));

/// Identity of one message structure definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecKey {
    pub message_type: String,
    pub version: String,
    pub release: String,
}

impl SpecKey {
    /// Build a key, normalizing every part to upper case
    pub fn new(
        message_type: impl AsRef<str>,
        version: impl AsRef<str>,
        release: impl AsRef<str>,
    ) -> Self {
        Self {
            message_type: message_type.as_ref().trim().to_uppercase(),
            version: version.as_ref().trim().to_uppercase(),
            release: release.as_ref().trim().to_uppercase(),
        }
    }

    /// Whether every part is upper-case alphanumeric and so safe to use in
    /// a file name
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        [&self.message_type, &self.version, &self.release]
            .iter()
            .all(|part| KEY_PART_PATTERN.is_match(part))
    }

    /// Directory holding definitions of this version, e.g. `d01b`
    #[must_use]
    pub fn directory(&self) -> String {
        format!("{}{}", self.version, self.release).to_lowercase()
    }

    /// Stem of the converted file names, e.g. `D01B_DESADV`
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}{}_{}", self.version, self.release, self.message_type)
    }
}

impl fmt::Display for SpecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.message_type, self.version, self.release)
    }
}

/// Split a directory name such as `d01b` into version and release (`D`, `01B`).
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] when the name is not a letter followed by
/// two digits and a letter.
pub fn parse_directory(name: &str) -> Result<(String, String)> {
    let captures = DIRECTORY_PATTERN.captures(name).ok_or_else(|| {
        Error::InvalidFormat(format!("'{name}' is not a directory name like 'd01b'"))
    })?;
    Ok((captures[1].to_uppercase(), captures[2].to_uppercase()))
}
