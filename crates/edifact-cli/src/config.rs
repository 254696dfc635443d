//! Command settings: YAML config file merged with command-line flags

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use edifact_ir::SeparatorSet;
use serde::Deserialize;
use thiserror::Error;

/// Delimiter string used when a document has no UNA and none is configured
pub const DEFAULT_DELIMITERS: &str = ":+.? '";

/// Configuration problems; reported with their own exit code
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid delimiters: {0}")]
    Delimiters(#[from] edifact_parser::Error),
}

/// How input bytes are turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// UTF-8 text; invalid bytes are an error
    #[default]
    String,
    /// Raw bytes, decoded as UTF-8 with replacement characters
    Binary,
}

impl InputType {
    /// Decode `bytes` read from `source`
    pub fn decode(self, bytes: Vec<u8>, source: &str) -> anyhow::Result<String> {
        match self {
            Self::String => String::from_utf8(bytes)
                .map_err(|e| anyhow::anyhow!("{source} is not valid UTF-8 text: {e}")),
            Self::Binary => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// Contents of a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub spec_dir: Option<PathBuf>,
    pub has_una: Option<bool>,
    pub delimiters: Option<String>,
    pub pretty: Option<bool>,
    pub input_type: Option<InputType>,
}

impl FileConfig {
    /// Load a YAML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is an empty config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Flags given for one `parse` or `normalize` run
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub spec_dir: Option<PathBuf>,
    pub no_una: bool,
    pub delimiters: Option<String>,
    pub pretty: bool,
    pub input_type: Option<InputType>,
}

/// Effective settings after merging flags over the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub spec_dir: Option<PathBuf>,
    /// Separators for documents without UNA; `None` means UNA or defaults
    pub separators: Option<SeparatorSet>,
    pub pretty: bool,
    pub input_type: InputType,
}

impl Settings {
    /// Merge `flags` over `file`. Flags win.
    pub fn resolve(file: FileConfig, flags: FlagOverrides) -> Result<Self, ConfigError> {
        let has_una = if flags.no_una {
            false
        } else {
            file.has_una.unwrap_or(true)
        };
        let delimiters = flags.delimiters.or(file.delimiters);

        let separators = if has_una {
            None
        } else {
            let delimiters = delimiters.as_deref().unwrap_or(DEFAULT_DELIMITERS);
            Some(edifact_parser::SeparatorResolver::supplied(delimiters)?)
        };

        Ok(Self {
            spec_dir: flags.spec_dir.or(file.spec_dir),
            separators,
            pretty: flags.pretty || file.pretty.unwrap_or(false),
            input_type: flags
                .input_type
                .or(file.input_type)
                .unwrap_or_default(),
        })
    }
}
