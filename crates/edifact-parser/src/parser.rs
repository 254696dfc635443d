//! Parser facade
//!
//! [`EdifactParser`] resolves separators, tokenizes and builds in one call.
//! Failures from the lower stages are wrapped with the segment text they
//! were raised on, keeping the underlying error as the cause.

use std::fmt;
use std::sync::Arc;

use crate::builder::InterchangeBuilder;
use crate::syntax::SeparatorResolver;
use crate::tokenizer::Tokenizer;
use crate::Result;
use edifact_ir::{Interchange, Position, SeparatorSet};
use edifact_spec::MessageSpecificationStore;
use tracing::debug;

const MAX_FRAGMENT_CHARS: usize = 80;

/// EDIFACT interchange parser
#[derive(Clone, Default)]
pub struct EdifactParser {
    separators: Option<SeparatorSet>,
    store: Option<Arc<dyn MessageSpecificationStore>>,
}

impl fmt::Debug for EdifactParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdifactParser")
            .field("separators", &self.separators)
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl EdifactParser {
    /// Create a parser using UNA or the default service characters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Separators for documents without a UNA segment
    #[must_use]
    pub fn with_separators(mut self, separators: SeparatorSet) -> Self {
        self.separators = Some(separators);
        self
    }

    /// Separators from a delimiter string such as `:+.? '`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) when the string is not a valid set.
    pub fn with_delimiters(self, delimiters: &str) -> Result<Self> {
        Ok(self.with_separators(SeparatorResolver::supplied(delimiters)?))
    }

    /// Annotate messages from `store`
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageSpecificationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Parse one interchange.
    ///
    /// # Errors
    ///
    /// Returns the first violation. Errors raised on a particular segment
    /// carry its position and text; see [`Error::kind`](crate::Error::kind) for the category.
    pub fn parse(&self, document: &str) -> Result<Interchange> {
        let resolved = SeparatorResolver::resolve(document, self.separators)?;
        debug!(
            separators = %resolved.separators,
            una = resolved.una_present,
            "Resolved separators"
        );

        let tokenizer =
            Tokenizer::new(document, resolved.separators).starting_at(resolved.content_offset);
        let mut builder = InterchangeBuilder::new(resolved.separators, resolved.una_present);
        if let Some(store) = &self.store {
            builder = builder.with_store(Arc::clone(store));
        }

        for segment in &tokenizer {
            let segment = segment?;
            let position = segment.position;
            builder
                .push(segment)
                .map_err(|err| err.at(position, fragment(document, position)))?;
        }

        let interchange = builder.finish()?;
        debug!(
            control_ref = %interchange.control_reference(),
            messages = interchange.message_count(),
            "Parsed interchange"
        );
        Ok(interchange)
    }
}

/// Source text of a segment, shortened for error messages
fn fragment(document: &str, position: Position) -> String {
    let text = document
        .get(position.offset..position.end())
        .unwrap_or_default()
        .trim();
    if text.chars().count() <= MAX_FRAGMENT_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_FRAGMENT_CHARS).collect();
    short.push_str("...");
    short
}
