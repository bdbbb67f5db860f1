//! Parser options.

use serde::{Deserialize, Serialize};
use tessera_carton::CompactString;

/// Default placeholder marker joined between static strings.
pub const DEFAULT_MARKER: &str = "{{tessera:4f1c9a}}";

/// Whitespace handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceStrategy {
    /// Drop whitespace-only text containing a newline, collapse runs (default)
    #[default]
    Condense,
    /// Preserve all whitespace
    Preserve,
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Placeholder marker standing in for dynamic values
    pub marker: CompactString,
    /// Whitespace handling
    pub whitespace: WhitespaceStrategy,
    /// Whether static comments are kept in the skeleton
    pub comments: bool,
    /// Whether is a void tag
    pub is_void_tag: fn(&str) -> bool,
    /// Whether a tag holds raw text
    pub is_raw_text_tag: fn(&str) -> bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            marker: CompactString::new(DEFAULT_MARKER),
            whitespace: WhitespaceStrategy::Condense,
            comments: true,
            is_void_tag: tessera_carton::is_void_tag,
            is_raw_text_tag: tessera_carton::is_raw_text_tag,
        }
    }
}

impl ParserOptions {
    /// Use a different placeholder marker.
    pub fn with_marker(mut self, marker: impl Into<CompactString>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Use a different whitespace strategy.
    pub fn with_whitespace(mut self, whitespace: WhitespaceStrategy) -> Self {
        self.whitespace = whitespace;
        self
    }
}
