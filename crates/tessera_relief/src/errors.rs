//! Template parse errors.

use tessera_carton::CompactString;
use thiserror::Error;

/// Errors produced while parsing a template or a markup fragment.
///
/// Offsets are byte offsets into the joined source (static strings
/// interleaved with the placeholder marker).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A placeholder appears where no slot kind can be inferred
    #[error("placeholder at offset {offset} is not in a bindable position ({context})")]
    InvalidMarkerPosition {
        offset: usize,
        context: &'static str,
    },

    /// An attribute value mixes static text with a placeholder
    #[error("attribute `{name}` mixes static text with a placeholder at offset {offset}")]
    PartialAttribute { name: CompactString, offset: usize },

    /// A static string contains the placeholder marker itself
    #[error("static string {index} contains the placeholder marker")]
    MarkerInStatic { index: usize },

    /// The marker is empty or otherwise unusable
    #[error("invalid placeholder marker `{marker}`")]
    InvalidMarker { marker: CompactString },

    /// A closing tag does not match the open element
    #[error("unexpected closing tag `</{tag}>` at offset {offset}")]
    UnexpectedClosingTag { tag: CompactString, offset: usize },

    /// An element is still open at the end of input
    #[error("element `<{tag}>` opened at offset {offset} is never closed")]
    UnclosedElement { tag: CompactString, offset: usize },

    /// The input ends inside a tag, comment or attribute
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A tag or attribute name is malformed
    #[error("invalid name at offset {offset}")]
    InvalidName { offset: usize },

    /// The number of slots found differs from the number of placeholders
    #[error("expected {expected} dynamic slots but found {found}")]
    SlotCountMismatch { expected: usize, found: usize },
}

impl ParseError {
    /// Byte offset the error points at, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::InvalidMarkerPosition { offset, .. }
            | ParseError::PartialAttribute { offset, .. }
            | ParseError::UnexpectedClosingTag { offset, .. }
            | ParseError::UnclosedElement { offset, .. }
            | ParseError::UnexpectedEof { offset }
            | ParseError::InvalidName { offset } => Some(*offset),
            ParseError::MarkerInStatic { .. }
            | ParseError::InvalidMarker { .. }
            | ParseError::SlotCountMismatch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let error = ParseError::PartialAttribute {
            name: "class".into(),
            offset: 12,
        };
        assert_eq!(
            error.to_string(),
            "attribute `class` mixes static text with a placeholder at offset 12"
        );
        assert_eq!(error.offset(), Some(12));
    }

    #[test]
    fn test_offsetless_errors() {
        assert_eq!(ParseError::MarkerInStatic { index: 1 }.offset(), None);
        assert_eq!(
            ParseError::SlotCountMismatch {
                expected: 2,
                found: 1
            }
            .offset(),
            None
        );
    }
}
