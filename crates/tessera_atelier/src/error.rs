//! Render errors.

use tessera_relief::{ParseError, PartKind};
use thiserror::Error;

/// Contract violations surfaced while rendering.
///
/// None of these are recovered by the engine; they propagate to the caller of
/// the render, mount or patch operation that hit them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A template or raw markup failed to parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A template received a different number of values than it has parts
    #[error("template expects {expected} values but got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    /// A directive was used in a part it does not support
    #[error("`{directive}` cannot be used in a {part} part")]
    UnsupportedPart {
        directive: &'static str,
        part: PartKind,
    },

    /// A value cannot be written into a part
    #[error("a {value} value cannot be bound to a {part} part")]
    UnsupportedValue { part: PartKind, value: &'static str },

    /// A hook changed kind between two renders of a block
    #[error("hook {index} changed kind between renders")]
    HookMismatch { index: usize },

    /// A part descriptor does not resolve to a node of the mounted tree
    #[error("part {index} does not resolve to a node")]
    MissingNode { index: usize },
}

/// Result alias for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
