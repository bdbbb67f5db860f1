//! Built-in directives.
//!
//! - [`choice`]: one binding per key, cached while other keys are shown
//! - [`condition`], [`when`], [`unless`]: one of two branches
//! - [`unsafe_html`], [`unsafe_svg`]: raw markup in a child node region

mod choice;
mod condition;
mod unsafe_markup;

pub use choice::{choice, Choice, ChoiceBinding};
pub use condition::{condition, unless, when, Branch, Condition, ConditionBinding, Predicate};
pub use unsafe_markup::{unsafe_html, unsafe_svg, UnsafeMarkup, UnsafeMarkupBinding};
