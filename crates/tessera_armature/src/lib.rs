//! Armature - The structural parser for Tessera templates.
//!
//! A template arrives as the static strings of a call site. They are joined
//! with a placeholder marker and scanned once; every marker occurrence becomes
//! a [`PartDescriptor`](tessera_relief::PartDescriptor) whose kind is inferred
//! from where the marker sits:
//!
//! | position                         | slot                |
//! |----------------------------------|---------------------|
//! | element content, `<!--marker-->` | child node region   |
//! | `name=marker`                    | attribute           |
//! | `.name=marker`                   | property            |
//! | `@name=marker`                   | event listener      |
//! | content of a raw-text element    | text                |
//!
//! Any other position is rejected.

pub mod parser;
pub mod scanner;

pub use parser::{join_strings, parse_markup, parse_template, Parser};
