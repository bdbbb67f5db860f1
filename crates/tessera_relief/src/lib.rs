//! Relief - The sculptured template surface for Tessera.
//!
//! Relief holds the data model a parsed template is made of: the static
//! skeleton nodes, the descriptors of the dynamic slots cut into it, the
//! options that drive parsing and the errors parsing can produce.

pub mod ast;
pub mod errors;
pub mod options;

pub use ast::*;
pub use errors::*;
pub use options::*;
