//! Fresco - The in-memory node surface for Tessera.
//!
//! Fresco provides the live node tree the engine paints onto. It offers the
//! fixed set of primitives a reconciliation engine needs and nothing more:
//!
//! - **Structure**: create elements, text, comments and fragments; insert
//!   before a reference node; remove; query connection to the root
//! - **Attributes and properties**: get, set and remove attributes in
//!   insertion order; assign typed properties
//! - **Events**: attach and detach listeners, dispatch events synchronously
//! - **Markup**: build nodes from a parsed skeleton or a raw markup fragment
//! - **Inspection**: HTML serialization and per-document mutation counters
//!
//! # Example
//!
//! ```
//! use tessera_fresco::Surface;
//!
//! let surface = Surface::new();
//! let root = surface.root();
//! let p = surface.create_element("p");
//! let text = surface.create_text("hello");
//! surface.append_child(p, text);
//! surface.append_child(root, p);
//!
//! assert_eq!(surface.inner_html(root), "<p>hello</p>");
//! ```

mod document;
mod node;
mod serialize;
mod surface;

pub use document::{Document, MutationStats};
pub use node::{
    ElementData, Event, Listener, ListenerId, Node, NodeId, NodeKind, PropertyValue,
};
pub use surface::Surface;
