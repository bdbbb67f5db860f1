//! Parts: live handles to the dynamic slots of a mounted tree.

use compact_str::CompactString;
use tessera_fresco::{NodeId, Surface};
use tessera_relief::{PartDescriptor, PartKind};

/// Location of one dynamic slot.
///
/// A part never owns the nodes it points at; the mount point that created it
/// decides when they leave the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// A region of nodes placed right before an anchor comment
    ChildNode { anchor: NodeId },
    /// An attribute of an element
    Attribute { node: NodeId, name: CompactString },
    /// A property of an element
    Property { node: NodeId, name: CompactString },
    /// An event listener on an element
    Event { node: NodeId, name: CompactString },
    /// The content of a text node
    Text { node: NodeId },
}

impl Part {
    /// Resolve a descriptor against the node it points at.
    pub fn from_descriptor(descriptor: &PartDescriptor, node: NodeId) -> Self {
        let name = descriptor.name.clone().unwrap_or_default();
        match descriptor.kind {
            PartKind::ChildNode => Part::ChildNode { anchor: node },
            PartKind::Attribute => Part::Attribute { node, name },
            PartKind::Property => Part::Property { node, name },
            PartKind::Event => Part::Event { node, name },
            PartKind::Text => Part::Text { node },
        }
    }

    /// Kind of this part.
    pub fn kind(&self) -> PartKind {
        match self {
            Part::ChildNode { .. } => PartKind::ChildNode,
            Part::Attribute { .. } => PartKind::Attribute,
            Part::Property { .. } => PartKind::Property,
            Part::Event { .. } => PartKind::Event,
            Part::Text { .. } => PartKind::Text,
        }
    }

    /// The anchor or target node.
    pub fn node(&self) -> NodeId {
        match self {
            Part::ChildNode { anchor } => *anchor,
            Part::Attribute { node, .. }
            | Part::Property { node, .. }
            | Part::Event { node, .. }
            | Part::Text { node } => *node,
        }
    }

    /// Attribute, property or event name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Part::Attribute { name, .. } | Part::Property { name, .. } | Part::Event { name, .. } => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Whether this part is a child node region anchored at `node`.
    pub fn is_anchored_at(&self, node: NodeId) -> bool {
        matches!(self, Part::ChildNode { anchor } if *anchor == node)
    }
}

/// Insert `node` right before `anchor`, wherever the anchor currently is.
pub(crate) fn insert_before_anchor(surface: &Surface, node: NodeId, anchor: NodeId) {
    if let Some(parent) = surface.parent(anchor) {
        surface.insert_before(parent, node, Some(anchor));
    }
}
