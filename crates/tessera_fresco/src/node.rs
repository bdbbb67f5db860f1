//! Surface node definitions.

use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tessera_relief::Namespace;

/// Unique identifier for surface nodes.
pub type NodeId = u64;

/// Identifier of an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name, e.g. `click`
    pub kind: CompactString,
    /// Node the event was dispatched on
    pub target: NodeId,
}

/// Event listener callback.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Value assigned to a node property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(CompactString),
}

/// A node in the surface tree.
#[derive(Debug)]
pub struct Node {
    /// Unique node ID
    pub id: NodeId,
    /// Node type and content
    pub kind: NodeKind,
    /// Parent node, if attached
    pub parent: Option<NodeId>,
    /// Child node IDs
    pub children: SmallVec<[NodeId; 4]>,
}

impl Node {
    /// Create a new detached node.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Get the element data if this node is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Get the mutable element data if this node is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Remove a child.
    pub(crate) fn remove_child(&mut self, child_id: NodeId) {
        if let Some(pos) = self.children.iter().position(|&id| id == child_id) {
            self.children.remove(pos);
        }
    }
}

/// Node type variants.
#[derive(Debug)]
pub enum NodeKind {
    /// Root of the surface
    Document,
    /// Detached container whose children move on insertion
    Fragment,
    /// Element
    Element(ElementData),
    /// Text content
    Text(CompactString),
    /// Comment content
    Comment(CompactString),
}

/// Element content.
#[derive(Default)]
pub struct ElementData {
    /// Tag name
    pub tag: CompactString,
    /// Namespace
    pub ns: Namespace,
    /// Attributes in insertion order
    pub attributes: SmallVec<[(CompactString, CompactString); 4]>,
    /// Assigned properties
    pub properties: FxHashMap<CompactString, PropertyValue>,
    /// Attached listeners in attach order
    pub(crate) listeners: SmallVec<[(ListenerId, CompactString, Listener); 2]>,
}

impl ElementData {
    /// Create an element without attributes.
    pub fn new(tag: impl Into<CompactString>, ns: Namespace) -> Self {
        Self {
            tag: tag.into(),
            ns,
            ..Default::default()
        }
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get a property value.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Number of listeners attached for an event name.
    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(_, name, _)| name == kind)
            .count()
    }
}

impl fmt::Debug for ElementData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementData")
            .field("tag", &self.tag)
            .field("ns", &self.ns)
            .field("attributes", &self.attributes)
            .field("properties", &self.properties)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
