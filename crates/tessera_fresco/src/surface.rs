//! Shared surface handle.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use compact_str::CompactString;
use smallvec::SmallVec;
use tessera_armature::parse_markup;
use tessera_relief::{Namespace, ParseError, ParserOptions, SkeletonNode};

use crate::document::{Document, MutationStats};
use crate::node::{Event, Listener, ListenerId, NodeId, NodeKind, PropertyValue};
use crate::serialize;

/// Cheaply clonable handle to a shared [`Document`].
///
/// Every method borrows the document only for its own duration, so listeners
/// invoked by [`Surface::dispatch`] may mutate the tree.
#[derive(Clone, Default)]
pub struct Surface {
    doc: Rc<RefCell<Document>>,
}

impl Surface {
    /// Create a surface over an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the underlying document.
    pub fn document(&self) -> Ref<'_, Document> {
        self.doc.borrow()
    }

    /// Get the root node ID.
    pub fn root(&self) -> NodeId {
        self.doc.borrow().root()
    }

    /// Whether two handles share a document.
    pub fn ptr_eq(&self, other: &Surface) -> bool {
        Rc::ptr_eq(&self.doc, &other.doc)
    }

    /// Create a detached HTML element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    /// Create a detached element in a namespace.
    pub fn create_element_ns(&self, tag: &str, ns: Namespace) -> NodeId {
        self.doc.borrow_mut().create_element(tag, ns)
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> NodeId {
        self.doc
            .borrow_mut()
            .create(NodeKind::Text(CompactString::new(text)))
    }

    /// Create a detached comment node.
    pub fn create_comment(&self, text: &str) -> NodeId {
        self.doc
            .borrow_mut()
            .create(NodeKind::Comment(CompactString::new(text)))
    }

    /// Create an empty fragment.
    pub fn create_fragment(&self) -> NodeId {
        self.doc.borrow_mut().create(NodeKind::Fragment)
    }

    /// Insert `node` under `parent` before `reference`, or last without one.
    pub fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.doc.borrow_mut().insert_before(parent, node, reference);
    }

    /// Append `node` as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, node: NodeId) {
        self.doc.borrow_mut().append_child(parent, node);
    }

    /// Remove a node from its parent.
    pub fn remove(&self, node: NodeId) {
        self.doc.borrow_mut().remove(node);
    }

    /// Remove and release a subtree.
    pub fn destroy(&self, node: NodeId) {
        self.doc.borrow_mut().destroy(node);
    }

    /// Parent of a node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.borrow().get(node).and_then(|n| n.parent)
    }

    /// Children of a node.
    pub fn children(&self, node: NodeId) -> SmallVec<[NodeId; 4]> {
        self.doc
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Resolve a child-index path starting below `node`.
    pub fn child_at_path(&self, node: NodeId, path: &[u32]) -> Option<NodeId> {
        self.doc.borrow().child_at_path(node, path)
    }

    /// Whether the node is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.doc.borrow().is_connected(node)
    }

    /// Whether the node is still alive.
    pub fn contains(&self, node: NodeId) -> bool {
        self.doc.borrow().get(node).is_some()
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<CompactString> {
        self.doc
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .and_then(|element| element.attribute(name))
            .map(CompactString::new)
    }

    /// Set an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.doc.borrow_mut().set_attribute(node, name, value);
    }

    /// Remove an attribute.
    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.doc.borrow_mut().remove_attribute(node, name);
    }

    /// Get a property value.
    pub fn get_property(&self, node: NodeId, name: &str) -> Option<PropertyValue> {
        self.doc
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .and_then(|element| element.property(name).cloned())
    }

    /// Assign a property.
    pub fn set_property(&self, node: NodeId, name: &str, value: PropertyValue) {
        self.doc.borrow_mut().set_property(node, name, value);
    }

    /// Text or comment content of a node.
    pub fn text(&self, node: NodeId) -> Option<CompactString> {
        match self.doc.borrow().get(node).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Replace the content of a text or comment node.
    pub fn set_text(&self, node: NodeId, text: &str) {
        self.doc.borrow_mut().set_text(node, text);
    }

    /// Attach a listener.
    pub fn add_listener(&self, node: NodeId, kind: &str, listener: Listener) -> Option<ListenerId> {
        self.doc.borrow_mut().add_listener(node, kind, listener)
    }

    /// Detach a listener.
    pub fn remove_listener(&self, node: NodeId, listener: ListenerId) {
        self.doc.borrow_mut().remove_listener(node, listener);
    }

    /// Number of listeners attached to a node for an event name.
    pub fn listener_count(&self, node: NodeId, kind: &str) -> usize {
        self.doc
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .map_or(0, |element| element.listener_count(kind))
    }

    /// Invoke the listeners of a node for an event name.
    ///
    /// Returns the number of listeners called.
    pub fn dispatch(&self, node: NodeId, kind: &str) -> usize {
        let listeners = self.doc.borrow().listeners(node, kind);
        let event = Event {
            kind: CompactString::new(kind),
            target: node,
        };
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }

    /// Build skeleton nodes under `parent`.
    pub fn instantiate(&self, parent: NodeId, skeleton: &[SkeletonNode]) -> SmallVec<[NodeId; 4]> {
        self.doc.borrow_mut().instantiate(parent, skeleton)
    }

    /// Parse markup into a new fragment.
    pub fn parse_fragment(
        &self,
        markup: &str,
        ns: Namespace,
        options: &ParserOptions,
    ) -> Result<NodeId, ParseError> {
        let skeleton = parse_markup(markup, ns, options)?;
        let fragment = self.create_fragment();
        self.instantiate(fragment, &skeleton);
        Ok(fragment)
    }

    /// Serialize a node and its subtree.
    pub fn to_html(&self, node: NodeId) -> String {
        serialize::to_html(&self.doc.borrow(), node)
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, node: NodeId) -> String {
        serialize::inner_html(&self.doc.borrow(), node)
    }

    /// Mutation counters.
    pub fn stats(&self) -> MutationStats {
        self.doc.borrow().stats()
    }

    /// Reset the mutation counters.
    pub fn reset_stats(&self) {
        self.doc.borrow_mut().reset_stats();
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("nodes", &self.doc.borrow().node_count())
            .finish()
    }
}
