//! Node arena management.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tessera_relief::{Namespace, SkeletonNode};

use crate::node::{ElementData, Listener, ListenerId, Node, NodeId, NodeKind, PropertyValue};

/// Counters for every mutation applied to a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MutationStats {
    /// Nodes created
    pub created: usize,
    /// Nodes inserted under a parent
    pub inserted: usize,
    /// Nodes removed from a parent
    pub removed: usize,
    /// Attribute writes and removals
    pub attributes: usize,
    /// Property assignments
    pub properties: usize,
    /// Text and comment content writes
    pub texts: usize,
    /// Listeners attached
    pub listeners_added: usize,
    /// Listeners detached
    pub listeners_removed: usize,
}

impl MutationStats {
    /// Total number of tree mutations, creation excluded.
    pub fn mutations(&self) -> usize {
        self.inserted
            + self.removed
            + self.attributes
            + self.properties
            + self.texts
            + self.listeners_added
            + self.listeners_removed
    }
}

/// A tree of surface nodes.
///
/// Operations on unknown node ids are ignored.
pub struct Document {
    /// All nodes by ID
    nodes: FxHashMap<NodeId, Node>,
    /// Root node ID
    root: NodeId,
    /// Next available node ID
    next_id: NodeId,
    /// Next available listener ID
    next_listener: u64,
    /// Mutation counters
    stats: MutationStats,
}

impl Document {
    /// Create a document holding only its root node.
    pub fn new() -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(0, Node::new(0, NodeKind::Document));
        Self {
            nodes,
            root: 0,
            next_id: 1,
            next_listener: 0,
            stats: MutationStats::default(),
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get node count, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Mutation counters.
    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Reset the mutation counters.
    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind));
        self.stats.created += 1;
        id
    }

    /// Insert `node` under `parent` before `reference`, or last without one.
    ///
    /// The node is detached from its current parent first. Inserting a
    /// fragment moves its children instead and leaves it empty.
    pub fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let Some(inserted) = self.nodes.get(&node) else {
            return;
        };
        if matches!(inserted.kind, NodeKind::Fragment) {
            let children = inserted.children.clone();
            for child in children {
                self.insert_before(parent, child, reference);
            }
            return;
        }

        if !self.nodes.contains_key(&parent)
            || reference == Some(node)
            || self.is_inclusive_ancestor(node, parent)
        {
            return;
        }

        self.detach(node);

        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let index = reference
            .and_then(|r| parent_node.children.iter().position(|&id| id == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, node);
        if let Some(child) = self.nodes.get_mut(&node) {
            child.parent = Some(parent);
        }
        self.stats.inserted += 1;
    }

    /// Append `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        self.insert_before(parent, node, None);
    }

    /// Remove a node from its parent. The node stays alive.
    pub fn remove(&mut self, node: NodeId) {
        if self.detach(node) {
            self.stats.removed += 1;
        }
    }

    /// Remove a node and drop it together with all its descendants.
    pub fn destroy(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.remove(node);
        for id in self.collect_descendants(node) {
            self.nodes.remove(&id);
        }
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.remove_child(node);
        }
        true
    }

    /// Collect a node and all its descendants.
    fn collect_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = vec![id];
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                for &child_id in &node.children {
                    result.push(child_id);
                    stack.push(child_id);
                }
            }
        }

        result
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Whether the node is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node) && self.is_inclusive_ancestor(self.root, node)
    }

    /// Resolve a child-index path starting below `node`.
    pub fn child_at_path(&self, node: NodeId, path: &[u32]) -> Option<NodeId> {
        let mut current = node;
        for &index in path {
            current = *self.nodes.get(&current)?.children.get(index as usize)?;
        }
        Some(current)
    }

    /// Set an attribute, keeping the position of an existing one.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.nodes.get_mut(&node).and_then(Node::as_element_mut) else {
            return;
        };
        match element.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = CompactString::new(value),
            None => element
                .attributes
                .push((CompactString::new(name), CompactString::new(value))),
        }
        self.stats.attributes += 1;
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let Some(element) = self.nodes.get_mut(&node).and_then(Node::as_element_mut) else {
            return;
        };
        if let Some(pos) = element.attributes.iter().position(|(key, _)| key == name) {
            element.attributes.remove(pos);
            self.stats.attributes += 1;
        }
    }

    /// Assign a property.
    pub fn set_property(&mut self, node: NodeId, name: &str, value: PropertyValue) {
        let Some(element) = self.nodes.get_mut(&node).and_then(Node::as_element_mut) else {
            return;
        };
        element.properties.insert(CompactString::new(name), value);
        self.stats.properties += 1;
    }

    /// Replace the content of a text or comment node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        match self.nodes.get_mut(&node).map(|n| &mut n.kind) {
            Some(NodeKind::Text(content)) | Some(NodeKind::Comment(content)) => {
                *content = CompactString::new(text);
                self.stats.texts += 1;
            }
            _ => {}
        }
    }

    /// Attach a listener for an event name.
    pub fn add_listener(&mut self, node: NodeId, kind: &str, listener: Listener) -> Option<ListenerId> {
        let element = self.nodes.get_mut(&node).and_then(Node::as_element_mut)?;
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        element.listeners.push((id, CompactString::new(kind), listener));
        self.stats.listeners_added += 1;
        Some(id)
    }

    /// Detach a listener.
    pub fn remove_listener(&mut self, node: NodeId, listener: ListenerId) {
        let Some(element) = self.nodes.get_mut(&node).and_then(Node::as_element_mut) else {
            return;
        };
        if let Some(pos) = element.listeners.iter().position(|(id, _, _)| *id == listener) {
            element.listeners.remove(pos);
            self.stats.listeners_removed += 1;
        }
    }

    /// Listeners attached to a node for an event name, in attach order.
    pub fn listeners(&self, node: NodeId, kind: &str) -> Vec<Listener> {
        self.nodes
            .get(&node)
            .and_then(Node::as_element)
            .map(|element| {
                element
                    .listeners
                    .iter()
                    .filter(|(_, name, _)| name == kind)
                    .map(|(_, _, listener)| listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build skeleton nodes under `parent`, returning the new top-level ids.
    pub fn instantiate(&mut self, parent: NodeId, skeleton: &[SkeletonNode]) -> SmallVec<[NodeId; 4]> {
        skeleton
            .iter()
            .map(|node| {
                let id = self.build(node);
                self.append_child(parent, id);
                id
            })
            .collect()
    }

    fn build(&mut self, node: &SkeletonNode) -> NodeId {
        match node {
            SkeletonNode::Text(text) => self.create(NodeKind::Text(text.clone())),
            SkeletonNode::Comment(text) => self.create(NodeKind::Comment(text.clone())),
            SkeletonNode::Element(element) => {
                let mut data = ElementData::new(element.tag.clone(), element.ns);
                data.attributes = element
                    .attributes
                    .iter()
                    .map(|attr| (attr.name.clone(), attr.value.clone()))
                    .collect();
                let id = self.create(NodeKind::Element(data));
                self.instantiate(id, &element.children);
                id
            }
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str, ns: Namespace) -> NodeId {
        self.create(NodeKind::Element(ElementData::new(tag, ns)))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
