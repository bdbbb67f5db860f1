//! Template skeleton AST.
//!
//! A parsed template is a list of static [`SkeletonNode`]s plus an ordered list
//! of [`PartDescriptor`]s. Every descriptor points into the skeleton with a
//! child-index path, so instantiating the skeleton and walking the paths yields
//! the live node for each dynamic slot.

use serde::Serialize;
use tessera_carton::{CompactString, SmallVec};

/// Namespace of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// A static node of a template skeleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkeletonNode {
    Element(ElementNode),
    Text(CompactString),
    Comment(CompactString),
}

impl SkeletonNode {
    /// Create a text node.
    pub fn text(content: impl Into<CompactString>) -> Self {
        Self::Text(content.into())
    }

    /// Create a comment node.
    pub fn comment(content: impl Into<CompactString>) -> Self {
        Self::Comment(content.into())
    }

    /// Get the element if this node is one.
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        match self {
            Self::Element(element) => {
                1 + element
                    .children
                    .iter()
                    .map(SkeletonNode::subtree_len)
                    .sum::<usize>()
            }
            _ => 1,
        }
    }
}

/// A static element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementNode {
    /// Tag name as written
    pub tag: CompactString,
    /// Element namespace
    pub ns: Namespace,
    /// Static attributes in source order
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<SkeletonNode>,
}

impl ElementNode {
    /// Create an empty element.
    pub fn new(tag: impl Into<CompactString>, ns: Namespace) -> Self {
        Self {
            tag: tag.into(),
            ns,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up a static attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

/// A static attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: CompactString,
    pub value: CompactString,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Kind of a dynamic slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PartKind {
    /// A region of child nodes ending at an anchor comment
    ChildNode,
    /// An attribute (`name=${}`)
    Attribute,
    /// A property assignment (`.name=${}`)
    Property,
    /// An event listener (`@name=${}`)
    Event,
    /// A text node inside a raw-text element
    Text,
}

impl PartKind {
    /// Human readable name, used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            PartKind::ChildNode => "child node",
            PartKind::Attribute => "attribute",
            PartKind::Property => "property",
            PartKind::Event => "event",
            PartKind::Text => "text",
        }
    }
}

impl std::fmt::Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Child-index path from the skeleton roots to a node.
///
/// The first index selects a root node, every following index a child.
pub type NodePath = SmallVec<[u32; 6]>;

/// Location and kind of one dynamic slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartDescriptor {
    /// Slot kind
    pub kind: PartKind,
    /// Path to the anchor comment, element or text node
    pub path: NodePath,
    /// Attribute, property or event name for attribute-like slots
    pub name: Option<CompactString>,
}

impl PartDescriptor {
    /// Create a descriptor without a name.
    pub fn new(kind: PartKind, path: NodePath) -> Self {
        Self {
            kind,
            path,
            name: None,
        }
    }

    /// Create a descriptor for an attribute-like slot.
    pub fn named(kind: PartKind, path: NodePath, name: impl Into<CompactString>) -> Self {
        Self {
            kind,
            path,
            name: Some(name.into()),
        }
    }
}

/// Result of parsing a template source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedTemplate {
    /// Static root nodes
    pub nodes: Vec<SkeletonNode>,
    /// Dynamic slots in source order
    pub descriptors: Vec<PartDescriptor>,
}

impl ParsedTemplate {
    /// Resolve a path against the skeleton.
    pub fn node_at(&self, path: &[u32]) -> Option<&SkeletonNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first as usize)?;
        for &index in rest {
            node = node.as_element()?.children.get(index as usize)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_carton::smallvec;

    fn sample() -> ParsedTemplate {
        let mut div = ElementNode::new("div", Namespace::Html);
        div.attributes.push(Attribute::new("class", "box"));
        div.children.push(SkeletonNode::text("hi"));
        div.children.push(SkeletonNode::comment(""));
        ParsedTemplate {
            nodes: vec![SkeletonNode::Element(div)],
            descriptors: vec![PartDescriptor::new(PartKind::ChildNode, smallvec![0, 1])],
        }
    }

    #[test]
    fn test_node_at() {
        let parsed = sample();
        assert!(matches!(parsed.node_at(&[0]), Some(SkeletonNode::Element(_))));
        assert_eq!(parsed.node_at(&[0, 1]), Some(&SkeletonNode::comment("")));
        assert_eq!(parsed.node_at(&[0, 5]), None);
        assert_eq!(parsed.node_at(&[]), None);
    }

    #[test]
    fn test_subtree_len() {
        let parsed = sample();
        assert_eq!(parsed.nodes[0].subtree_len(), 3);
    }

    #[test]
    fn test_element_attribute() {
        let parsed = sample();
        let element = parsed.nodes[0].as_element().unwrap();
        assert_eq!(element.attribute("class"), Some("box"));
        assert_eq!(element.attribute("id"), None);
    }

    #[test]
    fn test_template_types_are_serializable() {
        fn assert_serialize<T: Serialize>() {}
        assert_serialize::<PartDescriptor>();
        assert_serialize::<ParsedTemplate>();
        assert_serialize::<SkeletonNode>();
    }
}
