//! HTML serialization of surface trees.

use tessera_carton::{is_raw_text_tag, is_void_tag};

use crate::document::Document;
use crate::node::{NodeId, NodeKind};

/// Serialize a node and its subtree.
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, false, &mut out);
    out
}

/// Serialize the children of a node.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_children(doc, node, &mut out);
    out
}

fn write_children(doc: &Document, node: NodeId, out: &mut String) {
    let Some(current) = doc.get(node) else {
        return;
    };
    let raw = current
        .as_element()
        .is_some_and(|element| is_raw_text_tag(&element.tag));
    for &child in &current.children {
        write_node(doc, child, raw, out);
    }
}

fn write_node(doc: &Document, node: NodeId, raw: bool, out: &mut String) {
    let Some(current) = doc.get(node) else {
        return;
    };
    match &current.kind {
        NodeKind::Document | NodeKind::Fragment => write_children(doc, node, out),
        NodeKind::Text(text) if raw => out.push_str(text),
        NodeKind::Text(text) => escape_text(text, out),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_tag(&element.tag) && current.children.is_empty() {
                return;
            }
            write_children(doc, node, out);
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_relief::Namespace;

    #[test]
    fn test_serialize_element() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div", Namespace::Html);
        let text = doc.create(NodeKind::Text("a < b & c".into()));
        let br = doc.create_element("br", Namespace::Html);
        doc.append_child(root, div);
        doc.append_child(div, text);
        doc.append_child(div, br);
        doc.set_attribute(div, "title", "say \"hi\"");
        doc.set_attribute(div, "hidden", "");
        insta::assert_snapshot!(
            to_html(&doc, div),
            @r#"<div title="say &quot;hi&quot;" hidden>a &lt; b &amp; c<br></div>"#
        );
    }

    #[test]
    fn test_serialize_raw_text() {
        let mut doc = Document::new();
        let style = doc.create_element("style", Namespace::Html);
        let text = doc.create(NodeKind::Text("a > b {}".into()));
        doc.append_child(style, text);
        assert_eq!(to_html(&doc, style), "<style>a > b {}</style>");
    }

    #[test]
    fn test_inner_html_skips_wrapper() {
        let mut doc = Document::new();
        let root = doc.root();
        let comment = doc.create(NodeKind::Comment(String::new().into()));
        doc.append_child(root, comment);
        assert_eq!(inner_html(&doc, root), "<!---->");
        assert_eq!(to_html(&doc, root), "<!---->");
    }
}
