//! Template parser.
//!
//! This parser walks the joined template source once, building the static
//! skeleton and recording a part descriptor for every placeholder it meets.

use std::borrow::Cow;

use memchr::memmem;
use tessera_carton::CompactString;
use tessera_relief::{
    Attribute, ElementNode, Namespace, NodePath, ParseError, ParsedTemplate, ParserOptions,
    PartDescriptor, PartKind, SkeletonNode, WhitespaceStrategy,
};

use crate::scanner::{self, char_codes::*};

type ParseResult<T> = Result<T, ParseError>;

/// Join the static strings of a call site with the placeholder marker.
///
/// Fails if the marker is empty or if any static string already contains it,
/// since the placeholders could no longer be told apart from static text.
pub fn join_strings(strings: &[&str], marker: &str) -> ParseResult<String> {
    if marker.is_empty() {
        return Err(ParseError::InvalidMarker {
            marker: CompactString::new(marker),
        });
    }

    let finder = memmem::Finder::new(marker);
    let capacity = strings.iter().map(|s| s.len() + marker.len()).sum();
    let mut source = String::with_capacity(capacity);
    for (index, part) in strings.iter().enumerate() {
        if finder.find(part.as_bytes()).is_some() {
            return Err(ParseError::MarkerInStatic { index });
        }
        if index > 0 {
            source.push_str(marker);
        }
        source.push_str(part);
    }
    Ok(source)
}

/// Parse the static strings of a template call site.
///
/// The result holds exactly one descriptor per gap between two static strings.
pub fn parse_template(strings: &[&str], options: &ParserOptions) -> ParseResult<ParsedTemplate> {
    let source = join_strings(strings, &options.marker)?;
    let parsed = Parser::new(&source, options).with_marker().parse()?;

    let expected = strings.len().saturating_sub(1);
    if parsed.descriptors.len() != expected {
        return Err(ParseError::SlotCountMismatch {
            expected,
            found: parsed.descriptors.len(),
        });
    }
    Ok(parsed)
}

/// Parse a plain markup fragment.
///
/// Placeholder markers have no meaning here; top-level elements are created
/// in the given namespace.
pub fn parse_markup(
    source: &str,
    ns: Namespace,
    options: &ParserOptions,
) -> ParseResult<Vec<SkeletonNode>> {
    Parser::new(source, options)
        .with_namespace(ns)
        .parse()
        .map(|parsed| parsed.nodes)
}

/// Where a run of text sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextContext {
    /// Element content
    Data,
    /// Content of a raw-text element
    RawText { decode: bool },
}

impl TextContext {
    fn decodes(self) -> bool {
        match self {
            TextContext::Data => true,
            TextContext::RawText { decode } => decode,
        }
    }
}

/// Markup parser
pub struct Parser<'a> {
    /// Source text
    source: &'a str,
    /// Source bytes
    bytes: &'a [u8],
    /// Current index
    pos: usize,
    /// Parser options
    options: &'a ParserOptions,
    /// Placeholder marker, when parsing a template
    marker: Option<&'a [u8]>,
    /// Namespace of top-level elements
    namespace: Namespace,
    /// Descriptors collected so far, in source order
    descriptors: Vec<PartDescriptor>,
}

impl<'a> Parser<'a> {
    /// Create a new parser that treats the marker as plain text.
    pub fn new(source: &'a str, options: &'a ParserOptions) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            options,
            marker: None,
            namespace: Namespace::Html,
            descriptors: Vec::new(),
        }
    }

    /// Recognize the configured marker as a placeholder.
    pub fn with_marker(mut self) -> Self {
        let marker = self.options.marker.as_bytes();
        self.marker = (!marker.is_empty()).then_some(marker);
        self
    }

    /// Set the namespace of top-level elements.
    pub fn with_namespace(mut self, ns: Namespace) -> Self {
        self.namespace = ns;
        self
    }

    /// Parse the source and return the skeleton with its descriptors.
    pub fn parse(mut self) -> ParseResult<ParsedTemplate> {
        let root = NodePath::new();
        let nodes = self.parse_children(&root, self.namespace, None)?;
        Ok(ParsedTemplate {
            nodes,
            descriptors: self.descriptors,
        })
    }

    fn find_marker(&self, haystack: &str) -> Option<usize> {
        self.marker
            .and_then(|marker| memmem::find(haystack.as_bytes(), marker))
    }

    fn marker_at(&self, pos: usize) -> bool {
        match self.marker {
            Some(marker) if pos <= self.bytes.len() => self.bytes[pos..].starts_with(marker),
            _ => false,
        }
    }

    fn marker_len(&self) -> usize {
        self.marker.map_or(0, <[u8]>::len)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && scanner::is_whitespace(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn parse_children(
        &mut self,
        path: &NodePath,
        ns: Namespace,
        parent: Option<(&CompactString, usize)>,
    ) -> ParseResult<Vec<SkeletonNode>> {
        let mut children = Vec::new();

        loop {
            let text_start = self.pos;
            let text_end = memchr::memchr(LT, &self.bytes[self.pos..])
                .map_or(self.bytes.len(), |i| self.pos + i);
            if text_end > text_start {
                self.push_text(&mut children, path, text_start, text_end, TextContext::Data);
            }
            self.pos = text_end;

            if self.pos >= self.bytes.len() {
                return match parent {
                    Some((tag, offset)) => Err(ParseError::UnclosedElement {
                        tag: tag.clone(),
                        offset,
                    }),
                    None => Ok(children),
                };
            }

            let bytes = self.bytes;
            let rest = &bytes[self.pos..];
            if rest.starts_with(b"<!--") {
                self.parse_comment(&mut children, path)?;
            } else if rest.starts_with(b"</") {
                let offset = self.pos;
                let tag = self.parse_closing_tag()?;
                return match parent {
                    Some((open, _)) if open.eq_ignore_ascii_case(&tag) => Ok(children),
                    _ => Err(ParseError::UnexpectedClosingTag { tag, offset }),
                };
            } else if rest.len() > 1 && (rest[1] == EXCLAMATION_MARK || rest[1] == b'?') {
                self.skip_declaration()?;
            } else if rest.len() > 1 && scanner::is_tag_start_char(rest[1]) {
                self.parse_element(&mut children, path, ns)?;
            } else if self.marker_at(self.pos + 1) {
                return Err(ParseError::InvalidMarkerPosition {
                    offset: self.pos + 1,
                    context: "tag name",
                });
            } else {
                // A lone `<` is text.
                self.push_text(&mut children, path, self.pos, self.pos + 1, TextContext::Data);
                self.pos += 1;
            }
        }
    }

    fn push_text(
        &mut self,
        children: &mut Vec<SkeletonNode>,
        path: &NodePath,
        start: usize,
        end: usize,
        context: TextContext,
    ) {
        let source = self.source;
        let mut rest = &source[start..end];

        while let Some(index) = self.find_marker(rest) {
            self.push_static_text(children, &rest[..index], context);

            let node_path = child_path(path, children.len());
            match context {
                TextContext::Data => {
                    children.push(SkeletonNode::comment(""));
                    self.descriptors
                        .push(PartDescriptor::new(PartKind::ChildNode, node_path));
                }
                TextContext::RawText { .. } => {
                    children.push(SkeletonNode::text(""));
                    self.descriptors
                        .push(PartDescriptor::new(PartKind::Text, node_path));
                }
            }
            rest = &rest[index + self.marker_len()..];
        }

        self.push_static_text(children, rest, context);
    }

    fn push_static_text(&self, children: &mut Vec<SkeletonNode>, text: &str, context: TextContext) {
        if text.is_empty() {
            return;
        }

        let decoded = if context.decodes() {
            scanner::decode_entities(text)
        } else {
            Cow::Borrowed(text)
        };
        let content = match (context, self.options.whitespace) {
            (TextContext::Data, WhitespaceStrategy::Condense) => {
                match scanner::condense_whitespace(&decoded) {
                    Some(content) => content,
                    None => return,
                }
            }
            _ => CompactString::new(decoded.as_ref()),
        };

        // Empty text nodes are placeholders and must stay separate.
        if let Some(SkeletonNode::Text(last)) = children.last_mut() {
            if !last.is_empty() {
                last.push_str(&content);
                return;
            }
        }
        children.push(SkeletonNode::Text(content));
    }

    fn parse_comment(&mut self, children: &mut Vec<SkeletonNode>, path: &NodePath) -> ParseResult<()> {
        let body_start = self.pos + 4;
        let body_end = memmem::find(&self.bytes[body_start..], b"-->")
            .map(|i| body_start + i)
            .ok_or(ParseError::UnexpectedEof {
                offset: self.bytes.len(),
            })?;
        let source = self.source;
        let body = &source[body_start..body_end];
        self.pos = body_end + 3;

        match self.find_marker(body) {
            Some(_) if body.len() == self.marker_len() => {
                let node_path = child_path(path, children.len());
                children.push(SkeletonNode::comment(""));
                self.descriptors
                    .push(PartDescriptor::new(PartKind::ChildNode, node_path));
            }
            Some(index) => {
                return Err(ParseError::InvalidMarkerPosition {
                    offset: body_start + index,
                    context: "comment",
                });
            }
            None if self.options.comments => children.push(SkeletonNode::comment(body)),
            None => {}
        }
        Ok(())
    }

    fn parse_closing_tag(&mut self) -> ParseResult<CompactString> {
        let name_start = self.pos + 2;
        self.pos = name_start;
        while self.pos < self.bytes.len() && scanner::is_tag_name_char(self.bytes[self.pos]) {
            self.pos += 1;
        }
        let name = CompactString::new(&self.source[name_start..self.pos]);
        if name.is_empty() {
            return Err(ParseError::InvalidName { offset: name_start });
        }

        self.skip_whitespace();
        match self.bytes.get(self.pos) {
            Some(&GT) => {
                self.pos += 1;
                Ok(name)
            }
            Some(_) => Err(ParseError::InvalidName { offset: self.pos }),
            None => Err(ParseError::UnexpectedEof { offset: self.pos }),
        }
    }

    fn skip_declaration(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let end = memchr::memchr(GT, &self.bytes[start..])
            .map(|i| start + i)
            .ok_or(ParseError::UnexpectedEof {
                offset: self.bytes.len(),
            })?;
        if let Some(index) = self.find_marker(&self.source[start..end]) {
            return Err(ParseError::InvalidMarkerPosition {
                offset: start + index,
                context: "declaration",
            });
        }
        self.pos = end + 1;
        Ok(())
    }

    fn parse_element(
        &mut self,
        children: &mut Vec<SkeletonNode>,
        path: &NodePath,
        ns: Namespace,
    ) -> ParseResult<()> {
        let start = self.pos;
        let name_start = start + 1;
        self.pos = name_start;
        while self.pos < self.bytes.len() && scanner::is_tag_name_char(self.bytes[self.pos]) {
            self.pos += 1;
        }
        let tag = &self.source[name_start..self.pos];
        if let Some(index) = self.find_marker(tag) {
            return Err(ParseError::InvalidMarkerPosition {
                offset: name_start + index,
                context: "tag name",
            });
        }

        let ns = if tag.eq_ignore_ascii_case("svg") {
            Namespace::Svg
        } else {
            ns
        };
        let element_path = child_path(path, children.len());
        let mut element = ElementNode::new(tag, ns);

        let self_closing = self.parse_attributes(&mut element, &element_path)?;
        let tag = element.tag.clone();
        if self_closing || (self.options.is_void_tag)(&tag) {
            // no content
        } else if (self.options.is_raw_text_tag)(&tag) {
            self.parse_raw_text(&mut element, &element_path, start)?;
        } else {
            element.children = self.parse_children(&element_path, ns, Some((&tag, start)))?;
        }

        children.push(SkeletonNode::Element(element));
        Ok(())
    }

    /// Parse attributes up to the end of the start tag.
    ///
    /// Returns whether the tag was self-closing.
    fn parse_attributes(&mut self, element: &mut ElementNode, path: &NodePath) -> ParseResult<bool> {
        let source = self.source;

        loop {
            self.skip_whitespace();
            match self.bytes.get(self.pos) {
                None => return Err(ParseError::UnexpectedEof { offset: self.pos }),
                Some(&GT) => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some(&SLASH) => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&GT) {
                        self.pos += 1;
                        return Ok(true);
                    }
                    continue;
                }
                Some(_) => {}
            }

            if self.marker_at(self.pos) {
                return Err(ParseError::InvalidMarkerPosition {
                    offset: self.pos,
                    context: "attribute name",
                });
            }

            let name_start = self.pos;
            while self.pos < self.bytes.len() && !scanner::is_end_of_attr_name(self.bytes[self.pos]) {
                self.pos += 1;
            }
            let name = &source[name_start..self.pos];
            if name.is_empty() {
                return Err(ParseError::InvalidName { offset: name_start });
            }
            if let Some(index) = self.find_marker(name) {
                return Err(ParseError::InvalidMarkerPosition {
                    offset: name_start + index,
                    context: "attribute name",
                });
            }

            self.skip_whitespace();
            let value = if self.bytes.get(self.pos) == Some(&EQ) {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.parse_attribute_value()?)
            } else {
                None
            };

            let Some((raw, value_start)) = value else {
                element.attributes.push(Attribute::new(name, ""));
                continue;
            };

            match self.find_marker(raw) {
                None => {
                    let decoded = scanner::decode_entities(raw);
                    element.attributes.push(Attribute::new(name, decoded.as_ref()));
                }
                Some(index) if raw.len() != self.marker_len() => {
                    return Err(ParseError::PartialAttribute {
                        name: CompactString::new(name),
                        offset: value_start + index,
                    });
                }
                Some(_) => {
                    let (kind, bare) = match name.as_bytes()[0] {
                        b'.' => (PartKind::Property, &name[1..]),
                        b'@' => (PartKind::Event, &name[1..]),
                        _ => (PartKind::Attribute, name),
                    };
                    if bare.is_empty() {
                        return Err(ParseError::InvalidName { offset: name_start });
                    }
                    self.descriptors
                        .push(PartDescriptor::named(kind, path.clone(), bare));
                }
            }
        }
    }

    /// Parse a quoted or unquoted attribute value, returning it with its offset.
    fn parse_attribute_value(&mut self) -> ParseResult<(&'a str, usize)> {
        let source = self.source;
        match self.bytes.get(self.pos) {
            None => Err(ParseError::UnexpectedEof { offset: self.pos }),
            Some(&quote) if quote == DOUBLE_QUOTE || quote == SINGLE_QUOTE => {
                let start = self.pos + 1;
                let end = memchr::memchr(quote, &self.bytes[start..])
                    .map(|i| start + i)
                    .ok_or(ParseError::UnexpectedEof {
                        offset: self.bytes.len(),
                    })?;
                self.pos = end + 1;
                Ok((&source[start..end], start))
            }
            Some(_) => {
                let start = self.pos;
                while self.pos < self.bytes.len() {
                    let c = self.bytes[self.pos];
                    let self_close = c == SLASH && self.bytes.get(self.pos + 1) == Some(&GT);
                    if scanner::is_end_of_unquoted_value(c) || self_close {
                        break;
                    }
                    self.pos += 1;
                }
                Ok((&source[start..self.pos], start))
            }
        }
    }

    fn parse_raw_text(
        &mut self,
        element: &mut ElementNode,
        path: &NodePath,
        start: usize,
    ) -> ParseResult<()> {
        let closing = format!("</{}", element.tag);
        let content_start = self.pos;
        let content_end = scanner::find_ignore_ascii_case(&self.bytes[content_start..], closing.as_bytes())
            .map(|i| content_start + i)
            .ok_or_else(|| ParseError::UnclosedElement {
                tag: element.tag.clone(),
                offset: start,
            })?;

        let decode = !(element.tag.eq_ignore_ascii_case("script")
            || element.tag.eq_ignore_ascii_case("style"));
        self.push_text(
            &mut element.children,
            path,
            content_start,
            content_end,
            TextContext::RawText { decode },
        );

        self.pos = content_end + closing.len();
        self.skip_whitespace();
        match self.bytes.get(self.pos) {
            Some(&GT) => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(ParseError::InvalidName { offset: self.pos }),
            None => Err(ParseError::UnexpectedEof { offset: self.pos }),
        }
    }
}

fn child_path(path: &NodePath, index: usize) -> NodePath {
    let mut child = path.clone();
    child.push(index as u32);
    child
}
