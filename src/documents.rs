//! XML document tree
//!
//! A small mutable node tree that keeps everything a mapping file may carry
//! (attribute order, comments, CDATA, processing instructions), so that a
//! document can be patched in place and written back out.

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Unescaped character data
    Text(String),
    /// CDATA section content
    CData(String),
    /// Comment content, kept verbatim
    Comment(String),
    /// Processing instruction content, kept verbatim
    ProcessingInstruction(String),
    /// Doctype declaration content, kept verbatim
    DocType(String),
}

impl Node {
    /// Get the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Whitespace-only text, dropped when writing
    fn is_blank(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element name as written (prefix included)
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding a single text node
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.set_text(text);
        element
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.local_name() == local_name)
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.child_elements()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Position in `children` of the first child element with the given name
    pub fn child_position(&self, local_name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.local_name() == local_name))
    }

    /// All descendant elements with the given name, in document order
    pub fn descendants(&self, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(local_name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local_name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.local_name() == local_name {
                found.push(child);
            }
            child.collect_descendants(local_name, found);
        }
    }

    /// Child-index paths of all descendants with the given name, in document order
    ///
    /// A path addresses `children` positions from this element downwards and
    /// can be resolved with [`Element::element_at_mut`].
    pub fn descendant_paths(&self, local_name: &str) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(local_name, &mut prefix, &mut paths);
        paths
    }

    fn collect_paths(&self, local_name: &str, prefix: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
        for (i, node) in self.children.iter().enumerate() {
            if let Node::Element(child) = node {
                prefix.push(i);
                if child.local_name() == local_name {
                    paths.push(prefix.clone());
                }
                child.collect_paths(local_name, prefix, paths);
                prefix.pop();
            }
        }
    }

    /// Resolve a child-index path
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &i in path {
            current = current.children.get(i)?.as_element()?;
        }
        Some(current)
    }

    /// Resolve a child-index path mutably
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &i in path {
            current = match current.children.get_mut(i)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Concatenated text of all descendant text and CDATA nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                _ => {}
            }
        }
    }

    /// Trimmed text content of the first child with the given name
    pub fn child_text(&self, local_name: &str) -> Option<String> {
        self.find_child(local_name)
            .map(|e| e.text_content().trim().to_string())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Insert a child element at a `children` position (clamped to the end)
    pub fn insert_child(&mut self, position: usize, child: Element) {
        let position = position.min(self.children.len());
        self.children.insert(position, Node::Element(child));
    }

    /// Replace all content with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Set the text of the first child with the given name, creating it if absent
    ///
    /// A new child is inserted after the element named `after` when there is
    /// one, otherwise appended.
    pub fn set_child_text(&mut self, local_name: &str, text: &str, after: Option<&str>) {
        if let Some(Node::Element(child)) = self
            .child_position(local_name)
            .and_then(|i| self.children.get_mut(i))
        {
            child.set_text(text);
            return;
        }
        let position = after
            .and_then(|name| self.child_position(name))
            .map(|i| i + 1)
            .unwrap_or(self.children.len());
        self.insert_child(position, Element::with_text(local_name, text));
    }

    /// Remove every child element with one of the given names
    ///
    /// Returns the position the first removed element occupied.
    pub fn remove_children(&mut self, local_names: &[&str]) -> Option<usize> {
        let mut first = None;
        let mut i = 0;
        while i < self.children.len() {
            let hit = matches!(&self.children[i], Node::Element(e) if local_names.contains(&e.local_name()));
            if hit {
                first.get_or_insert(i);
                self.children.remove(i);
            } else {
                i += 1;
            }
        }
        first
    }
}

/// XML Document representation
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Comments, processing instructions and doctype before the root
    pub prolog: Vec<Node>,
    /// Root element of the document
    pub root: Element,
    /// Comments and processing instructions after the root
    pub epilog: Vec<Node>,
}

impl Document {
    /// Create a new document with an empty root element
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            prolog: Vec::new(),
            root: Element::new(root_name),
            epilog: Vec::new(),
        }
    }

    /// Parse an XML document from a string with default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml, &Limits::default())
    }

    /// Parse an XML document, rejecting anything that is not well-formed
    pub fn parse(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;
        check_well_formed(xml)?;

        let mut reader = Reader::from_reader(xml.as_bytes());

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ParseError::new(format!("malformed XML: {}", e))
                    .with_location(format!("byte {}", reader.buffer_position()))
            })?;

            let node = match event {
                Event::Start(e) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    element_stack.push(Self::parse_element(&e, limits)?);
                    None
                }
                Event::End(_) => element_stack.pop().map(Node::Element),
                Event::Empty(e) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    Some(Node::Element(Self::parse_element(&e, limits)?))
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    Some(Node::Text(text.into_owned()))
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                    Some(Node::CData(text))
                }
                Event::Comment(e) => Some(Node::Comment(String::from_utf8_lossy(&e).into_owned())),
                Event::PI(e) => Some(Node::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                )),
                Event::DocType(e) => Some(Node::DocType(String::from_utf8_lossy(&e).into_owned())),
                Event::Decl(_) => None,
                Event::Eof => break,
            };

            if let Some(node) = node {
                if let Some(parent) = element_stack.last_mut() {
                    parent.children.push(node);
                } else {
                    match node {
                        Node::Element(e) if root.is_none() => root = Some(e),
                        Node::Element(e) => {
                            return Err(ParseError::new(format!(
                                "second root element <{}>",
                                e.name
                            ))
                            .into())
                        }
                        Node::Text(t) if t.trim().is_empty() => {}
                        Node::Text(t) => {
                            return Err(ParseError::new("text outside the root element")
                                .with_source(t)
                                .into())
                        }
                        other if root.is_none() => prolog.push(other),
                        other => epilog.push(other),
                    }
                }
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(ParseError::new(format!("unclosed element <{}>", open.name)).into());
        }
        let root = root.ok_or_else(|| ParseError::new("document has no root element"))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .into_owned();

            element.attributes.push((attr_name, attr_value));
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Get the root element mutably
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Write the document as indented XML text
    ///
    /// Every element starts on its own line, indented by `indent` spaces per
    /// level. Elements holding only text stay on one line, whitespace-only
    /// text is dropped and comments are written verbatim.
    pub fn to_xml(&self, indent: usize) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
        write(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Output is not UTF-8: {}", e)))?;
        xml.push('\n');
        Ok(xml)
    }
}

/// Strict well-formedness check with a `row:col` location on failure
fn check_well_formed(xml: &str) -> Result<()> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(xml, options)
        .map(|_| ())
        .map_err(|e| {
            let pos = e.pos();
            ParseError::new(format!("malformed XML: {}", e))
                .with_location(format!("{}:{}", pos.row, pos.col))
                .into()
        })
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("Failed to write XML: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let mut children = element.children.iter().filter(|n| !n.is_blank()).peekable();
    if children.peek().is_none() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for child in children {
        write_node(writer, child)?;
    }
    write(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(e) => write_element(writer, e),
        Node::Text(t) => write(writer, Event::Text(BytesText::new(t))),
        Node::CData(t) => write(writer, Event::CData(BytesCData::new(t.as_str()))),
        Node::Comment(c) => write(writer, Event::Comment(BytesText::from_escaped(c.as_str()))),
        Node::ProcessingInstruction(p) => {
            write(writer, Event::PI(BytesText::from_escaped(p.as_str())))
        }
        Node::DocType(d) => write(writer, Event::DocType(BytesText::from_escaped(d.as_str()))),
    }
}
