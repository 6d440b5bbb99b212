use std::io::Read;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Result, SyntaxError, XmlError};
use crate::validator::{is_name, is_xml_char, scan, Markup};

/// A parsed or built XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

/// An element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

impl Document {
    /// Wrap a root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a well-formed document.
    pub fn parse(payload: &[u8]) -> std::result::Result<Self, SyntaxError> {
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        scan(payload, |markup| match markup {
            Markup::Open {
                name,
                attributes,
                empty,
            } => {
                let element = Element {
                    name,
                    attributes,
                    children: Vec::new(),
                };
                if empty {
                    attach(&mut stack, &mut root, element);
                } else {
                    stack.push(element);
                }
            }
            Markup::Close => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Markup::Text(text) => push_node(&mut stack, Node::Text(text)),
            Markup::CData(text) => push_node(&mut stack, Node::CData(text)),
            Markup::Comment(text) => push_node(&mut stack, Node::Comment(text)),
        })?;

        // scan guarantees exactly one closed root on success
        root.map(Self::new)
            .ok_or_else(|| SyntaxError::new("document has no root element", payload.len(), payload))
    }

    /// Read everything from `reader` and parse it.
    pub fn parse_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Self::parse(&payload)?)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Serialize with an XML declaration and escaped content.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
            .map_err(serialize_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\n")))
            .map_err(serialize_error)?;
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }

    /// Serialize to a string; see [`Document::to_bytes`].
    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).map_err(|err| XmlError::Serialize(err.to_string()))
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn push_node(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn serialize_error(err: impl std::fmt::Display) -> XmlError {
    XmlError::Serialize(err.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    if !is_name(&element.name) {
        return Err(XmlError::Serialize(format!(
            "invalid element name '{}'",
            element.name
        )));
    }
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        if !is_name(key) {
            return Err(XmlError::Serialize(format!(
                "invalid attribute name '{key}' on <{}>",
                element.name
            )));
        }
        check_chars(value)?;
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(serialize_error);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(serialize_error)?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) => {
                check_chars(text)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(serialize_error)?
            }
            Node::CData(text) => {
                check_chars(text)?;
                write_cdata(writer, text)?
            }
            Node::Comment(text) => {
                check_chars(text)?;
                if text.contains("--") || text.ends_with('-') {
                    return Err(XmlError::Serialize(format!(
                        "comment may not contain '--' or end with '-': {text:?}"
                    )));
                }
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(serialize_error)?
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(serialize_error)
}

/// A CDATA section cannot hold `]]>`, so the text is split across sections
/// between `]]` and `>`.
fn write_cdata(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    let mut rest = text;
    while let Some(idx) = rest.find("]]>") {
        let (section, tail) = rest.split_at(idx + 2);
        writer
            .write_event(Event::CData(BytesCData::new(section)))
            .map_err(serialize_error)?;
        rest = tail;
    }
    writer
        .write_event(Event::CData(BytesCData::new(rest)))
        .map_err(serialize_error)
}

fn check_chars(text: &str) -> Result<()> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(XmlError::Serialize(format!(
            "character U+{:04X} cannot be written to XML",
            u32::from(c)
        ))),
        None => Ok(()),
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an existing value with the same name.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First descendant (depth-first, self excluded) whose name or local
    /// name matches.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == name || child.local_name() == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text and CDATA content of this element's direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
