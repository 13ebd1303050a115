//! Markup tree for view archs.
//!
//! Archs are parsed into an element tree using the text/tail convention:
//! `text` holds character data before the first child and `tail` holds
//! character data following the element's closing tag, inside its parent.
//! Comments, processing instructions and declarations are dropped.

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Error parsing an arch.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ArchError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("document has no root element")]
    Empty,

    #[error("element <{0}> is not closed")]
    Unclosed(String),

    #[error("closing tag without matching opening tag")]
    Unbalanced,

    #[error("content after the root element")]
    TrailingContent,

    #[error("unknown entity &{0};")]
    UnknownEntity(String),

    #[error("invalid value for attribute {0:?}")]
    InvalidAttribute(String),
}

/// A markup element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub tail: String,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Preorder iterator over this element and its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Append character data after the current last piece of content.
    pub fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(text),
            None => self.text.push_str(text),
        }
    }
}

/// Parse an arch into its root element.
///
/// Whitespace around the root element is allowed; any other content outside
/// it is rejected.
pub fn parse(arch: &str) -> Result<Node, ArchError> {
    let mut reader = Reader::from_str(arch);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(ArchError::TrailingContent);
                }
                stack.push(element(&reader, &e)?);
            }
            Event::Empty(e) => {
                if root.is_some() {
                    return Err(ArchError::TrailingContent);
                }
                let node = element(&reader, &e)?;
                close(node, &mut stack, &mut root);
            }
            Event::End(_) => {
                let node = stack.pop().ok_or(ArchError::Unbalanced)?;
                close(node, &mut stack, &mut root);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                push_text(&mut stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                push_text(&mut stack, &decode_entity(&entity)?)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(ArchError::Unclosed(open.tag));
    }
    root.ok_or(ArchError::Empty)
}

fn element<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Result<Node, ArchError> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr
            .unescape_value()
            .map_err(|_| ArchError::InvalidAttribute(key.clone()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Node {
        tag,
        attrs,
        ..Node::default()
    })
}

fn close(node: Node, stack: &mut [Node], root: &mut Option<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn push_text(stack: &mut [Node], text: &str) -> Result<(), ArchError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.append_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ArchError::TrailingContent),
    }
}

/// Decode an XML entity reference to its character value.
fn decode_entity(entity: &str) -> Result<String, ArchError> {
    let decoded = match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .ok_or_else(|| ArchError::UnknownEntity(entity.to_owned()))?
                .to_string()
        }
        _ => return Err(ArchError::UnknownEntity(entity.to_owned())),
    };
    Ok(decoded)
}

/// Serialize an element (including its tail) to markup.
pub fn serialize(node: &Node) -> String {
    let mut out = String::with_capacity(1024);
    serialize_into(node, &mut out);
    out
}

pub(crate) fn serialize_into(node: &Node, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if node.children.is_empty() && node.text.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        out.push_str(&escape_text(&node.text));
        for child in &node.children {
            serialize_into(child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }

    out.push_str(&escape_text(&node.tail));
}

fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;"),
    )
}
