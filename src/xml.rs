//! Minimal element tree over `quick-xml` events.
//!
//! The authored documents are small, so they are read into a tree once and
//! then walked by the index and page parsers. Only elements, attributes and
//! text survive; comments, processing instructions and the prolog are dropped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid escape in attribute {attribute}: {reason}")]
    Escape { attribute: String, reason: String },
    #[error("Unbalanced closing tag </{0}>")]
    Unbalanced(String),
    #[error("Document has no root element")]
    MissingRoot,
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local name, lowercased.
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text between them.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant element (depth-first, self included) named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(name))
    }

    /// Concatenated text of this element and all its descendants.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Parse a document and return its root element.
pub fn parse_document(content: &str) -> Result<Element, XmlError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_element(&e)?),
            Event::Empty(e) => {
                let element = start_element(&e)?;
                close(element, &mut stack, &mut root);
            }
            Event::End(e) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::Unbalanced(String::from_utf8_lossy(e.name().as_ref()).to_string())
                })?;
                close(element, &mut stack, &mut root);
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(top) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref()).to_string();
                    match resolve_entity(&entity) {
                        Some(resolved) => top.push_text(&resolved),
                        None => top.push_text(&format!("&{entity};")),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(XmlError::MissingRoot)
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).to_lowercase();
    let mut attributes = BTreeMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).to_string();
        let raw = String::from_utf8_lossy(&attr.value).to_string();
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| XmlError::Escape {
                attribute: key.clone(),
                reason: err.to_string(),
            })?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    code.and_then(char::from_u32).map(|c| c.to_string())
}
