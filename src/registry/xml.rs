//! Minimal owned element tree over `quick-xml` events.
//!
//! The registry is small enough (a few MB) to hold in memory, and the resolver
//! needs random access (every enum block rescans every extension), so we build
//! a plain tree once instead of streaming.
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::RegistryError;

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn require_attr(&self, key: &str) -> Result<&str, RegistryError> {
        self.attr(key).ok_or_else(|| RegistryError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// All descendants reached by a slash-separated path of child names,
    /// e.g. `extensions/extension`, in document order.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut current: Vec<&Element> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(move |el| el.children.iter().filter(move |child| child.name == segment))
                .collect();
        }
        current
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

pub fn parse_document(source: &str) -> Result<Element, RegistryError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|error| malformed(reader.error_position() as u64, error))?;
        match event {
            Event::Start(start) => {
                let element = open_element(&reader, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start)?;
                attach(&mut stack, &mut root, element, reader.buffer_position() as u64)?;
            }
            Event::End(_) => {
                let position = reader.buffer_position() as u64;
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(position, "closing tag without an open element"))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Eof => break,
            // text, comments, declarations, doctype: the registry model only
            // reads elements and attributes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            reader.buffer_position() as u64,
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.ok_or_else(|| malformed(reader.buffer_position() as u64, "document has no root element"))
}

fn open_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, RegistryError> {
    let position = reader.buffer_position() as u64;
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|error| malformed(position, error))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|error| malformed(position, error))?
            .into_owned();
        element.attrs.insert(key, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), RegistryError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(malformed(position, format!("second root element <{}>", element.name)));
    }
    *root = Some(element);
    Ok(())
}

fn malformed(position: u64, message: impl ToString) -> RegistryError {
    RegistryError::Malformed { position, message: message.to_string() }
}
