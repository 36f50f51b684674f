//! Registry model: the slice of the XML API registry the generator consumes.
//!
//! Parsing is two steps: build an element tree (`xml`), then resolve every
//! enumeration and bitmask block against the extensions that extend it
//! (`resolve`). The result is immutable for the rest of the run.
pub mod resolve;
pub mod xml;

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::error::RegistryError;
use xml::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CEnumCase {
    pub name: String,
    /// Signed integer as text, e.g. `-1000001004` or `0x00000001`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CEnum {
    pub name: String,
    pub cases: Vec<CEnumCase>,
}

impl CEnum {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), cases: Vec::new() }
    }

    pub fn case(&self, name: &str) -> Option<&CEnumCase> {
        self.cases.iter().find(|case| case.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Registry {
    /// Vendor/author tags (`KHR`, `EXT`, ...) in declaration order.
    pub extension_tags: IndexSet<String>,
    pub enums: Vec<CEnum>,
    pub bitmasks: Vec<CEnum>,
}

impl Registry {
    pub fn parse(mut source: impl Read) -> Result<Self, RegistryError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        decode_utf8(bytes)?.parse()
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        decode_utf8(std::fs::read(path)?)?.parse()
    }

    pub fn from_tree(root: &Element) -> Result<Self, RegistryError> {
        let extension_tags = parse_extension_tags(root)?;
        let enums = resolve::resolve_enum_values(root)?;
        let bitmasks = resolve::resolve_bitmask_values(root)?;
        debug!(
            tags = extension_tags.len(),
            enums = enums.len(),
            bitmasks = bitmasks.len(),
            "parsed registry"
        );
        Ok(Self { extension_tags, enums, bitmasks })
    }
}

impl FromStr for Registry {
    type Err = RegistryError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let root = xml::parse_document(source)?;
        Self::from_tree(&root)
    }
}

/// Undecodable text is a markup defect, not an I/O failure.
fn decode_utf8(bytes: Vec<u8>) -> Result<String, RegistryError> {
    String::from_utf8(bytes).map_err(|error| RegistryError::Malformed {
        position: error.utf8_error().valid_up_to() as u64,
        message: error.utf8_error().to_string(),
    })
}

fn parse_extension_tags(root: &Element) -> Result<IndexSet<String>, RegistryError> {
    root.find_all("tags/tag")
        .into_iter()
        .map(|tag| tag.require_attr("name").map(str::to_string))
        .collect()
}
