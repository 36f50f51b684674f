//! Extension enum resolver.
//!
//! Extension-contributed cases carry no literal value. Each extension owns a
//! private block of 1000 codes starting at 1,000,000,000, ordered by extension
//! number, and a contribution names its `offset` inside that block:
//!
//! ```text
//! value = 1_000_000_000 + (extnumber - 1) * 1000 + offset
//! ```
//!
//! `extnumber` on the contribution overrides the enclosing extension's
//! `number` (promoted cases keep the block of their original extension), and
//! `dir="-"` negates the result (error codes in `VkResult`).
//!
//! Extensions are scanned in document order and the first contribution of a
//! given name wins; re-declarations are dropped.
use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::xml::Element;
use super::{CEnum, CEnumCase};
use crate::error::RegistryError;

const EXTENSION_BASE: i64 = 1_000_000_000;
const EXTENSION_BLOCK_SIZE: i64 = 1000;

/// `None` when `extension_number` is not positive or the value leaves `i64`.
pub fn extension_case_value(extension_number: i64, offset: i64) -> Option<i64> {
    extension_block_start(extension_number)?.checked_add(offset)
}

fn extension_block_start(extension_number: i64) -> Option<i64> {
    if extension_number < 1 {
        return None;
    }
    (extension_number - 1)
        .checked_mul(EXTENSION_BLOCK_SIZE)?
        .checked_add(EXTENSION_BASE)
}

/// Every `<enums type="enum">` block, with extension cases appended.
pub fn resolve_enum_values(root: &Element) -> Result<Vec<CEnum>, RegistryError> {
    resolve_blocks(root, BlockKind::Enum)
}

/// Every `<enums type="bitmask">` block, with extension bits appended.
pub fn resolve_bitmask_values(root: &Element) -> Result<Vec<CEnum>, RegistryError> {
    resolve_blocks(root, BlockKind::Bitmask)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Enum,
    Bitmask,
}

impl BlockKind {
    fn type_attr(self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::Bitmask => "bitmask",
        }
    }

    /// Value of a case declared directly inside the block.
    fn literal_value(self, case: &Element) -> Result<Option<String>, RegistryError> {
        if let Some(value) = case.attr("value") {
            return Ok(Some(value.to_string()));
        }
        match self {
            Self::Enum => Ok(None),
            Self::Bitmask => bitpos_value(case),
        }
    }

    /// Value of a case an extension adds to the block, `None` when the
    /// contribution is not of a form this kind resolves.
    fn contributed_value(
        self,
        extension: &Element,
        contribution: &Element,
        enum_name: &str,
        case_name: &str,
    ) -> Result<Option<String>, RegistryError> {
        match self {
            Self::Enum => {
                let Some(offset) = int_attr(contribution, "offset")? else {
                    return Ok(None);
                };
                let extension_number =
                    effective_extension_number(extension, contribution, enum_name, case_name)?;
                let value = extension_case_value(extension_number, offset)
                    .ok_or_else(|| invalid_integer(contribution, "offset"))?;
                let dir = contribution.attr("dir").unwrap_or("");
                Ok(Some(format!("{dir}{value}")))
            }
            Self::Bitmask => bitpos_value(contribution),
        }
    }
}

fn resolve_blocks(root: &Element, kind: BlockKind) -> Result<Vec<CEnum>, RegistryError> {
    let extensions = root.find_all("extensions/extension");
    root.children_named("enums")
        .filter(|block| block.attr("type") == Some(kind.type_attr()))
        .map(|block| resolve_block(block, &extensions, kind))
        .collect()
}

fn resolve_block(
    block: &Element,
    extensions: &[&Element],
    kind: BlockKind,
) -> Result<CEnum, RegistryError> {
    let enum_name = block.require_attr("name")?;
    let mut resolved = CEnum::new(enum_name);
    let mut seen: HashSet<String> = HashSet::new();

    for case in block.children_named("enum") {
        let case_name = case.require_attr("name")?;
        if let Some(alias) = case.attr("alias") {
            warn!(enum_name, case_name, alias, "skipping aliased enum case (aliases are not resolved)");
            continue;
        }
        let Some(value) = kind.literal_value(case)? else {
            trace!(enum_name, case_name, "case without a literal value");
            continue;
        };
        seen.insert(case_name.to_string());
        resolved.cases.push(CEnumCase { name: case_name.to_string(), value });
    }
    let literal_count = resolved.cases.len();

    for extension in extensions {
        for contribution in extension.find_all("require/enum") {
            if contribution.attr("extends") != Some(enum_name) {
                continue;
            }
            let case_name = contribution.require_attr("name")?;
            if let Some(alias) = contribution.attr("alias") {
                warn!(
                    enum_name,
                    case_name,
                    alias,
                    extension = extension.attr("name").unwrap_or("?"),
                    "skipping aliased extension case (aliases are not resolved)"
                );
                continue;
            }
            if seen.contains(case_name) {
                trace!(enum_name, case_name, "duplicate extension case, keeping first");
                continue;
            }
            let Some(value) = kind.contributed_value(extension, contribution, enum_name, case_name)?
            else {
                continue;
            };
            seen.insert(case_name.to_string());
            resolved.cases.push(CEnumCase { name: case_name.to_string(), value });
        }
    }

    debug!(
        enum_name,
        literal = literal_count,
        extended = resolved.cases.len() - literal_count,
        "resolved {}",
        kind.type_attr()
    );
    Ok(resolved)
}

fn effective_extension_number(
    extension: &Element,
    contribution: &Element,
    enum_name: &str,
    case_name: &str,
) -> Result<i64, RegistryError> {
    let (source, attribute) = match contribution.attr("extnumber") {
        Some(_) => (contribution, "extnumber"),
        None => (extension, "number"),
    };
    let number = int_attr(source, attribute)?.ok_or_else(|| RegistryError::MissingExtensionNumber {
        enum_name: enum_name.to_string(),
        case_name: case_name.to_string(),
        extension: extension.attr("name").unwrap_or("<unnamed>").to_string(),
    })?;
    if extension_block_start(number).is_none() {
        return Err(invalid_integer(source, attribute));
    }
    Ok(number)
}

fn bitpos_value(case: &Element) -> Result<Option<String>, RegistryError> {
    let Some(bitpos) = int_attr(case, "bitpos")? else {
        return Ok(None);
    };
    if !(0..64).contains(&bitpos) {
        return Err(invalid_integer(case, "bitpos"));
    }
    Ok(Some((1u64 << bitpos).to_string()))
}

fn int_attr(element: &Element, attribute: &str) -> Result<Option<i64>, RegistryError> {
    element
        .attr(attribute)
        .map(|raw| raw.trim().parse::<i64>().map_err(|_| invalid_integer(element, attribute)))
        .transpose()
}

fn invalid_integer(element: &Element, attribute: &str) -> RegistryError {
    RegistryError::InvalidInteger {
        element: element.name.clone(),
        attribute: attribute.to_string(),
        value: element.attr(attribute).unwrap_or_default().to_string(),
    }
}
