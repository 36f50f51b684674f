use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::ir::{Bindings, EnumCase, EnumDescriptor, OptionSetDescriptor};
use crate::naming::{case_name, screaming_words, strip_tag};
use crate::registry::{CEnum, Registry};

#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Prefix stripped from C type names (`VkFormat` -> `Format`).
    pub c_prefix: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self { c_prefix: "Vk".to_string() }
    }
}

/// Registry enums and bitmasks become enum and option-set descriptors.
/// Enums with no cases are dropped (a raw-valued Swift enum needs one).
pub fn lower_registry(registry: &Registry, options: &LowerOptions) -> Bindings {
    let enums = registry
        .enums
        .iter()
        .filter(|c_enum| {
            let keep = !c_enum.cases.is_empty();
            if !keep {
                debug!(enum_name = %c_enum.name, "dropping enum without cases");
            }
            keep
        })
        .map(|c_enum| lower_enum(c_enum, options, &registry.extension_tags))
        .collect();
    let option_sets = registry
        .bitmasks
        .iter()
        .map(|c_enum| lower_bitmask(c_enum, options, &registry.extension_tags))
        .collect();
    Bindings { enums, option_sets, ..Bindings::default() }
}

pub fn lower_enum(c_enum: &CEnum, options: &LowerOptions, tags: &IndexSet<String>) -> EnumDescriptor {
    let (stem, _) = strip_tag(&c_enum.name, tags);
    let type_words = screaming_words(stem);
    let cases = lower_cases(c_enum, &type_words, tags, false);
    let raw_type = if cases.iter().any(|case| case.value.starts_with('-')) { "Int32" } else { "UInt32" };
    EnumDescriptor {
        name: type_name(&c_enum.name, options),
        raw_type: raw_type.to_string(),
        cases,
    }
}

pub fn lower_bitmask(c_enum: &CEnum, options: &LowerOptions, tags: &IndexSet<String>) -> OptionSetDescriptor {
    let (stem, _) = strip_tag(&c_enum.name, tags);
    let stem = stem.strip_suffix("FlagBits").unwrap_or(stem);
    let type_words = screaming_words(stem);
    let cases = lower_cases(c_enum, &type_words, tags, true);
    let raw_type = if cases.iter().any(|case| exceeds_u32(&case.value)) { "UInt64" } else { "UInt32" };
    OptionSetDescriptor {
        name: type_name(&c_enum.name, options).replacen("FlagBits", "Flags", 1),
        raw_type: raw_type.to_string(),
        cases,
    }
}

fn lower_cases(c_enum: &CEnum, type_words: &[String], tags: &IndexSet<String>, strip_bit: bool) -> Vec<EnumCase> {
    let mut seen = IndexSet::new();
    let mut cases = Vec::with_capacity(c_enum.cases.len());
    for c_case in &c_enum.cases {
        let name = case_name(&c_case.name, type_words, tags, strip_bit);
        if name.is_empty() {
            warn!(enum_name = %c_enum.name, case = %c_case.name, "case name has no words, skipping");
            continue;
        }
        if !seen.insert(name.clone()) {
            warn!(enum_name = %c_enum.name, case = %c_case.name, swift_name = %name, "case name collides, keeping first");
            continue;
        }
        cases.push(EnumCase { name, value: c_case.value.clone() });
    }
    cases
}

fn type_name(c_name: &str, options: &LowerOptions) -> String {
    c_name.strip_prefix(options.c_prefix.as_str()).unwrap_or(c_name).to_string()
}

fn exceeds_u32(value: &str) -> bool {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.is_ok_and(|v| v > u64::from(u32::MAX))
}
