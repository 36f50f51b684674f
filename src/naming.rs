//! Swift naming rules: keyword escaping and C-to-Swift identifier conversion.
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

const SWIFT_KEYWORDS: &[&str] = &[
    "associatedtype", "class", "deinit", "enum", "extension", "fileprivate", "func", "import",
    "init", "inout", "internal", "let", "open", "operator", "private", "protocol", "public",
    "rethrows", "static", "struct", "subscript", "typealias", "var", "break", "case", "continue",
    "default", "defer", "do", "else", "fallthrough", "for", "guard", "if", "in", "repeat",
    "return", "switch", "where", "while", "as", "catch", "false", "is", "nil", "super", "self",
    "Self", "throw", "throws", "true", "try",
];

// `VkPresentMode` -> Vk, Present, Mode
static CAMEL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][a-z0-9]*|[a-z0-9]+").unwrap());

/// Backtick-escapes reserved words so they can be used as declarations.
pub fn safe_name(name: &str) -> String {
    if SWIFT_KEYWORDS.contains(&name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

/// Removes a trailing vendor tag (`KHR`, `EXT`, ...) from a C type name.
pub fn strip_tag<'a>(name: &'a str, tags: &IndexSet<String>) -> (&'a str, Option<&'a str>) {
    for tag in tags {
        if let Some(stem) = name.strip_suffix(tag.as_str()) {
            // `VkFooKHR` yes, `VkLATCH` no
            if stem.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()) {
                return (stem, Some(&name[stem.len()..]));
            }
        }
    }
    (name, None)
}

/// `VkImageType` -> `["VK", "IMAGE", "TYPE"]`
pub fn screaming_words(camel: &str) -> Vec<String> {
    CAMEL_WORD
        .find_iter(camel)
        .map(|m| m.as_str().to_ascii_uppercase())
        .collect()
}

/// Converts a C case name to a lower-camel Swift case name, relative to the
/// words of its enclosing type.
///
/// The longest run of leading words shared with `type_words` is dropped,
/// then words are joined in lower camel case with vendor tags kept upper
/// case. A result that would start with a digit borrows the last dropped
/// word (`VK_IMAGE_TYPE_2D` -> `type2D`). A name with no words yields an
/// empty string.
pub fn case_name(c_case: &str, type_words: &[String], tags: &IndexSet<String>, strip_bit: bool) -> String {
    let words: Vec<&str> = c_case.split('_').filter(|w| !w.is_empty()).collect();
    let mut shared = words
        .iter()
        .zip(type_words)
        .take_while(|(word, type_word)| **word == type_word.as_str())
        .count();
    if shared == words.len() {
        shared = words.len().saturating_sub(1);
    }
    let dropped = shared.checked_sub(1).map(|i| words[i]);
    let mut rest: Vec<&str> = words[shared..].to_vec();

    if strip_bit {
        let tail_is_tag = rest.last().is_some_and(|w| tags.contains(*w));
        let bit_index = if tail_is_tag { rest.len().checked_sub(2) } else { rest.len().checked_sub(1) };
        if let Some(i) = bit_index {
            if rest[i] == "BIT" && rest.len() > 1 {
                rest.remove(i);
            }
        }
    }

    let mut out = String::new();
    for (i, word) in rest.iter().enumerate() {
        if tags.contains(*word) || word.starts_with(|c: char| c.is_ascii_digit()) {
            out.push_str(word);
        } else if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        let prefix = dropped.map(str::to_ascii_lowercase).unwrap_or_else(|| "_".to_string());
        out.insert_str(0, &prefix);
    }
    out
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> IndexSet<String> {
        ["KHR", "EXT", "NV"].into_iter().map(String::from).collect()
    }

    #[test]
    fn escapes_keywords_only() {
        assert_eq!(safe_name("repeat"), "`repeat`");
        assert_eq!(safe_name("default"), "`default`");
        assert_eq!(safe_name("width"), "width");
    }

    #[test]
    fn strips_vendor_tag_suffix() {
        assert_eq!(strip_tag("VkPresentModeKHR", &tags()), ("VkPresentMode", Some("KHR")));
        assert_eq!(strip_tag("VkFormat", &tags()), ("VkFormat", None));
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(screaming_words("VkImageType"), ["VK", "IMAGE", "TYPE"]);
        assert_eq!(screaming_words("VkDebugReportObjectType"), ["VK", "DEBUG", "REPORT", "OBJECT", "TYPE"]);
    }

    #[test]
    fn converts_case_names() {
        let tags = tags();
        let result = screaming_words("VkResult");
        assert_eq!(case_name("VK_SUCCESS", &result, &tags, false), "success");
        assert_eq!(case_name("VK_ERROR_OUT_OF_DATE_KHR", &result, &tags, false), "errorOutOfDateKHR");

        let image_type = screaming_words("VkImageType");
        assert_eq!(case_name("VK_IMAGE_TYPE_2D", &image_type, &tags, false), "type2D");

        let format = screaming_words("VkFormat");
        assert_eq!(case_name("VK_FORMAT_R8G8B8A8_UNORM", &format, &tags, false), "r8g8b8a8Unorm");
        assert_eq!(case_name("___", &format, &tags, false), "");
    }

    #[test]
    fn strips_bit_words_for_bitmasks() {
        let tags = tags();
        let cull = screaming_words("VkCullMode");
        assert_eq!(case_name("VK_CULL_MODE_FRONT_BIT", &cull, &tags, true), "front");
        assert_eq!(case_name("VK_CULL_MODE_FRONT_AND_BACK", &cull, &tags, true), "frontAndBack");
        let transform = screaming_words("VkSurfaceTransform");
        assert_eq!(
            case_name("VK_SURFACE_TRANSFORM_IDENTITY_BIT_KHR", &transform, &tags, true),
            "identityKHR"
        );
        let samples = screaming_words("VkSampleCount");
        assert_eq!(case_name("VK_SAMPLE_COUNT_1_BIT", &samples, &tags, true), "count1");
    }
}
