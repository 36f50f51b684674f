//! Struct and class descriptors prepared by an external importer.
//!
//! ```json
//! {
//!   "structs": [{ "name": "Extent2D", "c_struct": { "name": "VkExtent2D", "members": [...] }, ... }],
//!   "classes": [{ "name": "Instance", "c_handle": "VkInstance", "commands": [...] }]
//! }
//! ```
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ManifestError;
use crate::ir::{ClassDescriptor, StructDescriptor};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

impl Manifest {
    pub fn from_json(path: &Path, source: &str) -> Result<Self, ManifestError> {
        from_str_with_path(source).map_err(|message| ManifestError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let source = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(path, &source)?;
        debug!(
            path = %path.display(),
            structs = manifest.structs.len(),
            classes = manifest.classes.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Concatenates manifests in the order given.
    pub fn load_all(paths: &[PathBuf]) -> Result<Self, ManifestError> {
        let mut merged = Self::default();
        for path in paths {
            merged.extend(Self::load(path)?);
        }
        Ok(merged)
    }

    pub fn extend(&mut self, other: Manifest) {
        self.structs.extend(other.structs);
        self.classes.extend(other.classes);
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClosureKind, ValueGen};

    const MANIFEST: &str = r#"{
        "structs": [{
            "name": "Extent2D",
            "c_struct": {
                "name": "VkExtent2D",
                "members": [{"name": "width", "type": "uint32_t"}, {"name": "height", "type": "uint32_t"}]
            },
            "members": [{"name": "width", "type": "UInt32"}, {"name": "height", "type": "UInt32"}],
            "c_value_generators": [
                {"kind": "direct", "member": "width"},
                {"kind": "direct", "member": "height"}
            ]
        }],
        "classes": [{
            "name": "Device",
            "c_handle": "VkDevice",
            "parent": {"name": "PhysicalDevice", "reference_name": "physicalDevice"},
            "commands": [{
                "name": "getDeviceProcAddr",
                "c_command": "vkGetDeviceProcAddr",
                "params": [{"name": "pName", "type": "String"}],
                "return_type": "PFN_vkVoidFunction",
                "closure_generators": [{"kind": "c_string", "member": "pName"}],
                "c_value_generators": [
                    {"kind": "literal", "text": "self.handle"},
                    {"kind": "c_string", "member": "pName"}
                ]
            }]
        }]
    }"#;

    #[test]
    fn decodes_descriptors_with_defaults() {
        let manifest = Manifest::from_json(Path::new("vk.json"), MANIFEST).unwrap();
        assert_eq!(manifest.structs.len(), 1);
        assert!(manifest.structs[0].closure_generators.is_empty());
        assert_eq!(
            manifest.structs[0].c_value_generators[1],
            ValueGen::Direct { member: "height".into() }
        );

        let device = &manifest.classes[0];
        assert!(device.nullable_handle);
        assert_eq!(device.parent.as_ref().unwrap().reference_name, "physicalDevice");
        let command = &device.commands[0];
        assert_eq!(command.closure_generators[0].kind, ClosureKind::CString);
        assert_eq!(command.return_type, "PFN_vkVoidFunction");
    }

    #[test]
    fn command_return_type_defaults_to_void() {
        let manifest = Manifest::from_json(
            Path::new("m.json"),
            r#"{"classes": [{"name": "Queue", "c_handle": "VkQueue", "commands": [
                {"name": "queueWaitIdle", "c_command": "vkQueueWaitIdle"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.classes[0].commands[0].return_type, "Void");
    }

    #[test]
    fn decode_errors_name_the_json_path() {
        let err = Manifest::from_json(
            Path::new("broken.json"),
            r#"{"structs": [{"name": "A", "c_struct": {"name": "VkA"},
                "c_value_generators": [{"kind": "teleport", "member": "x"}]}]}"#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid manifest broken.json: at JSON path structs[0].c_value_generators[0]"), "{message}");
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let err = Manifest::from_json(Path::new("m.json"), r#"{"unions": []}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Decode { .. }));
    }

    #[test]
    fn extend_concatenates_in_order() {
        let mut first = Manifest::from_json(Path::new("a.json"), MANIFEST).unwrap();
        let second = first.clone();
        first.extend(second);
        assert_eq!(first.structs.len(), 2);
        assert_eq!(first.classes.len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Manifest::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
