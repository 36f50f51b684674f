//! Error taxonomy for the registry, manifest and emitter stages.
//!
//! Every failure aborts the run: generation is a single deterministic pass and
//! partially-correct bindings are never written.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document is not well-formed markup.
    #[error("malformed registry at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// An offset-encoded case needs an extension number and neither the
    /// contribution nor its extension declares one.
    #[error(
        "extension `{extension}` contributes `{case_name}` to `{enum_name}` but declares no extension number"
    )]
    MissingExtensionNumber {
        enum_name: String,
        case_name: String,
        extension: String,
    },

    #[error("invalid integer `{value}` in attribute `{attribute}` of <{element}>")]
    InvalidInteger {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute { element: String, attribute: String },

    #[error("failed to read registry: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CodegenError {
    /// A generator referenced a member or parameter the naming context
    /// does not know about.
    #[error("`{name}` is not bound in the naming context of `{scope}`")]
    UnboundName { name: String, scope: String },

    #[error("`{scope}` pairs {fields} raw fields with {generators} value generators")]
    GeneratorCountMismatch {
        scope: String,
        fields: usize,
        generators: usize,
    },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
}
