//! Registry-specific error types.
//!
//! Parse errors carry the origin of the document (a file path, or
//! `<inline>` for string input) so a failing descriptor can be located.

use std::path::PathBuf;

use dmod_core::{PrimitiveError, SchemaError};
use thiserror::Error;

/// Errors that can occur while loading descriptors or using the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// YAML parsing failed.
    #[error("failed to parse YAML descriptor {origin}: {source}")]
    YamlParse {
        origin: String,
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON descriptor {origin}: {source}")]
    JsonParse {
        origin: String,
        source: serde_json::Error,
    },

    /// A descriptor file was not found.
    #[error("descriptor file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// A type name is defined twice.
    #[error("model type {type_name:?} is already defined")]
    DuplicateType { type_name: String },

    /// A model type would shadow a built-in tag name.
    #[error("model type name {type_name:?} is reserved for a built-in type")]
    ReservedTypeName { type_name: String },

    /// A descriptor refers to a type that is neither built in, registered,
    /// nor defined in the same document.
    #[error("model type {type_name:?} refers to unknown type {reference:?}")]
    UnknownReference {
        type_name: String,
        reference: String,
    },

    /// `extends` chains form a cycle.
    #[error("model type {type_name:?} is part of an inheritance cycle through {reference:?}")]
    CyclicReference {
        type_name: String,
        reference: String,
    },

    /// Lookup of a type that is not registered.
    #[error("unknown model type: {type_name:?}")]
    UnknownType { type_name: String },

    /// A descriptor violated a definition-time check.
    #[error("invalid model type definition: {0}")]
    Schema(#[from] SchemaError),

    /// A document could not be converted into an instance.
    #[error("cannot build instance: {0}")]
    Primitive(#[from] PrimitiveError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type RegistryResult<T> = Result<T, RegistryError>;
