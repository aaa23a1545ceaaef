//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the toolkit. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Configuration errors ([`SchemaError`]) are detected while a model type
//!   is being built and abort the build. They signal programmer mistakes.
//! - Construction and accessor errors ([`ModelError::UnknownField`]) fail
//!   loudly on any name the schema does not declare.
//! - Validation failures are not errors. They live in an
//!   [`ErrorCollector`]; [`ModelError::Invalid`] exists only so that
//!   `assert_valid` can surface the full collector as a single failure.

use thiserror::Error;

use crate::collector::ErrorCollector;

/// Top-level error type for the toolkit.
#[derive(Error, Debug)]
pub enum DmodError {
    /// Model type definition rejected.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Model construction, access, or assertion failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Conversion to or from the primitive tree failed.
    #[error("primitive conversion error: {0}")]
    Primitive(#[from] PrimitiveError),
}

/// Configuration error raised while defining a model type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A collection's empty state already expresses absence, so requiredness
    /// on a collection is rejected.
    #[error("field '{field}': fields cannot be both collection and required")]
    RequiredCollection {
        /// Offending field name.
        field: String,
    },

    /// A field was declared with an explicitly empty type set.
    #[error("field '{field}': declared type set is empty")]
    EmptyTypeSet {
        /// Offending field name.
        field: String,
    },

    /// A field name is already declared on the type or one of its ancestors.
    #[error("type '{type_name}' declares field '{field}' more than once")]
    DuplicateField {
        /// Type being defined.
        type_name: String,
        /// Repeated field name.
        field: String,
    },

    /// A field-scoped validation rule names a field absent from the schema.
    #[error("type '{type_name}' has a validation rule for unknown field '{field}'")]
    UnknownRuleField {
        /// Type being defined.
        type_name: String,
        /// Field the rule refers to.
        field: String,
    },
}

/// Error raised by a model instance.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A construction key or accessor names no declared field.
    #[error("type '{type_name}' has no field called '{field}'")]
    UnknownField {
        /// Type of the instance.
        type_name: String,
        /// Name that was not recognised.
        field: String,
    },

    /// `assert_valid` found validation errors.
    #[error("this {type_name} object contains the following errors: {errors}")]
    Invalid {
        /// Type of the instance.
        type_name: String,
        /// The complete per-path error map, computed exactly once.
        errors: ErrorCollector,
    },
}

/// Error during conversion between typed values and the primitive tree.
#[derive(Error, Debug)]
pub enum PrimitiveError {
    /// NaN and infinities have no primitive-tree representation.
    #[error("float value {value} at '{path}' has no primitive representation")]
    NonFiniteFloat {
        /// Path of the value within the serialized tree.
        path: String,
        /// The rejected value.
        value: f64,
    },

    /// A model type was asked to deserialize something other than a mapping.
    #[error("cannot build '{type_name}' from a primitive {found}; expected a mapping")]
    ExpectedMap {
        /// Target model type.
        type_name: String,
        /// Primitive kind that was supplied.
        found: &'static str,
    },

    /// A collection field held something other than a sequence.
    #[error("collection field '{field}' holds a primitive {found}; expected a sequence")]
    ExpectedSequence {
        /// Collection field name.
        field: String,
        /// Primitive kind that was supplied.
        found: &'static str,
    },

    /// Constructing the target instance failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}
