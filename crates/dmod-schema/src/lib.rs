//! # dmod-schema — Declarative Model Type Descriptors
//!
//! Loads model type definitions written as data (YAML or JSON) into a
//! [`SchemaRegistry`] of frozen [`dmod_core::ModelType`]s.
//!
//! ## Descriptor Format
//!
//! ```yaml
//! types:
//!   - name: Name
//!     fields:
//!       - { name: first, type: String, required: true }
//!       - { name: last,  type: String, required: true }
//!   - name: Person
//!     fields:
//!       - { name: name,    type: Name, validate: true }
//!       - { name: friends, type: [Name], collection: true, validate: true }
//!       - { name: note,    type: [String, Integer] }
//! ```
//!
//! `type` is one name or a list of names: a built-in tag (`Any`, `Boolean`,
//! `Integer`, `Float`, `Number`, `String`, `List`, `Map`) or another model
//! type, either registered earlier or defined in the same document. Types
//! may appear in any order; `extends` names a parent type.
//!
//! ## Loading Guarantees
//!
//! - A document loads atomically: on any error the registry is unchanged.
//! - Unknown descriptor keys are rejected, like unknown construction keys.
//! - Field type references may be recursive, including a type referring to
//!   itself. `extends` chains must be acyclic.
//! - Built-in tag names are reserved and cannot name a model type.
//! - Definition-time checks of `dmod-core` (required collections, duplicate
//!   fields) apply unchanged.
//!
//! Descriptors declare fields only. Custom validation rules are attached in
//! code through [`dmod_core::ModelType::builder`], and such types can be
//! [`register`](SchemaRegistry::register)ed so documents can refer to them.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{FieldDescriptor, SchemaDocument, TypeDescriptor, TypeRef};
pub use error::{RegistryError, RegistryResult};
pub use registry::SchemaRegistry;
