//! # dmod-core — Declarative Object Modeling Engine
//!
//! This crate is the engine of the domain-model toolkit. Any data-bearing
//! type declared through it gets typed fields with checked accessors, a
//! validation engine producing structured per-field error reports,
//! recursive validity checking across nested object graphs, value equality
//! and inspection, and lossless conversion to and from an untyped primitive
//! tree of maps, sequences and scalars.
//!
//! ## Key Design Principles
//!
//! 1. **Closed value model.** Runtime values are the [`Value`] enum and
//!    declared types are the [`TypeTag`] enum. Type checks are exhaustive
//!    `match`es, never ad hoc runtime class inspection.
//!
//! 2. **Frozen schemas.** A [`ModelType`] is built once through
//!    [`ModelType::builder`] and shared behind an `Arc`. Its field list is
//!    the parent's fields followed by its own, append-only. Configuration
//!    mistakes (required collections, duplicate names, rules naming unknown
//!    fields) abort the build with a [`SchemaError`].
//!
//! 3. **Validation errors are data.** [`ModelInstance::errors`] returns an
//!    [`ErrorCollector`]; it never fails for invalid data. Only
//!    [`ModelInstance::assert_valid`] turns an invalid model into an `Err`.
//!
//! 4. **Ordering is a contract.** Built-in field checks run in schema order,
//!    then custom rules in declaration order, each rule observing the
//!    collector as left by everything before it.
//!
//! 5. **Structural serialization, guided deserialization.** [`to_primitive`]
//!    walks the runtime shape of a value. [`from_primitive`] is driven by the
//!    target type's field declarations.
//!
//! ## Crate Policy
//!
//! - Synchronous, no I/O, no internal synchronization.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Values own their nested models, so every object graph is a tree and
//!   recursion depth is bounded by its depth. Types may still be recursive;
//!   see [`value::ModelRef`].

pub mod collector;
pub mod error;
pub mod field;
pub mod instance;
pub mod primitive;
pub mod rule;
pub mod schema;
pub mod validator;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use collector::{ErrorCollector, FieldErrors, IntoErrors};
pub use error::{DmodError, ModelError, PrimitiveError, SchemaError};
pub use field::{Field, FieldOptions};
pub use instance::{ModelInstance, Validable};
pub use primitive::{from_primitive, to_primitive};
pub use rule::{ExecutionPolicy, RuleScope, ValidationRule};
pub use schema::{ModelType, ModelTypeBuilder};
pub use value::{ModelRef, TypeTag, Value};
