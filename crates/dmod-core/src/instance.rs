//! # Model Instances
//!
//! A [`ModelInstance`] holds one value per field of its [`ModelType`] and
//! owns construction, accessors, equality, inspection, and the orchestration
//! of `errors()` and `flat_errors()`.
//!
//! ## Construction
//!
//! Every field starts at its default: `Null` for scalars, an empty list for
//! collections. Supplied attributes are then applied one by one. A key that
//! names no declared field fails the whole construction.
//!
//! ## Validation Order
//!
//! `errors()` runs the built-in check of every field in schema order, then
//! every rule in merged declaration order. Each rule's policy is evaluated
//! against the collector as it stands at that moment. Nothing is cached:
//! rules may observe external state, so every call recomputes from scratch.
//!
//! ## Nested Flattening
//!
//! `flat_errors()` re-keys the flattened errors of nested models under
//! `field.path` (scalars) or `field[index].path` (collections). There is no
//! cycle detection; a self-referential graph recurses without bound.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Primitive;

use crate::collector::ErrorCollector;
use crate::error::{ModelError, PrimitiveError};
use crate::field::Field;
use crate::primitive;
use crate::schema::ModelType;
use crate::value::Value;

static NULL: Value = Value::Null;

/// Capability of a value that can report its own validity.
pub trait Validable {
    /// True iff the value has no validation errors.
    fn is_valid(&self) -> bool;

    /// Errors of the value and everything nested beneath it, keyed by path.
    fn flat_errors(&self) -> ErrorCollector;
}

/// An instance of a model type.
#[derive(Clone)]
pub struct ModelInstance {
    model_type: Arc<ModelType>,
    values: IndexMap<String, Value>,
}

impl ModelInstance {
    /// A new instance with every field at its default value.
    pub fn new(model_type: &Arc<ModelType>) -> Self {
        let values = model_type
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), f.default_value()))
            .collect();
        Self {
            model_type: Arc::clone(model_type),
            values,
        }
    }

    /// A new instance with the given attributes applied over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownField` for the first key that names no
    /// declared field.
    pub fn from_attributes<I, K, V>(
        model_type: &Arc<ModelType>,
        attributes: I,
    ) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut instance = Self::new(model_type);
        for (name, value) in attributes {
            instance.set(name.as_ref(), value)?;
        }
        Ok(instance)
    }

    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    /// Read a field.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownField` if `field` is not declared.
    pub fn get(&self, field: &str) -> Result<&Value, ModelError> {
        self.values.get(field).ok_or_else(|| self.unknown(field))
    }

    /// Mutably borrow a field.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownField` if `field` is not declared.
    pub fn get_mut(&mut self, field: &str) -> Result<&mut Value, ModelError> {
        self.values
            .get_mut(field)
            .ok_or_else(|| ModelError::UnknownField {
                type_name: self.model_type.name().to_string(),
                field: field.to_string(),
            })
    }

    /// Write a field.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownField` if `field` is not declared.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        *self.get_mut(field)? = value.into();
        Ok(())
    }

    /// Every field and its value, in schema order.
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Consume the instance, keeping its attribute mapping.
    pub fn into_attributes(self) -> IndexMap<String, Value> {
        self.values
    }

    /// True iff every field is absent.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(Value::is_null)
    }

    /// Run every field check, then every rule, into a fresh collector.
    pub fn errors(&self) -> ErrorCollector {
        let mut errors = ErrorCollector::new();

        for field in self.model_type.fields() {
            errors.add(field.name(), field.errors(self.value_of(field)));
        }

        for (index, rule) in self.model_type.validation_rules().iter().enumerate() {
            if !rule.execute(self, &mut errors) {
                tracing::trace!(
                    type_name = %self.model_type.name(),
                    rule = index,
                    field = ?rule.field_name(),
                    "validation rule skipped by execution policy"
                );
            }
        }

        errors
    }

    /// `errors()` plus the re-keyed errors of every nested model reachable
    /// through fields flagged for nested validation.
    pub fn flat_errors(&self) -> ErrorCollector {
        let mut errors = self.errors();

        for field in self.model_type.fields() {
            if !field.validates_nested() {
                continue;
            }
            let name = field.name();
            let value = self.value_of(field);

            if field.is_collection() {
                let Some(elements) = value.as_list() else {
                    continue;
                };
                for (index, element) in elements.iter().enumerate() {
                    if let Some(nested) = element.as_validable() {
                        errors.merge_with(nested.flat_errors(), |path| {
                            format!("{name}[{index}].{path}")
                        });
                    }
                }
            } else if let Some(nested) = value.as_validable() {
                errors.merge_with(nested.flat_errors(), |path| format!("{name}.{path}"));
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Fail with the complete error map if the instance is invalid.
    ///
    /// `errors()` is computed exactly once, so the reported map is the one
    /// that decided the outcome even when rules are non-deterministic.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Invalid` carrying every error.
    pub fn assert_valid(&self) -> Result<(), ModelError> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Invalid {
                type_name: self.model_type.name().to_string(),
                errors,
            })
        }
    }

    /// `#<Type field: value, ...>` with each value in its inspect form.
    pub fn inspect(&self) -> String {
        if self.values.is_empty() {
            return format!("#<{}>", self.model_type.name());
        }
        let fields: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| format!("{name}: {}", value.inspect()))
            .collect();
        format!("#<{} {}>", self.model_type.name(), fields.join(", "))
    }

    /// Serialize into the primitive tree.
    ///
    /// # Errors
    ///
    /// See [`primitive::to_primitive`].
    pub fn to_primitive(&self) -> Result<Primitive, PrimitiveError> {
        primitive::model_to_primitive(self)
    }

    fn value_of(&self, field: &Field) -> &Value {
        self.values.get(field.name()).unwrap_or(&NULL)
    }

    fn unknown(&self, field: &str) -> ModelError {
        ModelError::UnknownField {
            type_name: self.model_type.name().to_string(),
            field: field.to_string(),
        }
    }
}

impl Validable for ModelInstance {
    fn is_valid(&self) -> bool {
        ModelInstance::is_valid(self)
    }

    fn flat_errors(&self) -> ErrorCollector {
        ModelInstance::flat_errors(self)
    }
}

impl PartialEq for ModelInstance {
    /// Same concrete type and every field equal.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.model_type, &other.model_type) && self.values == other.values
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
