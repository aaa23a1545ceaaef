//! # Field Descriptors
//!
//! A [`Field`] is the immutable description of one model attribute: its
//! name, the set of types it accepts, and the required, collection and
//! nested-validation flags. Fields are created from [`FieldOptions`] while a
//! model type is being built and never change afterwards.

use crate::error::SchemaError;
use crate::validator;
use crate::value::{TypeTag, Value};

/// Declaration options for a field.
///
/// Leaving the type set unset declares the field as `[Any]`.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    types: Option<Vec<TypeTag>>,
    required: bool,
    collection: bool,
    validate: bool,
}

impl FieldOptions {
    /// Options for an untyped, optional, scalar field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a single accepted type.
    pub fn of_type(mut self, tag: TypeTag) -> Self {
        self.types = Some(vec![tag]);
        self
    }

    /// Declare the full set of accepted types.
    pub fn of_types(mut self, tags: impl IntoIterator<Item = TypeTag>) -> Self {
        self.types = Some(tags.into_iter().collect());
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as an ordered collection of values.
    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    /// Validate nested values through their own validity check.
    pub fn validate(mut self) -> Self {
        self.validate = true;
        self
    }
}

/// Descriptor of one declared attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    types: Vec<TypeTag>,
    required: bool,
    collection: bool,
    validate_nested: bool,
}

impl Field {
    /// Create a field descriptor.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::RequiredCollection` if the options mark the field
    /// both required and collection, and `SchemaError::EmptyTypeSet` if an
    /// explicit type set was empty.
    pub fn new(name: impl Into<String>, options: FieldOptions) -> Result<Self, SchemaError> {
        let name = name.into();

        if options.required && options.collection {
            return Err(SchemaError::RequiredCollection { field: name });
        }

        let types = match options.types {
            Some(types) if types.is_empty() => {
                return Err(SchemaError::EmptyTypeSet { field: name });
            }
            Some(types) => types,
            None => vec![TypeTag::Any],
        };

        Ok(Self {
            name,
            types,
            required: options.required,
            collection: options.collection,
            validate_nested: options.validate,
        })
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared types, never empty.
    pub fn types(&self) -> &[TypeTag] {
        &self.types
    }

    /// The single declared type, if the field is mono-typed.
    pub fn monotype(&self) -> Option<&TypeTag> {
        match self.types.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn validates_nested(&self) -> bool {
        self.validate_nested
    }

    /// Value a freshly constructed instance holds for this field.
    pub fn default_value(&self) -> Value {
        if self.collection {
            Value::List(Vec::new())
        } else {
            Value::Null
        }
    }

    /// Validate `value` against this declaration.
    pub fn errors(&self, value: &Value) -> Vec<String> {
        validator::errors(self, value)
    }

    /// Types joined as `A or B`, as they appear in messages.
    pub(crate) fn type_list(&self) -> String {
        self.types
            .iter()
            .map(TypeTag::name)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
