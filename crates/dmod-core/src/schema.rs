//! # Model Types
//!
//! A [`ModelType`] is the frozen schema of one concrete model type: its name,
//! its optional parent, the ordered field list and the ordered rule list.
//!
//! ## Inheritance
//!
//! A subtype's fields are its parent's fields in their original order,
//! followed by its own. Rules merge the same way. Nothing is overridden or
//! reordered; redeclaring an inherited field name is a configuration error.
//!
//! ## Definition-Time Checks
//!
//! [`ModelTypeBuilder::build`] rejects, in declaration order:
//!
//! - a field both required and collection,
//! - a field with an empty type set,
//! - a field name already present in the schema,
//! - a field-scoped rule naming a field absent from the schema.
//!
//! A type that fails any of these is never produced.
//!
//! ## Recursive Types
//!
//! A field may reference a type by name with [`TypeTag::named`]. `build`
//! binds references naming the type being built, so a type can contain
//! instances of itself. References to types defined later are bound with
//! [`ModelType::bind_references`] once the target exists.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as Primitive;

use crate::error::{PrimitiveError, SchemaError};
use crate::field::{Field, FieldOptions};
use crate::instance::ModelInstance;
use crate::primitive;
use crate::rule::ValidationRule;
use crate::value::{ModelRef, TypeTag};

/// Frozen schema of a concrete model type.
pub struct ModelType {
    name: String,
    parent: Option<Arc<ModelType>>,
    fields: Vec<Field>,
    own_field_start: usize,
    rules: Vec<ValidationRule>,
}

impl ModelType {
    /// Start defining a model type called `name`.
    pub fn builder(name: impl Into<String>) -> ModelTypeBuilder {
        ModelTypeBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ModelType>> {
        self.parent.as_ref()
    }

    /// Every field, inherited first, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields declared by this type itself.
    pub fn own_fields(&self) -> &[Field] {
        &self.fields[self.own_field_start..]
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Every validation rule, inherited first, in declaration order.
    pub fn validation_rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// True if this type is `other` or extends it, directly or transitively.
    pub fn is_a(&self, other: &ModelType) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_a(other))
    }

    /// Names of model references in this schema that are still unbound.
    pub fn unbound_references(&self) -> impl Iterator<Item = &str> {
        model_refs(&self.fields)
            .filter(|reference| !reference.is_bound())
            .map(ModelRef::name)
    }

    /// Bind every unbound reference naming `target`, inherited ones
    /// included. Returns how many were bound.
    ///
    /// A reference from a type to itself is held weakly. Any other binding
    /// keeps `target` alive for as long as this type lives, so mutually
    /// recursive types keep each other alive.
    pub fn bind_references(self: &Arc<Self>, target: &Arc<ModelType>) -> usize {
        let owner = Arc::downgrade(self);
        let mut bound = 0;
        for reference in model_refs(&self.fields) {
            if reference.name() != target.name() {
                continue;
            }
            let newly_bound = if Arc::ptr_eq(self, target) {
                reference.bind_owner(&owner)
            } else {
                reference.bind(target)
            };
            if newly_bound {
                bound += 1;
            }
        }
        bound
    }

    /// A fresh instance with every field at its default value.
    pub fn instantiate(self: &Arc<Self>) -> ModelInstance {
        ModelInstance::new(self)
    }

    /// Rebuild an instance of this type from a primitive tree.
    ///
    /// # Errors
    ///
    /// See [`primitive::from_primitive`].
    pub fn from_primitive(
        self: &Arc<Self>,
        primitive: Option<&Primitive>,
    ) -> Result<ModelInstance, PrimitiveError> {
        primitive::from_primitive(self, primitive)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("fields", &self.fields)
            .field("rules", &self.rules)
            .finish()
    }
}

/// Accumulates a model type definition.
///
/// Nothing is checked until [`build`](Self::build), so a definition reads
/// top to bottom like a declaration.
pub struct ModelTypeBuilder {
    name: String,
    parent: Option<Arc<ModelType>>,
    fields: Vec<(String, FieldOptions)>,
    rules: Vec<ValidationRule>,
}

impl ModelTypeBuilder {
    /// Inherit the fields and rules of `parent`.
    pub fn extends(mut self, parent: &Arc<ModelType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, options: FieldOptions) -> Self {
        self.fields.push((name.into(), options));
        self
    }

    /// Attach a validation rule.
    pub fn validate(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Freeze the definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found; see the module docs.
    pub fn build(self) -> Result<Arc<ModelType>, SchemaError> {
        let (mut fields, mut rules) = match &self.parent {
            Some(parent) => (parent.fields.clone(), parent.rules.clone()),
            None => (Vec::new(), Vec::new()),
        };
        let own_field_start = fields.len();

        for (name, options) in self.fields {
            let field = Field::new(name, options)?;
            if fields.iter().any(|f| f.name() == field.name()) {
                return Err(SchemaError::DuplicateField {
                    type_name: self.name,
                    field: field.name().to_string(),
                });
            }
            fields.push(field);
        }

        for rule in &self.rules {
            if let Some(target) = rule.field_name() {
                if !fields.iter().any(|f| f.name() == target) {
                    return Err(SchemaError::UnknownRuleField {
                        type_name: self.name,
                        field: target.to_string(),
                    });
                }
            }
        }
        rules.extend(self.rules);

        tracing::debug!(
            type_name = %self.name,
            fields = fields.len(),
            rules = rules.len(),
            "model type defined"
        );

        Ok(Arc::new_cyclic(|owner| {
            for reference in model_refs(&fields[own_field_start..]) {
                if reference.name() == self.name {
                    reference.bind_owner(owner);
                }
            }
            ModelType {
                name: self.name,
                parent: self.parent,
                fields,
                own_field_start,
                rules,
            }
        }))
    }
}

fn model_refs(fields: &[Field]) -> impl Iterator<Item = &ModelRef> {
    fields.iter().flat_map(Field::types).filter_map(|tag| match tag {
        TypeTag::Model(reference) => Some(reference),
        _ => None,
    })
}
