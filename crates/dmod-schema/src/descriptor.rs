//! Serde model of schema descriptor documents.

use serde::{Deserialize, Serialize};

/// A descriptor document: an ordered list of type definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

/// Definition of one model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDescriptor {
    pub name: String,
    /// Parent type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Every type name this descriptor refers to, parent first.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.extends.as_deref().into_iter().chain(
            self.fields
                .iter()
                .filter_map(|f| f.types.as_ref())
                .flat_map(TypeRef::names),
        )
    }
}

/// Definition of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    pub name: String,
    /// Accepted types. Omitted means `Any`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeRef>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub validate: bool,
}

/// One type name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    One(String),
    Many(Vec<String>),
}

impl TypeRef {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            TypeRef::One(name) => std::slice::from_ref(name),
            TypeRef::Many(names) => names,
        };
        names.iter().map(String::as_str)
    }
}
