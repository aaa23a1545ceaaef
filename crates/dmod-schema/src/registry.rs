//! # Schema Registry
//!
//! Name-indexed store of frozen model types, fed by descriptor documents or
//! by types built in code.
//!
//! ## Resolution
//!
//! A field may refer to a built-in tag, a registered type, or any type of
//! the same document, itself included. References to types of the document
//! are bound once every type is built, so types may be recursive or refer to
//! each other. Every name is checked before anything is built.
//!
//! Parents must exist before their subtypes, since a subtype copies its
//! parent's fields. Loading repeatedly builds every pending descriptor whose
//! parent is available; a pass that builds nothing means the remaining
//! `extends` chains form a cycle.
//!
//! Built-in tag names are reserved and cannot name a model type.
//!
//! Types are staged while a document loads and committed only when every
//! descriptor has been built, so a failed load leaves the registry as it was.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use dmod_core::{ErrorCollector, FieldOptions, ModelInstance, ModelType, TypeTag};
use indexmap::IndexMap;
use serde_json::Value as Primitive;

use crate::descriptor::{SchemaDocument, TypeDescriptor};
use crate::error::{RegistryError, RegistryResult};

/// Origin label used for documents that did not come from a file.
const INLINE_ORIGIN: &str = "<inline>";

/// Registry of model types by name.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    types: IndexMap<String, Arc<ModelType>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the types of a YAML document.
    pub fn from_yaml_str(yaml: &str) -> RegistryResult<Self> {
        let mut registry = Self::new();
        registry.load_yaml_str(yaml)?;
        Ok(registry)
    }

    /// A registry holding the types of a JSON document.
    pub fn from_json_str(json: &str) -> RegistryResult<Self> {
        let mut registry = Self::new();
        registry.load_json_str(json)?;
        Ok(registry)
    }

    /// Add a type built in code so that descriptors can refer to it.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ReservedTypeName` for a built-in tag name.
    /// - `RegistryError::DuplicateType` if the name is taken.
    pub fn register(&mut self, model_type: Arc<ModelType>) -> RegistryResult<()> {
        check_not_reserved(model_type.name())?;
        if self.types.contains_key(model_type.name()) {
            return Err(RegistryError::DuplicateType {
                type_name: model_type.name().to_string(),
            });
        }
        self.types.insert(model_type.name().to_string(), model_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModelType>> {
        self.types.get(name)
    }

    /// Look up a type, failing if it is not registered.
    pub fn require(&self, name: &str) -> RegistryResult<&Arc<ModelType>> {
        self.get(name).ok_or_else(|| RegistryError::UnknownType {
            type_name: name.to_string(),
        })
    }

    /// Registered type names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Load every type of a YAML document.
    pub fn load_yaml_str(&mut self, yaml: &str) -> RegistryResult<Vec<Arc<ModelType>>> {
        let document = parse_yaml(yaml, INLINE_ORIGIN)?;
        self.load_document(document)
    }

    /// Load every type of a JSON document.
    pub fn load_json_str(&mut self, json: &str) -> RegistryResult<Vec<Arc<ModelType>>> {
        let document = parse_json(json, INLINE_ORIGIN)?;
        self.load_document(document)
    }

    /// Load a descriptor file. `.json` files are read as JSON, everything
    /// else as YAML.
    pub fn load_path(&mut self, path: &Path) -> RegistryResult<Vec<Arc<ModelType>>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RegistryError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RegistryError::Io(e)
            }
        })?;
        let origin = path.display().to_string();
        let document = if path.extension().is_some_and(|ext| ext == "json") {
            parse_json(&content, &origin)?
        } else {
            parse_yaml(&content, &origin)?
        };
        self.load_document(document)
    }

    /// Build and register every type of `document`, atomically.
    ///
    /// Returns the new types in the order they were built.
    pub fn load_document(
        &mut self,
        document: SchemaDocument,
    ) -> RegistryResult<Vec<Arc<ModelType>>> {
        let mut pending_names = HashSet::new();
        for desc in &document.types {
            check_not_reserved(&desc.name)?;
            if self.types.contains_key(&desc.name) || !pending_names.insert(desc.name.as_str()) {
                return Err(RegistryError::DuplicateType {
                    type_name: desc.name.clone(),
                });
            }
        }

        for desc in &document.types {
            let is_model =
                |name: &str| self.types.contains_key(name) || pending_names.contains(name);
            let unknown = desc
                .extends
                .as_deref()
                .filter(|parent| !is_model(parent))
                .or_else(|| {
                    desc.references()
                        .find(|name| TypeTag::builtin(name).is_none() && !is_model(name))
                });
            if let Some(reference) = unknown {
                return Err(RegistryError::UnknownReference {
                    type_name: desc.name.clone(),
                    reference: reference.to_string(),
                });
            }
        }

        let mut staged: IndexMap<String, Arc<ModelType>> = IndexMap::new();
        let mut pending: Vec<&TypeDescriptor> = document.types.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();

            for desc in pending {
                let ready = desc
                    .extends
                    .as_deref()
                    .map_or(true, |parent| self.lookup(&staged, parent).is_some());
                if ready {
                    let model_type = self.build(desc, &staged)?;
                    staged.insert(desc.name.clone(), model_type);
                } else {
                    deferred.push(desc);
                }
            }

            if deferred.len() == before {
                let desc = deferred[0];
                return Err(RegistryError::CyclicReference {
                    type_name: desc.name.clone(),
                    reference: desc.extends.clone().unwrap_or_default(),
                });
            }
            pending = deferred;
        }

        for model_type in staged.values() {
            let names: Vec<String> = model_type
                .unbound_references()
                .map(str::to_string)
                .collect();
            for name in names {
                if let Some(target) = staged.get(&name) {
                    model_type.bind_references(target);
                }
            }
        }

        let built: Vec<_> = staged.values().cloned().collect();
        for (name, model_type) in staged {
            tracing::debug!(
                type_name = %name,
                fields = model_type.fields().len(),
                "registered model type"
            );
            self.types.insert(name, model_type);
        }
        Ok(built)
    }

    /// Rebuild an instance of the named type from a primitive tree.
    pub fn from_primitive(
        &self,
        type_name: &str,
        primitive: &Primitive,
    ) -> RegistryResult<ModelInstance> {
        let model_type = self.require(type_name)?;
        Ok(model_type.from_primitive(Some(primitive))?)
    }

    /// Rebuild a document as the named type and return its flattened errors.
    ///
    /// An empty collector means the document is valid.
    pub fn validate_document(
        &self,
        type_name: &str,
        primitive: &Primitive,
    ) -> RegistryResult<ErrorCollector> {
        let instance = self.from_primitive(type_name, primitive)?;
        Ok(instance.flat_errors())
    }

    fn lookup<'a>(
        &'a self,
        staged: &'a IndexMap<String, Arc<ModelType>>,
        name: &str,
    ) -> Option<&'a Arc<ModelType>> {
        self.types.get(name).or_else(|| staged.get(name))
    }

    /// Built-in tag, existing type, or a reference bound after the load.
    fn resolve_tag(&self, staged: &IndexMap<String, Arc<ModelType>>, name: &str) -> TypeTag {
        if let Some(tag) = TypeTag::builtin(name) {
            return tag;
        }
        match self.lookup(staged, name) {
            Some(model_type) => TypeTag::from(model_type),
            None => TypeTag::named(name),
        }
    }

    fn build(
        &self,
        desc: &TypeDescriptor,
        staged: &IndexMap<String, Arc<ModelType>>,
    ) -> RegistryResult<Arc<ModelType>> {
        let mut builder = ModelType::builder(desc.name.as_str());

        if let Some(parent) = &desc.extends {
            let parent =
                self.lookup(staged, parent)
                    .ok_or_else(|| RegistryError::UnknownReference {
                        type_name: desc.name.clone(),
                        reference: parent.clone(),
                    })?;
            builder = builder.extends(parent);
        }

        for field in &desc.fields {
            let mut options = FieldOptions::new();
            if let Some(types) = &field.types {
                let tags = types.names().map(|name| self.resolve_tag(staged, name));
                options = options.of_types(tags);
            }
            if field.required {
                options = options.required();
            }
            if field.collection {
                options = options.collection();
            }
            if field.validate {
                options = options.validate();
            }
            builder = builder.field(field.name.as_str(), options);
        }

        Ok(builder.build()?)
    }
}

fn check_not_reserved(name: &str) -> RegistryResult<()> {
    if TypeTag::builtin(name).is_some() {
        return Err(RegistryError::ReservedTypeName {
            type_name: name.to_string(),
        });
    }
    Ok(())
}

fn parse_yaml(yaml: &str, origin: &str) -> RegistryResult<SchemaDocument> {
    serde_yaml::from_str(yaml).map_err(|source| RegistryError::YamlParse {
        origin: origin.to_string(),
        source,
    })
}

fn parse_json(json: &str, origin: &str) -> RegistryResult<SchemaDocument> {
    serde_json::from_str(json).map_err(|source| RegistryError::JsonParse {
        origin: origin.to_string(),
        source,
    })
}
