//! # Runtime Values and Type Tags
//!
//! [`Value`] is the closed set of value kinds a model field can hold, and
//! [`TypeTag`] is the closed set of types a field can declare. A field's type
//! check is `TypeTag::matches` over its declared tags.
//!
//! ## Matching Rules
//!
//! - `Any` matches every value, `Null` included.
//! - Every other tag rejects `Null`. Absence is handled by the validator's
//!   required/optional logic before any type check happens.
//! - `Number` matches `Integer` and `Float`.
//! - `Model(T)` matches an instance of `T` or of any type that extends `T`.
//!   The reference to `T` may be bound after the tag is created, so a type
//!   can declare fields of its own type; see [`ModelRef`].
//!
//! ## Rendering
//!
//! [`Value::inspect`] renders the absent value as `null`, the spelling the
//! primitive tree uses for it, so an inspected value reads the same as its
//! serialized form.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;

use crate::instance::{ModelInstance, Validable};
use crate::schema::ModelType;

/// A runtime field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Integer(i64),
    /// Floating point scalar.
    Float(f64),
    /// UTF-8 string scalar.
    String(String),
    /// Ordered sequence. The only enumerable kind.
    List(Vec<Value>),
    /// Ordered string-keyed mapping.
    Map(IndexMap<String, Value>),
    /// Nested model instance.
    Model(ModelInstance),
}

impl Value {
    /// Returns true for the absent value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's runtime type, as used in validation messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Model(instance) => instance.model_type().name(),
        }
    }

    /// Borrow the elements if this value is enumerable.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the string contents, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the nested model instance, if any.
    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }

    /// The value's validity capability, if it has one.
    ///
    /// Only nested models can report their own validity.
    pub fn as_validable(&self) -> Option<&dyn Validable> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }

    /// Human-readable rendering. Strings are quoted, models use their own
    /// inspect form.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::String(s) => format!("{s:?}"),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k:?}: {}", v.inspect()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Model(instance) => instance.inspect(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<ModelInstance> for Value {
    fn from(instance: ModelInstance) -> Self {
        Value::Model(instance)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Type Tags
// ---------------------------------------------------------------------------

/// A type a field may declare.
#[derive(Clone)]
pub enum TypeTag {
    /// Matches every value, including `Null`.
    Any,
    /// Matches `Value::Bool`.
    Boolean,
    /// Matches `Value::Integer`.
    Integer,
    /// Matches `Value::Float`.
    Float,
    /// Matches `Value::Integer` and `Value::Float`.
    Number,
    /// Matches `Value::String`.
    String,
    /// Matches `Value::List`.
    List,
    /// Matches `Value::Map`.
    Map,
    /// Matches instances of the referenced model type or its subtypes.
    Model(ModelRef),
}

impl TypeTag {
    /// A `Model` tag naming a type that may not be built yet.
    ///
    /// See [`ModelRef::named`].
    pub fn named(name: impl Into<String>) -> Self {
        TypeTag::Model(ModelRef::named(name))
    }

    /// Returns true if `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::Any, _) => true,
            (TypeTag::Boolean, Value::Bool(_)) => true,
            (TypeTag::Integer, Value::Integer(_)) => true,
            (TypeTag::Float, Value::Float(_)) => true,
            (TypeTag::Number, Value::Integer(_) | Value::Float(_)) => true,
            (TypeTag::String, Value::String(_)) => true,
            (TypeTag::List, Value::List(_)) => true,
            (TypeTag::Map, Value::Map(_)) => true,
            (TypeTag::Model(expected), Value::Model(instance)) => expected
                .get()
                .is_some_and(|expected| instance.model_type().is_a(&expected)),
            _ => false,
        }
    }

    /// Display name used in validation messages.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Any => "Any",
            TypeTag::Boolean => "Boolean",
            TypeTag::Integer => "Integer",
            TypeTag::Float => "Float",
            TypeTag::Number => "Number",
            TypeTag::String => "String",
            TypeTag::List => "List",
            TypeTag::Map => "Map",
            TypeTag::Model(reference) => reference.name(),
        }
    }

    /// Resolve one of the built-in tag names. Model types are not built in.
    pub fn builtin(name: &str) -> Option<TypeTag> {
        match name {
            "Any" => Some(TypeTag::Any),
            "Boolean" => Some(TypeTag::Boolean),
            "Integer" => Some(TypeTag::Integer),
            "Float" => Some(TypeTag::Float),
            "Number" => Some(TypeTag::Number),
            "String" => Some(TypeTag::String),
            "List" => Some(TypeTag::List),
            "Map" => Some(TypeTag::Map),
            _ => None,
        }
    }

    /// The model type behind a bound `Model` tag.
    pub fn model_type(&self) -> Option<Arc<ModelType>> {
        match self {
            TypeTag::Model(reference) => reference.get(),
            _ => None,
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeTag::Model(a), TypeTag::Model(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&Arc<ModelType>> for TypeTag {
    fn from(model_type: &Arc<ModelType>) -> Self {
        TypeTag::Model(ModelRef::from(model_type))
    }
}

// ---------------------------------------------------------------------------
// Model References
// ---------------------------------------------------------------------------

/// Reference from a `Model` tag to a model type.
///
/// A reference is either bound on creation, from a type that already exists,
/// or created by name and bound once later. Late binding is what lets a type
/// declare fields of its own type, or of a type defined after it:
///
/// - [`ModelTypeBuilder::build`](crate::schema::ModelTypeBuilder::build)
///   binds unbound references naming the type being built.
/// - [`ModelType::bind_references`] binds the rest.
///
/// Clones share one binding slot. An unbound reference matches nothing.
#[derive(Clone)]
pub struct ModelRef {
    name: Arc<str>,
    slot: Arc<OnceLock<Target>>,
}

enum Target {
    /// The type that declared the field. Held weakly so a recursive type
    /// does not own itself.
    Owner(Weak<ModelType>),
    Other(Arc<ModelType>),
}

impl ModelRef {
    /// An unbound reference to the type called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            slot: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The referenced type, if bound and still alive.
    pub fn get(&self) -> Option<Arc<ModelType>> {
        match self.slot.get()? {
            Target::Owner(owner) => owner.upgrade(),
            Target::Other(model_type) => Some(Arc::clone(model_type)),
        }
    }

    /// Bind to the type under construction. No-op if already bound.
    pub(crate) fn bind_owner(&self, owner: &Weak<ModelType>) -> bool {
        self.slot.set(Target::Owner(Weak::clone(owner))).is_ok()
    }

    /// Bind to `target`. No-op if already bound.
    pub(crate) fn bind(&self, target: &Arc<ModelType>) -> bool {
        self.slot.set(Target::Other(Arc::clone(target))).is_ok()
    }
}

impl From<&Arc<ModelType>> for ModelRef {
    fn from(model_type: &Arc<ModelType>) -> Self {
        let reference = Self::named(model_type.name());
        reference.bind(model_type);
        reference
    }
}

/// Two references are equal if they resolve to the same type, or, while
/// unbound, share a slot.
impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            _ => Arc::ptr_eq(&self.slot, &other.slot),
        }
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
