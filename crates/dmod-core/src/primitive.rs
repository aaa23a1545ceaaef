//! # Primitive Tree Conversion
//!
//! The primitive tree is the toolkit's only external boundary: an untyped
//! `serde_json::Value` of mappings, sequences and scalars, suitable for
//! storage or transport. Mappings keep insertion order.
//!
//! ## Serializer (structural)
//!
//! [`to_primitive`] walks the runtime shape of a value and never consults
//! field metadata:
//!
//! 1. a model becomes the serialization of its attribute mapping,
//! 2. a mapping has every value serialized in place,
//! 3. a sequence has every element serialized,
//! 4. a scalar passes through.
//!
//! Non-finite floats have no primitive representation and are rejected with
//! the path at which they were found.
//!
//! ## Deserializer (metadata-guided)
//!
//! [`from_primitive`] rebuilds an instance of a target type. For each key
//! naming a mono-typed field it recurses through the declared type:
//! collection fields map every element (a `null` list reads as empty), scalar
//! fields convert the value. Keys naming multi-typed fields pass through
//! unconverted, since nothing in the primitive says which declared type
//! produced them. Recursion bottoms out at any type that is not a model.
//! The converted mapping is then handed to ordinary construction, so
//! defaults apply and unknown keys fail.
//!
//! Round trips are lossless only for graphs whose nested models sit behind
//! mono-typed, model-typed fields. A model stored in an `Any`, `Map` or
//! multi-typed field comes back as a plain mapping.

use std::sync::Arc;

use serde_json::{Map, Number, Value as Primitive};

use crate::error::PrimitiveError;
use crate::field::Field;
use crate::instance::ModelInstance;
use crate::schema::ModelType;
use crate::value::{TypeTag, Value};

/// Serialize any value into the primitive tree.
///
/// # Errors
///
/// Returns `PrimitiveError::NonFiniteFloat` if the value contains NaN or an
/// infinity.
pub fn to_primitive(value: &Value) -> Result<Primitive, PrimitiveError> {
    serialize(value, "$")
}

pub(crate) fn model_to_primitive(instance: &ModelInstance) -> Result<Primitive, PrimitiveError> {
    serialize_entries(instance.attributes(), "$")
}

fn serialize(value: &Value, path: &str) -> Result<Primitive, PrimitiveError> {
    match value {
        Value::Model(instance) => serialize_entries(instance.attributes(), path),
        Value::Map(map) => serialize_entries(map, path),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| serialize(item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Primitive::Array),
        scalar => serialize_scalar(scalar, path),
    }
}

fn serialize_entries<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a Value)>,
    path: &str,
) -> Result<Primitive, PrimitiveError> {
    let mut out = Map::new();
    for (key, value) in entries {
        out.insert(key.clone(), serialize(value, &format!("{path}.{key}"))?);
    }
    Ok(Primitive::Object(out))
}

fn serialize_scalar(value: &Value, path: &str) -> Result<Primitive, PrimitiveError> {
    Ok(match value {
        Value::Bool(b) => Primitive::Bool(*b),
        Value::Integer(n) => Primitive::from(*n),
        Value::Float(f) => match Number::from_f64(*f) {
            Some(n) => Primitive::Number(n),
            None => {
                return Err(PrimitiveError::NonFiniteFloat {
                    path: path.to_string(),
                    value: *f,
                })
            }
        },
        Value::String(s) => Primitive::String(s.clone()),
        _ => Primitive::Null,
    })
}

/// Rebuild an instance of `model_type` from a primitive tree.
///
/// An absent or `null` primitive reads as an empty mapping.
///
/// # Errors
///
/// - `PrimitiveError::ExpectedMap` if the primitive is not a mapping.
/// - `PrimitiveError::ExpectedSequence` if a mono-typed collection field
///   holds something other than a sequence or `null`.
/// - `PrimitiveError::Model` if a key names no declared field.
pub fn from_primitive(
    model_type: &Arc<ModelType>,
    primitive: Option<&Primitive>,
) -> Result<ModelInstance, PrimitiveError> {
    let empty = Map::new();
    let entries = match primitive {
        None | Some(Primitive::Null) => &empty,
        Some(Primitive::Object(map)) => map,
        Some(other) => {
            return Err(PrimitiveError::ExpectedMap {
                type_name: model_type.name().to_string(),
                found: kind(other),
            })
        }
    };

    let mut attributes = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        let value = match model_type.field(key) {
            Some(field) => deserialize_field(model_type, field, raw)?,
            None => Value::from(raw),
        };
        attributes.push((key.as_str(), value));
    }

    Ok(ModelInstance::from_attributes(model_type, attributes)?)
}

fn deserialize_field(
    model_type: &ModelType,
    field: &Field,
    raw: &Primitive,
) -> Result<Value, PrimitiveError> {
    let Some(tag) = field.monotype() else {
        tracing::warn!(
            type_name = %model_type.name(),
            field = %field.name(),
            types = %field.type_list(),
            "multi-typed field passed through without conversion"
        );
        return Ok(Value::from(raw));
    };

    if !field.is_collection() {
        return deserialize_as(tag, raw);
    }

    match raw {
        Primitive::Null => Ok(Value::List(Vec::new())),
        Primitive::Array(items) => items
            .iter()
            .map(|item| deserialize_as(tag, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(PrimitiveError::ExpectedSequence {
            field: field.name().to_string(),
            found: kind(other),
        }),
    }
}

/// `null` stays absent even for model types, so optional children survive
/// a round trip.
fn deserialize_as(tag: &TypeTag, raw: &Primitive) -> Result<Value, PrimitiveError> {
    match tag {
        TypeTag::Model(reference) if !raw.is_null() => match reference.get() {
            Some(nested) => from_primitive(&nested, Some(raw)).map(Value::Model),
            None => {
                tracing::warn!(
                    type_name = %reference.name(),
                    "unbound model reference, value passed through without conversion"
                );
                Ok(Value::from(raw))
            }
        },
        _ => Ok(Value::from(raw)),
    }
}

fn kind(primitive: &Primitive) -> &'static str {
    match primitive {
        Primitive::Null => "null",
        Primitive::Bool(_) => "boolean",
        Primitive::Number(_) => "number",
        Primitive::String(_) => "string",
        Primitive::Array(_) => "sequence",
        Primitive::Object(_) => "mapping",
    }
}

/// Generic leaf conversion, used wherever no declaration guides the shape.
impl From<&Primitive> for Value {
    fn from(primitive: &Primitive) -> Self {
        match primitive {
            Primitive::Null => Value::Null,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            Primitive::String(s) => Value::String(s.clone()),
            Primitive::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            Primitive::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
