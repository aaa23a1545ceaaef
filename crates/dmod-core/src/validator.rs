//! # Field Validator
//!
//! Pure mapping from a field declaration and a runtime value to an ordered
//! list of error strings. No side effects, no state.
//!
//! ## Priority Cascade
//!
//! The checks below are not cumulative. The first matching condition alone
//! decides the result.
//!
//! Scalar fields:
//!
//! 1. Absent and optional: no errors. No type check is attempted.
//! 2. Absent and required: `cannot be nil`.
//! 3. Runtime type matches no declared type: `is not an instance of ...`.
//! 4. Nested validation requested and the value reports invalid: `is invalid`.
//!
//! Collection fields:
//!
//! 1. Not enumerable: `was declared as a collection and is not enumerable`.
//! 2. Some element matches no declared type: `contains a value that is not
//!    an instance of ...`.
//! 3. Nested validation requested and some element reports invalid:
//!    `is invalid`.
//!
//! A type mismatch always short-circuits the nested check, so validity is
//! never checked on a value of the wrong type.

use crate::field::Field;
use crate::value::Value;

/// Message for a required scalar with no value.
pub const CANNOT_BE_NIL: &str = "cannot be nil";

/// Message for a collection field holding a non-enumerable value.
pub const NOT_ENUMERABLE: &str = "was declared as a collection and is not enumerable";

/// Message for a nested value that reports itself invalid.
pub const IS_INVALID: &str = "is invalid";

/// Validate `value` against `field`.
pub fn errors(field: &Field, value: &Value) -> Vec<String> {
    if field.is_collection() {
        collection_errors(field, value)
    } else {
        scalar_errors(field, value)
    }
}

fn scalar_errors(field: &Field, value: &Value) -> Vec<String> {
    if value.is_null() {
        return if field.is_required() {
            vec![CANNOT_BE_NIL.to_string()]
        } else {
            Vec::new()
        };
    }

    if !conforms(field, value) {
        return vec![format!(
            "is not an instance of {} (was {})",
            field.type_list(),
            value.type_name()
        )];
    }

    if field.validates_nested() && !reports_valid(value) {
        return vec![IS_INVALID.to_string()];
    }

    Vec::new()
}

fn collection_errors(field: &Field, value: &Value) -> Vec<String> {
    let Some(elements) = value.as_list() else {
        return vec![NOT_ENUMERABLE.to_string()];
    };

    if !elements.iter().all(|element| conforms(field, element)) {
        return vec![format!(
            "contains a value that is not an instance of {}",
            field.type_list()
        )];
    }

    if field.validates_nested() && !elements.iter().all(reports_valid) {
        return vec![IS_INVALID.to_string()];
    }

    Vec::new()
}

fn conforms(field: &Field, value: &Value) -> bool {
    field.types().iter().any(|tag| tag.matches(value))
}

/// Values without a validity capability have nothing to report.
fn reports_valid(value: &Value) -> bool {
    value.as_validable().map_or(true, |nested| nested.is_valid())
}
