//! Integration tests: field checks, custom rule execution policy, nested
//! validation and error flattening as seen through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dmod_core::{
    ErrorCollector, FieldOptions, ModelError, ModelInstance, ModelType, TypeTag, ValidationRule,
    Value,
};

/// Define a one-off `Client` type from a list of fields and rules.
fn define(fields: Vec<(&str, FieldOptions)>, rules: Vec<ValidationRule>) -> Arc<ModelType> {
    let mut builder = ModelType::builder("Client");
    for (name, options) in fields {
        builder = builder.field(name, options);
    }
    for rule in rules {
        builder = builder.validate(rule);
    }
    builder.build().expect("definition should be valid")
}

fn with(model_type: &Arc<ModelType>, field: &str, value: impl Into<Value>) -> ModelInstance {
    ModelInstance::from_attributes(model_type, [(field, value.into())]).unwrap()
}

// ---------------------------------------------------------------------------
// Built-in field checks
// ---------------------------------------------------------------------------

#[test]
fn test_no_fields_no_errors() {
    let ty = define(vec![], vec![]);
    assert!(ModelInstance::new(&ty).errors().is_empty());
}

#[test]
fn test_untyped_field_accepts_anything() {
    let ty = define(vec![("field", FieldOptions::new())], vec![]);
    let errors = with(&ty, "field", 7).errors();
    assert_eq!(errors.paths().count(), 0);
}

#[test]
fn test_required_field_missing() {
    let ty = define(vec![("name", FieldOptions::new().required())], vec![]);
    assert_eq!(ModelInstance::new(&ty).errors().get("name"), ["cannot be nil"]);
}

#[test]
fn test_required_typed_field_reports_only_nil() {
    let ty = define(
        vec![("field", FieldOptions::new().of_type(TypeTag::String).required())],
        vec![],
    );
    assert_eq!(with(&ty, "field", Value::Null).errors().get("field"), ["cannot be nil"]);
}

#[test]
fn test_optional_typed_field_absent() {
    let ty = define(vec![("field", FieldOptions::new().of_type(TypeTag::String))], vec![]);
    assert!(ModelInstance::new(&ty).errors().get("field").is_empty());
}

#[test]
fn test_wrong_type() {
    let ty = define(vec![("field", FieldOptions::new().of_type(TypeTag::String))], vec![]);
    assert_eq!(
        with(&ty, "field", true).errors().get("field"),
        ["is not an instance of String (was Boolean)"]
    );
    assert!(with(&ty, "field", "right").errors().get("field").is_empty());
}

#[test]
fn test_subtype_instance_matches_parent_type() {
    let animal = ModelType::builder("Animal").build().unwrap();
    let dog = ModelType::builder("Dog").extends(&animal).build().unwrap();
    let ty = define(vec![("pet", FieldOptions::new().of_type(TypeTag::from(&animal)))], vec![]);

    assert!(with(&ty, "pet", ModelInstance::new(&dog)).errors().is_empty());
    let other = ModelType::builder("Rock").build().unwrap();
    assert_eq!(
        with(&ty, "pet", ModelInstance::new(&other)).errors().get("pet"),
        ["is not an instance of Animal (was Rock)"]
    );
}

#[test]
fn test_collection_checks() {
    let ty = define(
        vec![("field", FieldOptions::new().of_type(TypeTag::String).collection())],
        vec![],
    );
    assert!(ModelInstance::new(&ty).errors().get("field").is_empty());
    assert_eq!(
        with(&ty, "field", 1).errors().get("field"),
        ["was declared as a collection and is not enumerable"]
    );
    assert_eq!(
        with(&ty, "field", vec![Value::Bool(false)]).errors().get("field"),
        ["contains a value that is not an instance of String"]
    );
}

#[test]
fn test_explicit_null_collection_is_not_enumerable() {
    let ty = define(vec![("field", FieldOptions::new().collection())], vec![]);
    assert_eq!(
        with(&ty, "field", Value::Null).errors().get("field"),
        ["was declared as a collection and is not enumerable"]
    );
}

// ---------------------------------------------------------------------------
// Nested validation
// ---------------------------------------------------------------------------

fn name_type() -> Arc<ModelType> {
    ModelType::builder("Name")
        .field("first", FieldOptions::new().required())
        .field("last", FieldOptions::new().required())
        .build()
        .unwrap()
}

#[test]
fn test_invalid_nested_model() {
    let name = name_type();
    let ty = define(vec![("field", FieldOptions::new().validate())], vec![]);
    let client = with(&ty, "field", ModelInstance::new(&name));
    assert_eq!(client.errors().get("field"), ["is invalid"]);
}

#[test]
fn test_valid_nested_model() {
    let name = name_type();
    let ty = define(vec![("field", FieldOptions::new().validate())], vec![]);
    let valid = ModelInstance::from_attributes(&name, [("first", "Ada"), ("last", "Lovelace")])
        .unwrap();
    assert!(with(&ty, "field", valid).errors().get("field").is_empty());
}

#[test]
fn test_nested_check_skipped_on_type_mismatch() {
    let name = name_type();
    let ty = define(
        vec![("field", FieldOptions::new().of_type(TypeTag::String).validate())],
        vec![],
    );
    let errors = with(&ty, "field", ModelInstance::new(&name)).errors();
    assert_eq!(errors.get("field"), ["is not an instance of String (was Name)"]);
}

#[test]
fn test_invalid_nested_collection_element() {
    let name = name_type();
    let ty = define(vec![("field", FieldOptions::new().collection().validate())], vec![]);
    let client = with(&ty, "field", vec![Value::Model(ModelInstance::new(&name))]);
    assert_eq!(client.errors().get("field"), ["is invalid"]);
}

#[test]
fn test_flat_errors() {
    let name = name_type();
    let person = ModelType::builder("Person")
        .field("name", FieldOptions::new().of_type(TypeTag::from(&name)).validate())
        .field(
            "friends_names",
            FieldOptions::new()
                .of_type(TypeTag::from(&name))
                .collection()
                .validate(),
        )
        .build()
        .unwrap();

    let subject = ModelInstance::from_attributes(
        &person,
        [
            ("name", Value::Model(ModelInstance::new(&name))),
            (
                "friends_names",
                Value::List(vec![Value::Model(ModelInstance::new(&name))]),
            ),
        ],
    )
    .unwrap();

    let flat = subject.flat_errors();
    assert_eq!(flat.get("name"), ["is invalid"]);
    assert_eq!(flat.get("name.first"), ["cannot be nil"]);
    assert_eq!(flat.get("name.last"), ["cannot be nil"]);
    assert_eq!(flat.get("friends_names[0].first"), ["cannot be nil"]);
    assert_eq!(flat.get("friends_names[0].last"), ["cannot be nil"]);
}

#[test]
fn test_flat_errors_recurse_through_levels() {
    let name = name_type();
    let person = ModelType::builder("Person")
        .field("name", FieldOptions::new().of_type(TypeTag::from(&name)).validate())
        .build()
        .unwrap();
    let team = ModelType::builder("Team")
        .field(
            "members",
            FieldOptions::new()
                .of_type(TypeTag::from(&person))
                .collection()
                .validate(),
        )
        .build()
        .unwrap();

    let member = with(&person, "name", ModelInstance::new(&name));
    let subject = with(&team, "members", vec![Value::Model(member)]);

    let flat = subject.flat_errors();
    assert_eq!(flat.get("members[0].name.first"), ["cannot be nil"]);
    assert_eq!(flat.get("members[0].name"), ["is invalid"]);
}

#[test]
fn test_flat_errors_ignore_fields_without_nested_flag() {
    let name = name_type();
    let ty = define(vec![("field", FieldOptions::new())], vec![]);
    let flat = with(&ty, "field", ModelInstance::new(&name)).flat_errors();
    assert!(flat.is_empty());
}

// ---------------------------------------------------------------------------
// Custom rules
// ---------------------------------------------------------------------------

#[test]
fn test_rules_run_on_every_call() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let ty = define(
        vec![],
        vec![ValidationRule::global(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })],
    );
    let client = ModelInstance::new(&ty);

    client.errors();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    client.errors();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_global_rule_receives_collector() {
    let ty = define(
        vec![],
        vec![ValidationRule::global(|_, errors: &mut ErrorCollector| {
            errors.add("field", "ERROR");
        })],
    );
    assert_eq!(ModelInstance::new(&ty).errors().get("field"), ["ERROR"]);
}

#[test]
fn test_global_rule_runs_after_field_checks() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::global(|_, errors| {
            let count = errors.get("field").len();
            errors.add("field", format!("There were {count} errors"));
        })],
    );
    assert_eq!(
        ModelInstance::new(&ty).errors().get("field"),
        ["cannot be nil", "There were 1 errors"]
    );
}

#[test]
fn test_global_rule_defaults_to_always() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::global(|_, errors| errors.add("field", "should happen"))],
    );
    assert_eq!(
        ModelInstance::new(&ty).errors().get("field"),
        ["cannot be nil", "should happen"]
    );
}

#[test]
fn test_global_rule_only_if_clean() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::global(|_, errors| errors.add("field", "never happen")).only_if_clean()],
    );
    assert_eq!(ModelInstance::new(&ty).errors().get("field"), ["cannot be nil"]);
}

#[test]
fn test_global_rule_only_if_clean_runs_on_clean_model() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::global(|_, errors| errors.add("base", "should happen")).only_if_clean()],
    );
    let errors = with(&ty, "field", "present").errors();
    assert_eq!(errors.get("base"), ["should happen"]);
    assert!(errors.get("field").is_empty());
}

#[test]
fn test_field_rule_receives_scoped_view() {
    let ty = define(
        vec![("field", FieldOptions::new())],
        vec![ValidationRule::field("field", |_, errors| errors.add("is not great"))],
    );
    assert_eq!(ModelInstance::new(&ty).errors().get("field"), ["is not great"]);
}

#[test]
fn test_field_rule_defaults_to_only_if_clean() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::field("field", |_, errors| errors.add("never happen"))],
    );
    assert_eq!(ModelInstance::new(&ty).errors().get("field"), ["cannot be nil"]);
}

#[test]
fn test_field_rule_always() {
    let ty = define(
        vec![("field", FieldOptions::new().required())],
        vec![ValidationRule::field("field", |_, errors| errors.add("should happen")).always()],
    );
    assert_eq!(
        ModelInstance::new(&ty).errors().get("field"),
        ["cannot be nil", "should happen"]
    );
}

#[test]
fn test_field_rule_gate_ignores_other_fields() {
    let ty = define(
        vec![
            ("broken", FieldOptions::new().required()),
            ("field", FieldOptions::new()),
        ],
        vec![ValidationRule::field("field", |_, errors| errors.add("ran"))],
    );
    let errors = ModelInstance::new(&ty).errors();
    assert_eq!(errors.get("broken"), ["cannot be nil"]);
    assert_eq!(errors.get("field"), ["ran"]);
}

#[test]
fn test_later_rules_observe_earlier_rules() {
    let ty = define(
        vec![("field", FieldOptions::new())],
        vec![
            ValidationRule::global(|_, errors| errors.add("field", "first")),
            ValidationRule::field("field", |_, errors| errors.add("second")),
        ],
    );
    assert_eq!(ModelInstance::new(&ty).errors().get("field"), ["first"]);
}

#[test]
fn test_rule_reads_model_values() {
    let ty = define(
        vec![("age", FieldOptions::new().of_type(TypeTag::Integer))],
        vec![ValidationRule::field("age", |model, errors| {
            if let Ok(Value::Integer(age)) = model.get("age") {
                if *age < 0 {
                    errors.add("must not be negative");
                }
            }
        })],
    );
    assert_eq!(with(&ty, "age", -1).errors().get("age"), ["must not be negative"]);
    assert!(with(&ty, "age", 3).is_valid());
    // A type error keeps the scoped rule from running.
    assert_eq!(
        with(&ty, "age", "old").errors().get("age"),
        ["is not an instance of Integer (was String)"]
    );
}

#[test]
fn test_subtypes_run_parent_rules() {
    let parent = define(
        vec![("field", FieldOptions::new())],
        vec![ValidationRule::field("field", |_, errors| errors.add("errors"))],
    );
    let child = ModelType::builder("Child").extends(&parent).build().unwrap();
    assert_eq!(ModelInstance::new(&child).errors().get("field"), ["errors"]);
}

// ---------------------------------------------------------------------------
// Validity
// ---------------------------------------------------------------------------

#[test]
fn test_is_valid() {
    let ok = define(vec![("field", FieldOptions::new())], vec![]);
    assert!(ModelInstance::new(&ok).is_valid());

    let broken = define(vec![("field", FieldOptions::new().required())], vec![]);
    assert!(!ModelInstance::new(&broken).is_valid());
}

#[test]
fn test_errors_are_idempotent() {
    let ty = define(
        vec![
            ("a", FieldOptions::new().required()),
            ("b", FieldOptions::new().of_type(TypeTag::String)),
        ],
        vec![ValidationRule::global(|_, errors| errors.add("base", "checked"))],
    );
    let client = with(&ty, "b", 1);
    assert_eq!(client.errors().to_map(), client.errors().to_map());
    assert_eq!(client.is_valid(), client.is_valid());
}

#[test]
fn test_assert_valid_carries_full_map() {
    let ty = define(
        vec![
            ("name", FieldOptions::new().required()),
            ("age", FieldOptions::new().of_type(TypeTag::Integer)),
        ],
        vec![],
    );
    let client = with(&ty, "age", "old");
    match client.assert_valid() {
        Err(ModelError::Invalid { type_name, errors }) => {
            assert_eq!(type_name, "Client");
            assert_eq!(errors.get("name"), ["cannot be nil"]);
            assert_eq!(errors.get("age"), ["is not an instance of Integer (was String)"]);
        }
        other => panic!("expected Invalid, got {other:?}"),
    }

    let err = client.assert_valid().unwrap_err();
    assert!(err.to_string().contains("this Client object contains the following errors"));
}

#[test]
fn test_assert_valid_computes_errors_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let ty = define(
        vec![],
        vec![ValidationRule::global(move |_, errors| {
            // Fails only on the first evaluation.
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                errors.add("base", "flaky");
            }
        })],
    );
    let client = ModelInstance::new(&ty);
    match client.assert_valid() {
        Err(ModelError::Invalid { errors, .. }) => assert_eq!(errors.get("base"), ["flaky"]),
        other => panic!("expected Invalid, got {other:?}"),
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_assert_valid_ok() {
    let ty = define(vec![("field", FieldOptions::new())], vec![]);
    assert!(ModelInstance::new(&ty).assert_valid().is_ok());
}
