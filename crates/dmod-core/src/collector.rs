//! # Error Collection
//!
//! [`ErrorCollector`] maps a path to the ordered list of error strings
//! recorded against it. A path is a plain field name, or a dotted/indexed
//! path such as `name.first` or `friends[0].last` produced by nested
//! flattening.
//!
//! ## Invariants
//!
//! - Adding an empty list never materializes a bucket, so every stored
//!   bucket is non-empty.
//! - Buckets enumerate in first-insertion order.
//! - Equality is deliberately not implemented: emptiness and per-path lookup
//!   are the observable contract.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Values that can be normalized into a list of error strings.
pub trait IntoErrors {
    /// Normalize into an owned list.
    fn into_errors(self) -> Vec<String>;
}

impl IntoErrors for &str {
    fn into_errors(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoErrors for String {
    fn into_errors(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoErrors for Vec<String> {
    fn into_errors(self) -> Vec<String> {
        self
    }
}

impl IntoErrors for Vec<&str> {
    fn into_errors(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoErrors for &[String] {
    fn into_errors(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoErrors for [&str; N] {
    fn into_errors(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Path-keyed, ordered accumulation of validation errors.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ErrorCollector {
    buckets: IndexMap<String, Vec<String>>,
}

impl ErrorCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append errors under `path`. A no-op if there is nothing to append.
    pub fn add(&mut self, path: impl Into<String>, errors: impl IntoErrors) {
        let errors = errors.into_errors();
        if errors.is_empty() {
            return;
        }
        self.buckets.entry(path.into()).or_default().extend(errors);
    }

    /// Errors recorded under `path`, or an empty slice.
    pub fn get(&self, path: &str) -> &[String] {
        self.buckets.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True iff no path holds any error.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Number of populated paths.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Populated paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// `(path, errors)` pairs for populated paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(path, errors)| (path.as_str(), errors.as_slice()))
    }

    /// Snapshot of the collector as an ordered map.
    pub fn to_map(&self) -> IndexMap<String, Vec<String>> {
        self.buckets.clone()
    }

    /// Merge every bucket of `nested` under `render(path)`.
    pub(crate) fn merge_with(&mut self, nested: ErrorCollector, render: impl Fn(&str) -> String) {
        for (path, errors) in nested.buckets {
            self.add(render(&path), errors);
        }
    }

    /// A view that can only touch the bucket for `field`.
    pub fn scoped<'a>(&'a mut self, field: &'a str) -> FieldErrors<'a> {
        FieldErrors {
            collector: self,
            field,
        }
    }
}

impl fmt::Display for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (path, errors)) in self.buckets.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let quoted: Vec<String> = errors.iter().map(|e| format!("{e:?}")).collect();
            write!(f, "{path}: [{}]", quoted.join(", "))?;
        }
        f.write_str("}")
    }
}

impl<'a> IntoIterator for &'a ErrorCollector {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Field-scoped view over an [`ErrorCollector`].
///
/// Handed to field-scoped validation rules; it can read and append only the
/// bucket of its own field.
pub struct FieldErrors<'a> {
    collector: &'a mut ErrorCollector,
    field: &'a str,
}

impl FieldErrors<'_> {
    /// Name of the field this view is bound to.
    pub fn field(&self) -> &str {
        self.field
    }

    /// Append errors to the field's bucket.
    pub fn add(&mut self, errors: impl IntoErrors) {
        self.collector.add(self.field, errors);
    }

    /// Errors currently recorded for the field.
    pub fn errors(&self) -> &[String] {
        self.collector.get(self.field)
    }

    /// True iff the field has no errors yet.
    pub fn is_empty(&self) -> bool {
        self.errors().is_empty()
    }
}
