// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! The building blocks every component passes around.
//!
//! A `Record` is deliberately schemaless: an id plus a bag of named fields. Each
//! page decides which fields are searchable, which are facets and how to group
//! them; the engine only ever asks for `record.get(name)`.
//!
//! # Invariants
//!
//! - **Record**: `id` is stable for the life of the record. Applying a `Patch`
//!   never touches it, and a patch that names `"id"` is ignored for that key.
//!
//! - **FieldValue**: at most one level of nesting. Lists hold scalars, never
//!   other lists, so facet matching stays a flat set intersection.
//!
//! - **Scalar text form**: numbers that are integral render without a trailing
//!   `.0`, so a facet selection of `"3"` matches a stored `3.0`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// FIELD VALUES
// =============================================================================

/// A single field value: text, number or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Canonical text used for facet comparison and substring search.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// A named field's value: one scalar, or a list of them (tags, owners, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FieldValue {
    /// Iterate the scalar(s) held by this value.
    ///
    /// A scalar yields itself; a list yields each element. Facet and search
    /// matching are both "any element" checks over this iterator.
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        let slice: &[Scalar] = match self {
            FieldValue::Scalar(s) => std::slice::from_ref(s),
            FieldValue::List(items) => items,
        };
        slice.iter()
    }

    /// The value as text, if it is a single text scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The value as a number, if it is a single numeric scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Scalar(Scalar::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// The value as a boolean, if it is a single boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<Vec<Scalar>> for FieldValue {
    fn from(value: Vec<Scalar>) -> Self {
        FieldValue::List(value)
    }
}

impl<T: Into<Scalar>> FromIterator<T> for FieldValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        FieldValue::List(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// An opaque catalog item: a stable id plus named fields.
///
/// Serializes flat, so `{"id": "kpi-7", "name": "Churn", "tags": ["retention"]}`
/// round-trips without a wrapper object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set (or overwrite) a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Apply a patch in place. `Some` sets a field, `None` removes it.
    pub fn apply(&mut self, patch: &Patch) {
        for (name, change) in &patch.fields {
            if name == "id" {
                continue;
            }
            match change {
                Some(value) => {
                    self.fields.insert(name.clone(), value.clone());
                }
                None => {
                    self.fields.remove(name);
                }
            }
        }
    }

    /// Return a patched copy, leaving `self` untouched.
    pub fn patched(&self, patch: &Patch) -> Record {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// A partial update: field name to new value, or `None` to remove the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a new value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Remove a field.
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
