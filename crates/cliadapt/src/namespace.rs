//! Parsed values namespace.
//!
//! The namespace is what a parser hands back after reading `argv`: one entry
//! per declared destination, plus any defaults a sub-parser attached. Values
//! are plain [`serde_json::Value`]s so hooks and targets can inspect them
//! without knowing which parser produced them.

use serde_json::{Map, Value};

/// An ordered mapping from destination names to parsed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: Map<String, Value>,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a namespace from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }

    /// Returns the value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if `name` has an entry, even a `null` one.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets `name` to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Removes and returns the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Returns true if `name` holds a truthy value.
    ///
    /// Missing entries and `null` are falsy; booleans are themselves; numbers
    /// are truthy when non-zero; strings, arrays and objects when non-empty.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).map(truthy).unwrap_or(false)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every entry of `other` into this namespace, overwriting.
    pub fn merge(&mut self, other: Map<String, Value>) {
        for (k, v) in other {
            self.values.insert(k, v);
        }
    }

    /// Consumes the namespace, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for Namespace {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Truthiness of a JSON value.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
