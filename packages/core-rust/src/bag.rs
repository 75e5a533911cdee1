//! Argument bags: the wire-level shape of an operation's parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Loosely typed argument value.
///
/// `Null` stands in for an optional parameter the caller left unset; the key
/// is still present so the operation module sees the full key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    String(String),
    Strings(Vec<String>),
    Bag(ArgumentBag),
}

impl ArgValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            ArgValue::Strings(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::String(s)
    }
}

impl From<Option<String>> for ArgValue {
    fn from(s: Option<String>) -> Self {
        s.map_or(ArgValue::Null, ArgValue::String)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(items: Vec<String>) -> Self {
        ArgValue::Strings(items)
    }
}

impl From<ArgumentBag> for ArgValue {
    fn from(bag: ArgumentBag) -> Self {
        ArgValue::Bag(bag)
    }
}

/// Mapping from argument key to value, built fresh for each call.
///
/// Keys are unique; inserting an existing key replaces its value. Iteration
/// and serialization are in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgumentBag(BTreeMap<String, ArgValue>);

impl ArgumentBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts `value` under `key`, returning the replaced value if any.
    pub fn insert(&mut self, key: &str, value: impl Into<ArgValue>) -> Option<ArgValue> {
        self.0.insert(key.to_string(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.get(key)
    }

    /// String value under `key`. `None` when absent, null, or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ArgValue::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ArgValue::as_bool)
    }

    #[must_use]
    pub fn get_strings(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(ArgValue::as_strings)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
