//! # Metadata Maps
//!
//! A [`MetadataMap`] is the `__metadata__` object of a `.safetensors`
//! header after JSON parsing. The safetensors format says every value is a
//! string, but files in the wild do not always comply, so values are kept
//! as `serde_json::Value` and non-strings are reported rather than
//! rejected at the boundary.
//!
//! Spec keys are only ever read under their `modelspec.<name>` form.
//! [`MetadataMap::spec_keys`] strips the prefix and counts everything else
//! as "other keys", which the standard leaves to other conventions.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use modelspec_core::MODELSPEC_PREFIX;

/// The raw `__metadata__` mapping of one container header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMap {
    entries: BTreeMap<String, Value>,
}

impl MetadataMap {
    /// An empty map, as produced by a header without `__metadata__`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed JSON object.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        Self {
            entries: object.into_iter().collect(),
        }
    }

    /// Build from any JSON value. Returns `None` unless it is an object.
    pub fn from_json_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self::from_json_object(object)),
            _ => None,
        }
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Drop every `modelspec.*` entry, keeping other keys. Returns how
    /// many were removed.
    pub fn remove_spec_keys(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(MODELSPEC_PREFIX));
        before - self.entries.len()
    }

    /// Raw lookup by full key (including any prefix).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Number of entries, spec and other keys together.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Prefix-stripped view of the `modelspec.*` entries.
    pub fn spec_keys(&self) -> SpecKeys<'_> {
        let mut entries = BTreeMap::new();
        let mut other_key_count = 0usize;
        for (key, value) in &self.entries {
            match key.strip_prefix(MODELSPEC_PREFIX) {
                Some(name) => {
                    entries.insert(name, value);
                }
                None => other_key_count += 1,
            }
        }
        SpecKeys {
            entries,
            other_key_count,
        }
    }

    /// Back to a JSON object, e.g. for re-serialisation.
    pub fn to_json_object(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MetadataMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Borrowed view of the spec keys of a [`MetadataMap`], prefix stripped.
#[derive(Debug, Clone)]
pub struct SpecKeys<'a> {
    entries: BTreeMap<&'a str, &'a Value>,
    other_key_count: usize,
}

impl<'a> SpecKeys<'a> {
    /// True if `modelspec.<name>` is present with any value.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The raw value of `modelspec.<name>`.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.entries.get(name).copied()
    }

    /// The value of `modelspec.<name>` if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Stripped names and values, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of spec keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no `modelspec.*` key is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys without the `modelspec.` prefix.
    pub fn other_key_count(&self) -> usize {
        self.other_key_count
    }
}
