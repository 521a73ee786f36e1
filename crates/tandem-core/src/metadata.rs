//! Metadata attached to indexed vectors.
//!
//! Vector stores only accept primitive metadata values, so [`MetadataValue`]
//! rejects nested objects and `null` during deserialization. This keeps
//! invalid metadata from reaching a collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single metadata value: string, number, boolean or list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer or floating point number.
    Number(serde_json::Number),
    /// Free-form text.
    String(String),
    /// List of strings (tags, labels).
    StringList(Vec<String>),
}

impl MetadataValue {
    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

/// Ordered mapping from keys to primitive [`MetadataValue`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Adds a value and returns the metadata.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    /// Copies every entry of `other` into `self`; existing keys are overwritten.
    pub fn extend(&mut self, other: Metadata) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, MetadataValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_primitive_values() {
        let metadata: Metadata = serde_json::from_value(json!({
            "text": "hello world",
            "age": 42,
            "score": 0.5,
            "active": true,
            "tags": ["rust", "search"],
        }))
        .unwrap();

        assert_eq!(metadata.len(), 5);
        assert_eq!(metadata.get("text").and_then(MetadataValue::as_str), Some("hello world"));
        assert_eq!(metadata.get("active"), Some(&MetadataValue::Bool(true)));
        assert_eq!(
            metadata.get("tags"),
            Some(&MetadataValue::StringList(vec!["rust".into(), "search".into()]))
        );
    }

    #[test]
    fn rejects_nested_objects_and_null() {
        assert!(serde_json::from_value::<Metadata>(json!({ "nested": { "a": 1 } })).is_err());
        assert!(serde_json::from_value::<Metadata>(json!({ "missing": null })).is_err());
        assert!(serde_json::from_value::<Metadata>(json!({ "mixed": [1, "a"] })).is_err());
    }

    #[test]
    fn serializes_in_key_order() {
        let metadata = Metadata::new()
            .with("text", "hello world")
            .with("email", "a@b.com");

        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"email":"a@b.com","text":"hello world"}"#);
    }
}
