//! The field-value snapshot exchanged with the webview.
//!
//! Every command from the webview carries the complete set of field values
//! currently in the form. Values are plain JSON: strings for text inputs,
//! booleans for checkboxes, arrays for multi-selects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A map from field id to field value.
///
/// Keys iterate in sorted order so anything derived from a snapshot is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(BTreeMap<String, Value>);

impl ParameterMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// The raw value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The value if it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The value rendered as text.
    ///
    /// Strings are returned as-is, numbers and booleans in their JSON form,
    /// arrays joined with commas. Missing and null values become the empty
    /// string.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).map(value_text).unwrap_or_default()
    }

    /// The value as a number, parsing strings when needed.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value as a checkbox state.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(value_flag)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overwrite entries with those from `other`.
    pub fn overlay(&mut self, other: &ParameterMap) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Whether `key` differs between `self` and `other`.
    pub fn differs(&self, other: &ParameterMap, key: &str) -> bool {
        self.0.get(key) != other.0.get(key)
    }

    /// Convert to a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for ParameterMap {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a ParameterMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Render a JSON value as form text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Interpret a JSON value as a checkbox state.
pub fn value_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
        Value::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_conversions() {
        let params = ParameterMap::new()
            .with("name", "Fred")
            .with("age", 42)
            .with("agree", true)
            .with("colors", json!(["red", "blue"]))
            .with("nothing", Value::Null);

        assert_eq!(params.text("name"), "Fred");
        assert_eq!(params.text("age"), "42");
        assert_eq!(params.text("agree"), "true");
        assert_eq!(params.text("colors"), "red,blue");
        assert_eq!(params.text("nothing"), "");
        assert_eq!(params.text("missing"), "");
    }

    #[test]
    fn test_number_parses_strings() {
        let params = ParameterMap::new().with("age", " 17 ").with("bad", "abc");
        assert_eq!(params.number("age"), Some(17.0));
        assert_eq!(params.number("bad"), None);
        assert_eq!(params.number("missing"), None);
    }

    #[test]
    fn test_flag() {
        let params = ParameterMap::new()
            .with("a", true)
            .with("b", "false")
            .with("c", "on")
            .with("d", "");
        assert!(params.flag("a"));
        assert!(!params.flag("b"));
        assert!(params.flag("c"));
        assert!(!params.flag("d"));
        assert!(!params.flag("missing"));
    }

    #[test]
    fn test_overlay_and_differs() {
        let mut base = ParameterMap::new().with("a", "1").with("b", "2");
        let update = ParameterMap::new().with("b", "3").with("c", "4");
        let before = base.clone();
        base.overlay(&update);

        assert_eq!(base.text("a"), "1");
        assert_eq!(base.text("b"), "3");
        assert_eq!(base.text("c"), "4");
        assert!(base.differs(&before, "b"));
        assert!(!base.differs(&before, "a"));
    }

    #[test]
    fn test_deserializes_from_object() {
        let params: ParameterMap =
            serde_json::from_value(json!({"username": "bob", "age": "30"})).unwrap();
        assert_eq!(params.get_str("username"), Some("bob"));
        assert_eq!(params.to_value(), json!({"age": "30", "username": "bob"}));
    }
}
