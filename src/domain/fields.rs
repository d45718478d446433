use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A scalar value carried by a gateway field.
///
/// `Null` is a key that is present but carries no value. It renders as an empty
/// segment, which is not the same as the key being absent from the [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Field name to scalar value, with key presence as the only notion of inclusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(HashMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Rendered value for `name`; `None` only when the key is absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.0.get(name).map(ToString::to_string)
    }

    /// Rendered value of the first present key among `names`.
    pub fn first_text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.text(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_null_are_distinct() {
        let mut fields = FieldMap::new();
        fields.insert("Optional1", FieldValue::Null);

        assert!(fields.contains("Optional1"));
        assert_eq!(fields.text("Optional1"), Some(String::new()));
        assert!(!fields.contains("Optional2"));
        assert_eq!(fields.text("Optional2"), None);
    }

    #[test]
    fn test_scalar_rendering() {
        let fields: FieldMap = serde_json::from_str(
            r#"{"a": "text", "b": 3299, "c": 32.99, "d": true, "e": null, "f": ""}"#,
        )
        .unwrap();

        assert_eq!(fields.text("a").as_deref(), Some("text"));
        assert_eq!(fields.text("b").as_deref(), Some("3299"));
        assert_eq!(fields.text("c").as_deref(), Some("32.99"));
        assert_eq!(fields.text("d").as_deref(), Some("true"));
        assert_eq!(fields.text("e").as_deref(), Some(""));
        assert_eq!(fields.text("f").as_deref(), Some(""));
    }

    #[test]
    fn test_first_text_prefers_earlier_names() {
        let fields: FieldMap = [("HashCheck", "bbb"), ("Hash", "aaa")].into_iter().collect();
        assert_eq!(fields.first_text(&["Hash", "HashCheck"]).as_deref(), Some("aaa"));
        assert_eq!(fields.first_text(&["Missing"]), None);
    }
}
