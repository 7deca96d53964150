//! Ordered multi-valued string maps.
//!
//! [`QueryDict`] models query strings and url-encoded form bodies: each key
//! maps to one or more values and insertion order is preserved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered multi-map from keys to lists of string values.
///
/// # Example
///
/// ```
/// use hyperpony_core::QueryDict;
///
/// let q = QueryDict::parse("a=1&b=2&a=3").unwrap();
/// assert_eq!(q.get("a"), Some("1"));
/// assert_eq!(q.get_list("a"), &["1", "3"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryDict {
    entries: IndexMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates an empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// A leading `?` is ignored. Keys without `=` yield an empty value.
    pub fn parse(input: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let input = input.strip_prefix('?').unwrap_or(input);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)?;
        Ok(Self::from_pairs(pairs))
    }

    /// Builds a dict from key/value pairs, appending repeated keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut dict = Self::new();
        for (k, v) in pairs {
            dict.append(k, v);
        }
        dict
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value for `key`, or an empty slice.
    #[must_use]
    pub fn get_list(&self, key: &str) -> &[String] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Appends a value to the list for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces the list for `key`.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), values);
    }

    /// Replaces lists for every key present in `other`.
    pub fn update(&mut self, other: &Self) {
        for (key, values) in &other.entries {
            self.entries.insert(key.clone(), values.clone());
        }
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates `(key, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the dict back into a url-encoded string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
            .collect();
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_multi_values() {
        let q = QueryDict::parse("?x=1&y=two&x=3").unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("x"), Some("1"));
        assert_eq!(q.get_list("x"), &["1".to_string(), "3".to_string()]);
        assert_eq!(q.get("y"), Some("two"));
        assert!(q.get_list("missing").is_empty());
    }

    #[test]
    fn test_parse_percent_encoding() {
        let q = QueryDict::parse("name=hello%20world&plus=a+b").unwrap();
        assert_eq!(q.get("name"), Some("hello world"));
        assert_eq!(q.get("plus"), Some("a b"));
    }

    #[test]
    fn test_flag_without_value() {
        let q = QueryDict::parse("flag").unwrap();
        assert!(q.contains_key("flag"));
        assert_eq!(q.get("flag"), Some(""));
    }

    #[test]
    fn test_update_replaces_lists() {
        let mut a = QueryDict::from_pairs([("k", "1"), ("k", "2"), ("j", "x")]);
        let b = QueryDict::from_pairs([("k", "9")]);
        a.update(&b);
        assert_eq!(a.get_list("k"), &["9".to_string()]);
        assert_eq!(a.get("j"), Some("x"));
    }

    #[test]
    fn test_to_query_string_keeps_order() {
        let q = QueryDict::from_pairs([("b", "1"), ("a", "x y"), ("b", "2")]);
        assert_eq!(q.to_query_string(), "b=1&b=2&a=x+y");
    }

    proptest! {
        #[test]
        fn test_encode_parse_preserves_first_value(key in "[a-z]{1,8}", value in "[ -~]{0,16}") {
            let q = QueryDict::from_pairs([(key.clone(), value.clone())]);
            let parsed = QueryDict::parse(&q.to_query_string()).unwrap();
            prop_assert_eq!(parsed.get(&key), Some(value.as_str()));
        }
    }
}
