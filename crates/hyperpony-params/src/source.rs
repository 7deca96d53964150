//! Request source aggregation.
//!
//! A [`SourceTable`] is the per-parameter snapshot of every value the
//! request offers under the parameter's allowed origins. Later sources win:
//!
//! | Step | Source | Merge |
//! |------|--------|-------|
//! | 1 | POST form data | insert |
//! | 2 | Parsed url-encoded or JSON body | absent keys only |
//! | 3 | Route path captures | absent keys only |
//! | 4 | Query string | overwrite |
//! | 5 | Caller keyword values | overwrite |
//!
//! Steps 1-4 are skipped when the view may not read the request.

use hyperpony_core::{QueryDict, Request};
use indexmap::IndexMap;
use serde_json::Value;

use crate::coerce::RawValue;
use crate::descriptor::{Origin, OriginSet};
use crate::value::ParamValues;

/// Default limit for parsed bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Controls how a table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceOptions {
    /// Parse url-encoded and JSON bodies.
    pub parse_body: bool,
    /// Bodies above this size are not parsed.
    pub max_body_bytes: usize,
    /// Read request sources at all (steps 1-4).
    pub read_request: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            parse_body: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            read_request: true,
        }
    }
}

/// Key to raw values, in precedence-resolved form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    entries: IndexMap<String, RawValue>,
}

impl SourceTable {
    /// Builds the table for one origin set.
    ///
    /// Never mutates the request.
    #[must_use]
    pub fn build(
        request: &dyn Request,
        origins: OriginSet,
        options: SourceOptions,
        kwargs: &ParamValues,
    ) -> Self {
        let mut table = Self::default();

        if options.read_request {
            if origins.contains(Origin::Post) {
                table.insert_dict(request.post());
            }

            if options.parse_body && origins.contains_method(request.method()) {
                table.merge_body(request, options.max_body_bytes);
            }

            if origins.contains(Origin::Path) {
                for (name, value) in request.path_params() {
                    if !table.entries.contains_key(name) {
                        table.entries.insert(name.to_string(), RawValue::text(value));
                    }
                }
            }

            if origins.contains(Origin::Get) {
                table.insert_dict(request.query());
            }
        }

        if origins.contains(Origin::Kwargs) {
            for (name, value) in kwargs.iter() {
                table
                    .entries
                    .insert(name.to_string(), RawValue::Value(value.clone()));
            }
        }

        tracing::trace!(
            origins = ?origins,
            read_request = options.read_request,
            keys = table.entries.len(),
            "built parameter source table"
        );

        table
    }

    /// Looks up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_dict(&mut self, dict: &QueryDict) {
        for (key, values) in dict.iter() {
            self.entries
                .insert(key.to_string(), RawValue::Text(values.to_vec()));
        }
    }

    fn merge_absent(&mut self, key: String, values: Vec<String>) {
        if !values.is_empty() && !self.entries.contains_key(&key) {
            self.entries.insert(key, RawValue::Text(values));
        }
    }

    fn merge_body(&mut self, request: &dyn Request, max_body_bytes: usize) {
        let body = request.body();
        if body.is_empty() {
            return;
        }
        if body.len() > max_body_bytes {
            tracing::warn!(
                size = body.len(),
                limit = max_body_bytes,
                "request body too large for parameter parsing, skipped"
            );
            return;
        }

        let Some(mime) = request.mime_type() else {
            return;
        };

        if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
                Ok(pairs) => {
                    let dict = QueryDict::from_pairs(pairs);
                    for (key, values) in dict.iter() {
                        self.merge_absent(key.to_string(), values.to_vec());
                    }
                }
                Err(e) => tracing::debug!(error = %e, "ignoring malformed url-encoded body"),
            }
        } else if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => {
                    for (key, value) in map {
                        self.merge_absent(key, json_to_raw(value));
                    }
                }
                Ok(_) => tracing::debug!("ignoring JSON body that is not an object"),
                Err(e) => tracing::debug!(error = %e, "ignoring malformed JSON body"),
            }
        }
    }
}

fn json_to_raw(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Bool(b) => vec![b.to_string()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items.into_iter().flat_map(json_to_raw).collect(),
        object @ Value::Object(_) => vec![object.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::HttpRequest;
    use http::Method;
    use proptest::prelude::*;

    fn texts(table: &SourceTable, key: &str) -> Option<Vec<String>> {
        match table.get(key)? {
            RawValue::Text(values) => Some(values.clone()),
            RawValue::Value(_) => None,
        }
    }

    fn form_post(uri: &str, body: &str) -> HttpRequest {
        HttpRequest::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_query_overrides_post() {
        let request = form_post("/?p1=query", "p1=body&p2=body");
        let table = SourceTable::build(
            &request,
            OriginSet::ALL,
            SourceOptions::default(),
            &ParamValues::new(),
        );
        assert_eq!(texts(&table, "p1"), Some(vec!["query".to_string()]));
        assert_eq!(texts(&table, "p2"), Some(vec!["body".to_string()]));
    }

    #[test]
    fn test_kwargs_override_everything() {
        let request = form_post("/?p1=query", "p1=body");
        let kwargs = ParamValues::new().with("p1", "kw");
        let table = SourceTable::build(&request, OriginSet::ALL, SourceOptions::default(), &kwargs);
        assert_eq!(table.get("p1"), Some(&RawValue::Value("kw".into())));
    }

    #[test]
    fn test_json_body_for_put() {
        let request = HttpRequest::builder()
            .method(Method::PUT)
            .uri("/?p_get=get")
            .header("content-type", "application/json")
            .body(r#"{"p_put": "put", "n": 3, "ids": [1, 2], "none": null}"#)
            .build()
            .unwrap();
        let table = SourceTable::build(
            &request,
            OriginSet::ALL,
            SourceOptions::default(),
            &ParamValues::new(),
        );
        assert_eq!(texts(&table, "p_put"), Some(vec!["put".to_string()]));
        assert_eq!(texts(&table, "n"), Some(vec!["3".to_string()]));
        assert_eq!(texts(&table, "ids"), Some(vec!["1".to_string(), "2".to_string()]));
        assert!(!table.contains_key("none"));
        assert_eq!(texts(&table, "p_get"), Some(vec!["get".to_string()]));
    }

    #[test]
    fn test_post_only_ignores_put_body() {
        let request = HttpRequest::builder()
            .method(Method::PUT)
            .header("content-type", "application/json")
            .body(r#"{"p_post_only": "x"}"#)
            .build()
            .unwrap();
        let table = SourceTable::build(
            &request,
            OriginSet::from([Origin::Post]),
            SourceOptions::default(),
            &ParamValues::new(),
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_path_only_fills_absent_keys() {
        let request = HttpRequest::builder()
            .uri("/?id=query")
            .path_param("id", "path")
            .path_param("slug", "hello")
            .build()
            .unwrap();
        let table = SourceTable::build(
            &request,
            OriginSet::ALL,
            SourceOptions::default(),
            &ParamValues::new(),
        );
        assert_eq!(texts(&table, "id"), Some(vec!["query".to_string()]));
        assert_eq!(texts(&table, "slug"), Some(vec!["hello".to_string()]));
    }

    #[test]
    fn test_body_parsing_disabled_and_oversized() {
        let request = HttpRequest::builder()
            .method(Method::PATCH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body("a=1")
            .build()
            .unwrap();
        let disabled = SourceOptions {
            parse_body: false,
            ..SourceOptions::default()
        };
        let table = SourceTable::build(&request, OriginSet::ALL, disabled, &ParamValues::new());
        assert!(!table.contains_key("a"));

        let tiny = SourceOptions {
            max_body_bytes: 2,
            ..SourceOptions::default()
        };
        let table = SourceTable::build(&request, OriginSet::ALL, tiny, &ParamValues::new());
        assert!(!table.contains_key("a"));

        let table = SourceTable::build(
            &request,
            OriginSet::ALL,
            SourceOptions::default(),
            &ParamValues::new(),
        );
        assert_eq!(texts(&table, "a"), Some(vec!["1".to_string()]));
    }

    #[test]
    fn test_request_sources_skipped_when_not_readable() {
        let request = form_post("/?p1=query", "p1=body");
        let kwargs = ParamValues::new().with("p2", 2_i64);
        let options = SourceOptions {
            read_request: false,
            ..SourceOptions::default()
        };
        let table = SourceTable::build(&request, OriginSet::ALL, options, &kwargs);
        assert!(!table.contains_key("p1"));
        assert!(table.contains_key("p2"));
        assert_eq!(table.len(), 1);
    }

    proptest! {
        #[test]
        fn test_query_wins_for_any_key(key in "[a-z][a-z0-9_]{0,12}", q in "[a-z0-9]{1,8}", b in "[a-z0-9]{1,8}") {
            let request = form_post(&format!("/?{key}={q}"), &format!("{key}={b}"));
            let table = SourceTable::build(
                &request,
                OriginSet::ALL,
                SourceOptions::default(),
                &ParamValues::new(),
            );
            prop_assert_eq!(texts(&table, &key), Some(vec![q]));
        }
    }
}
