//! The request surface views observe.
//!
//! [`Request`] is the full read-only interface a view, the parameter engine
//! and the pipeline stages use. [`HttpRequest`] is the concrete request the
//! host hands to `Site::dispatch`; wrappers such as the isolated and embedded
//! requests implement the same trait and forward what they do not override.

use std::fmt;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use hyperpony_router::Params;

use crate::error::{HyperponyError, HyperponyResult};
use crate::identity::Identity;
use crate::query_dict::QueryDict;

/// Header set by htmx on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Read access to an in-flight request.
pub trait Request: fmt::Debug {
    /// The HTTP method.
    fn method(&self) -> &Method;

    /// The request path, without query string.
    fn path(&self) -> &str;

    /// Request headers.
    fn headers(&self) -> &HeaderMap;

    /// Parsed query string.
    fn query(&self) -> &QueryDict;

    /// Parsed url-encoded form body. Empty unless the method is POST.
    fn post(&self) -> &QueryDict;

    /// The raw request body.
    fn body(&self) -> &[u8];

    /// The caller identity.
    fn identity(&self) -> &Identity;

    /// Path parameters captured by the resolved route.
    fn path_params(&self) -> &Params;

    /// Name of the resolved route, if any.
    fn route_name(&self) -> Option<&str>;

    /// Host-provided request extensions (sessions and the like).
    fn extensions(&self) -> &Extensions;

    /// Returns `true` for requests fabricated to invoke a view programmatically.
    fn is_embedded(&self) -> bool {
        false
    }

    /// The `Content-Type` header value.
    fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// The parsed content type, ignoring unparsable headers.
    fn mime_type(&self) -> Option<mime::Mime> {
        self.content_type().and_then(|ct| ct.parse().ok())
    }

    /// Returns a header value as a string.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a cookie value from the `Cookie` header.
    fn cookie(&self, name: &str) -> Option<String> {
        self.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"').to_string())
    }

    /// Returns `true` if the request was issued by htmx.
    fn is_htmx(&self) -> bool {
        self.header(HX_REQUEST) == Some("true")
    }
}

/// A concrete request, as received from the host.
///
/// # Example
///
/// ```
/// use hyperpony_core::{HttpRequest, Request};
/// use http::Method;
///
/// let request = HttpRequest::builder()
///     .method(Method::POST)
///     .uri("/contacts/?page=2")
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("name=Ada")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.path(), "/contacts/");
/// assert_eq!(request.query().get("page"), Some("2"));
/// assert_eq!(request.post().get("name"), Some("Ada"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    query: QueryDict,
    post: QueryDict,
    identity: Identity,
    path_params: Params,
    route_name: Option<String>,
    extensions: Extensions,
}

impl HttpRequest {
    /// Starts building a request.
    #[must_use]
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Returns the full URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Records the route this request was resolved to.
    pub fn set_route(&mut self, name: impl Into<String>, params: Params) {
        self.route_name = Some(name.into());
        self.path_params = params;
    }

    /// Replaces the caller identity.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    /// Mutable access to the extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl Request for HttpRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        self.uri.path()
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn query(&self) -> &QueryDict {
        &self.query
    }

    fn post(&self) -> &QueryDict {
        &self.post
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn path_params(&self) -> &Params {
        &self.path_params
    }

    fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    identity: Identity,
    path_params: Params,
    route_name: Option<String>,
    extensions: Extensions,
}

impl HttpRequestBuilder {
    /// Sets the HTTP method (default GET).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI, including any query string.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the caller identity.
    #[must_use]
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Adds a captured path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.set(name, value);
        self
    }

    /// Sets the resolved route name.
    #[must_use]
    pub fn route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    /// Inserts a typed extension.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the request, parsing the query string and any form body.
    pub fn build(self) -> HyperponyResult<HttpRequest> {
        let uri_text = self.uri.unwrap_or_else(|| "/".to_string());
        let uri: Uri = uri_text
            .parse()
            .map_err(|e| HyperponyError::internal_with_source(format!("invalid uri '{uri_text}'"), e))?;

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HyperponyError::internal_with_source(format!("invalid header name '{name}'"), e)
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                HyperponyError::internal_with_source(format!("invalid value for header '{name}'"), e)
            })?;
            headers.append(header_name, header_value);
        }

        let query = match uri.query() {
            Some(q) => QueryDict::parse(q)
                .map_err(|e| HyperponyError::internal_with_source("invalid query string", e))?,
            None => QueryDict::new(),
        };

        let method = self.method.unwrap_or(Method::GET);
        let is_form = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.essence_str() == "application/x-www-form-urlencoded");
        let post = if method == Method::POST && is_form {
            let text = std::str::from_utf8(&self.body)
                .map_err(|e| HyperponyError::internal_with_source("form body is not UTF-8", e))?;
            QueryDict::parse(text)
                .map_err(|e| HyperponyError::internal_with_source("invalid form body", e))?
        } else {
            QueryDict::new()
        };

        Ok(HttpRequest {
            method,
            uri,
            headers,
            body: self.body,
            query,
            post,
            identity: self.identity,
            path_params: self.path_params,
            route_name: self.route_name,
            extensions: self.extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = HttpRequest::builder().build().unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.query().is_empty());
        assert!(request.post().is_empty());
        assert!(!request.is_embedded());
        assert!(!request.is_htmx());
        assert_eq!(request.identity(), &Identity::Anonymous);
    }

    #[test]
    fn test_post_only_parsed_for_post_forms() {
        let put = HttpRequest::builder()
            .method(Method::PUT)
            .header("content-type", "application/x-www-form-urlencoded")
            .body("a=1")
            .build()
            .unwrap();
        assert!(put.post().is_empty());
        assert_eq!(put.body(), b"a=1");

        let json = HttpRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body(r#"{"a":1}"#)
            .build()
            .unwrap();
        assert!(json.post().is_empty());
    }

    #[test]
    fn test_form_with_charset() {
        let request = HttpRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
            .body("a=1&a=2")
            .build()
            .unwrap();
        assert_eq!(request.post().get_list("a").len(), 2);
    }

    #[test]
    fn test_cookies_and_htmx() {
        let request = HttpRequest::builder()
            .header("cookie", "sessionid=abc; theme=\"dark\"")
            .header("HX-Request", "true")
            .build()
            .unwrap();
        assert_eq!(request.cookie("sessionid").as_deref(), Some("abc"));
        assert_eq!(request.cookie("theme").as_deref(), Some("dark"));
        assert_eq!(request.cookie("missing"), None);
        assert!(request.is_htmx());
    }

    #[test]
    fn test_invalid_uri() {
        let err = HttpRequest::builder().uri("/a b").build().unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_set_route() {
        let mut request = HttpRequest::builder().uri("/c/5").build().unwrap();
        let params: Params = [("id", "5")].into_iter().collect();
        request.set_route("contact", params);
        assert_eq!(request.route_name(), Some("contact"));
        assert_eq!(request.path_params().get("id"), Some("5"));
    }

    #[test]
    fn test_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct Session(u32);

        let request = HttpRequest::builder()
            .extension(Session(7))
            .build()
            .unwrap();
        assert_eq!(request.extensions().get::<Session>(), Some(&Session(7)));
    }
}
