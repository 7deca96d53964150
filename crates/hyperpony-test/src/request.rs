//! Request factory.

use bytes::Bytes;
use http::{header, Method};
use hyperpony_core::{HttpRequest, Identity, HX_REQUEST};
use serde::Serialize;

use crate::error::TestError;

/// Entry points of the request factory.
///
/// # Example
///
/// ```
/// use hyperpony_core::Request;
/// use hyperpony_test::TestRequest;
///
/// let request = TestRequest::post("/contacts/?page=2")
///     .form(&[("name", "Ada")])
///     .htmx()
///     .user("7")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.query().get("page"), Some("2"));
/// assert_eq!(request.post().get("name"), Some("Ada"));
/// assert!(request.is_htmx());
/// assert!(request.identity().is_authenticated());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TestRequest;

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Creates a new HEAD request.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }
}

/// Builder for test requests.
///
/// Encoding problems are reported by [`build`](Self::build), not by the
/// setter that caused them.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    identity: Identity,
    path_params: Vec<(String, String)>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: Vec::new(),
            body: None,
            identity: Identity::Anonymous,
            path_params: Vec::new(),
            error: None,
        }
    }

    /// Sets a header, replacing an earlier value of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value.as_ref().to_string()));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Some(Bytes::from(bytes)),
            Err(e) => self.error = Some(e.into()),
        }
        self.content_type("application/json")
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Some(Bytes::from(encoded)),
            Err(e) => self.error = Some(e.into()),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Marks the request as sent by htmx.
    pub fn htmx(self) -> Self {
        self.header(HX_REQUEST, "true")
    }

    /// Authenticates the request as `user_id`.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.identity = Identity::user(user_id);
        self
    }

    /// Sets the caller identity.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Pre-fills a captured path parameter.
    ///
    /// Only useful for requests handed to a view directly; a dispatch through
    /// the site replaces the parameters with the route's captures.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    /// Builds the request.
    pub fn build(self) -> Result<HttpRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut builder = HttpRequest::builder()
            .method(self.method)
            .uri(self.uri)
            .identity(self.identity);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        for (name, value) in self.path_params {
            builder = builder.path_param(name, value);
        }
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        builder
            .build()
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }
}
