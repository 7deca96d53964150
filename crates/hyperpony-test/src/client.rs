//! In-memory client for a [`Site`].

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use hyperpony_core::Identity;
use hyperpony_view::Site;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight into a site's dispatcher.
///
/// No sockets are involved; every request runs synchronously through the
/// full view pipeline.
///
/// # Example
///
/// ```
/// use hyperpony_core::{HyperponyResult, Response};
/// use hyperpony_test::TestClient;
/// use hyperpony_view::{Site, View, ViewContext};
///
/// struct Ping;
///
/// impl View for Ping {
///     fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
///         Ok(Response::html("pong"))
///     }
/// }
///
/// let mut site = Site::new();
/// site.route("ping", "/ping/", Ping).unwrap();
///
/// let client = TestClient::new(site);
/// client.get("/ping/").send().assert_success().assert_body_eq("pong");
/// client.get("/nope/").send().assert_status(http::StatusCode::NOT_FOUND);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    site: Arc<Site>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `site`.
    pub fn new(site: Site) -> Self {
        Self::shared(Arc::new(site))
    }

    /// Creates a client for a shared site.
    pub fn shared(site: Arc<Site>) -> Self {
        Self {
            site,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The site under test.
    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request builder bound to a test client.
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Marks the request as sent by htmx.
    pub fn htmx(mut self) -> Self {
        self.builder = self.builder.htmx();
        self
    }

    /// Authenticates the request as `user_id`.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.builder = self.builder.user(user_id);
        self
    }

    /// Sets the caller identity.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.builder = self.builder.identity(identity);
        self
    }

    /// Sends the request. Dispatch errors become error responses.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub fn send(self) -> TestResponse {
        let request = self
            .builder
            .build()
            .unwrap_or_else(|e| panic!("invalid test request: {e}"));
        TestResponse::new(self.client.site.handle(request))
    }

    /// Sends the request, keeping dispatch errors as errors.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client
            .site
            .dispatch(request)
            .map(TestResponse::new)
            .map_err(TestError::Dispatch)
    }
}
