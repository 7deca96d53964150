//! Test response wrapper.

use std::fmt;

use http::{header, HeaderMap, StatusCode};
use hyperpony_core::Response;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A view response with assertion helpers.
///
/// Assertions return `&Self` so they chain:
///
/// ```
/// use hyperpony_core::Response;
/// use hyperpony_test::TestResponse;
///
/// TestResponse::new(Response::html("<p>saved</p>"))
///     .assert_success()
///     .assert_contains("saved")
///     .assert_content_type("text/html");
/// ```
pub struct TestResponse {
    response: Response,
}

impl TestResponse {
    /// Wraps a response.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self { response }
    }

    /// The wrapped response.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Unwraps the response.
    #[must_use]
    pub fn into_inner(self) -> Response {
        self.response
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.response.header(name.as_ref())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns `true` if the body was wrapped as an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.response.is_element()
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(self.response.body())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(self.response.body())?)
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.status()
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    ///
    /// # Panics
    ///
    /// Panics if the status is not 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(self.is_success(), "Expected success status, got {}", self.status());
        self
    }

    /// Asserts a `302` to `location`.
    ///
    /// # Panics
    ///
    /// Panics on another status or location.
    pub fn assert_redirect(&self, location: impl AsRef<str>) -> &Self {
        self.assert_status(StatusCode::FOUND)
            .assert_header(header::LOCATION.as_str(), location)
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}': expected '{expected}', got '{actual}'");
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header is set.
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(self.header(name).is_none(), "Header '{name}' should not be set");
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self.content_type().unwrap_or_default();
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body contains the expected substring.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the substring.
    pub fn assert_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = self.body_text();
        assert!(body.contains(expected), "Body should contain '{expected}', got: {body}");
        self
    }

    /// Asserts that the body does not contain `unexpected`.
    ///
    /// # Panics
    ///
    /// Panics if the body contains the substring.
    pub fn assert_not_contains(&self, unexpected: impl AsRef<str>) -> &Self {
        let unexpected = unexpected.as_ref();
        let body = self.body_text();
        assert!(!body.contains(unexpected), "Body should not contain '{unexpected}', got: {body}");
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        assert_eq!(self.body_text(), expected.as_ref(), "Body mismatch");
        self
    }

    fn body_text(&self) -> &str {
        self.text().unwrap_or_else(|e| panic!("Body should be valid UTF-8: {e}"))
    }
}

impl From<Response> for TestResponse {
    fn from(response: Response) -> Self {
        Self::new(response)
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status())
            .field("headers", self.headers())
            .field("body_len", &self.response.body().len())
            .finish()
    }
}
