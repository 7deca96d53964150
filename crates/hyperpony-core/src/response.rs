//! The response type views return.
//!
//! A [`Response`] is a buffered status/headers/body triple plus two flags the
//! pipeline cares about: whether the body is streamed (never rewritten), and
//! whether it has already been wrapped as an element.
//!
//! | Constructor | Content-Type |
//! |-------------|--------------|
//! | [`Response::html`] | `text/html; charset=utf-8` |
//! | [`Response::text_plain`] | `text/plain; charset=utf-8` |
//! | [`Response::json`] | `application/json` |
//! | [`Response::redirect`] | none (302) |
//! | [`Response::streaming`] | caller supplied |

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::error::{HyperponyError, HyperponyResult};

/// Content type used for HTML responses.
pub const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";

/// A buffered HTTP response.
///
/// # Example
///
/// ```rust
/// use hyperpony_core::Response;
///
/// let response = Response::html("<p>hi</p>");
/// assert!(response.is_processable("text/html"));
/// assert_eq!(response.text().unwrap(), "<p>hi</p>");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    streaming: bool,
    element: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            streaming: false,
            element: false,
        }
    }

    fn with_content(content_type: &'static str, body: Bytes) -> Self {
        let mut response = Self::new(StatusCode::OK);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response.body = body;
        response
    }

    /// Creates an HTML response with status 200 OK.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_content(TEXT_HTML_UTF8, Bytes::from(body.into()))
    }

    /// Creates a plain text response with status 200 OK.
    #[must_use]
    pub fn text_plain(body: impl Into<String>) -> Self {
        Self::with_content("text/plain; charset=utf-8", Bytes::from(body.into()))
    }

    /// Creates a JSON response with status 200 OK.
    pub fn json<T: Serialize>(data: &T) -> HyperponyResult<Self> {
        let body = serde_json::to_vec(data)
            .map_err(|e| HyperponyError::internal_with_source("JSON serialization failed", e))?;
        Ok(Self::with_content("application/json", Bytes::from(body)))
    }

    /// Creates a `302 Found` redirect.
    pub fn redirect(location: &str) -> HyperponyResult<Self> {
        let mut response = Self::new(StatusCode::FOUND);
        response.set_header(LOCATION, location)?;
        Ok(response)
    }

    /// Creates a streaming response. Streaming bodies are never rewritten.
    #[must_use]
    pub fn streaming(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let mut response = Self::with_content(content_type, body.into());
        response.streaming = true;
        response
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> HyperponyResult<()> {
        let value = HeaderValue::from_str(value).map_err(|e| {
            HyperponyError::internal_with_source(format!("invalid value for header '{name}'"), e)
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Returns the `Content-Type` header, or an empty string.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE.as_str()).unwrap_or("")
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Returns `true` for streaming responses.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Returns `true` if the body may be read and rewritten as `content_type_prefix`.
    ///
    /// Streaming responses are never processable.
    #[must_use]
    pub fn is_processable(&self, content_type_prefix: &str) -> bool {
        if self.streaming {
            return false;
        }
        let prefix = content_type_prefix.trim().to_ascii_lowercase();
        self.content_type().to_ascii_lowercase().starts_with(&prefix)
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> HyperponyResult<&str> {
        std::str::from_utf8(&self.body).map_err(|e| HyperponyError::UnsupportedResponseType {
            found: format!("a body that is not valid UTF-8 ({e})"),
        })
    }

    /// Returns the body as text for processable `text/*` responses, else `None`.
    #[must_use]
    pub fn text_or_none(&self) -> Option<&str> {
        if self.is_processable("text/") {
            self.text().ok()
        } else {
            None
        }
    }

    /// Returns `true` once the response has been wrapped as an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.element
    }

    /// Marks the response as wrapped.
    pub fn mark_element(&mut self) {
        self.element = true;
    }

    /// Converts into an `http::Response`.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
