//! Request wrappers for nested rendering and embedded invocation.
//!
//! Both wrappers own the fields they override and forward everything else
//! to the request they wrap. Headers, cookies, identity and extensions are
//! always the outer request's.

use http::{Extensions, HeaderMap, Method};
use hyperpony_core::{Identity, Params, QueryDict, Request};

/// A view of the outer request as a side-effect free `GET`.
///
/// Used when a view renders as a logical child of the current page: the
/// child must not see the parent's in-flight form data.
///
/// # Example
///
/// ```
/// use http::Method;
/// use hyperpony_core::{HttpRequest, Request};
/// use hyperpony_view::IsolatedRequest;
///
/// let outer = HttpRequest::builder()
///     .method(Method::POST)
///     .uri("/contacts/?page=2")
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("name=Ada")
///     .build()
///     .unwrap();
///
/// let isolated = IsolatedRequest::new(&outer);
/// assert_eq!(isolated.method(), Method::GET);
/// assert!(isolated.query().is_empty());
/// assert!(isolated.post().is_empty());
/// assert_eq!(isolated.path(), "/contacts/");
/// ```
#[derive(Debug)]
pub struct IsolatedRequest<'a> {
    inner: &'a dyn Request,
    method: Method,
    empty: QueryDict,
}

impl<'a> IsolatedRequest<'a> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: &'a dyn Request) -> Self {
        Self {
            inner,
            method: Method::GET,
            empty: QueryDict::new(),
        }
    }

    /// The wrapped request.
    #[must_use]
    pub fn inner(&self) -> &'a dyn Request {
        self.inner
    }
}

impl Request for IsolatedRequest<'_> {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        self.inner.path()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn query(&self) -> &QueryDict {
        &self.empty
    }

    fn post(&self) -> &QueryDict {
        &self.empty
    }

    fn body(&self) -> &[u8] {
        &[]
    }

    fn identity(&self) -> &Identity {
        self.inner.identity()
    }

    fn path_params(&self) -> &Params {
        self.inner.path_params()
    }

    fn route_name(&self) -> Option<&str> {
        self.inner.route_name()
    }

    fn extensions(&self) -> &Extensions {
        self.inner.extensions()
    }

    fn is_embedded(&self) -> bool {
        self.inner.is_embedded()
    }

    fn content_type(&self) -> Option<&str> {
        None
    }
}

/// A request fabricated to invoke a named view programmatically.
///
/// Method, query, form data, path and route are owned; the method is `POST`
/// when form data was given and `GET` otherwise.
#[derive(Debug)]
pub struct EmbeddedRequest<'a> {
    inner: &'a dyn Request,
    method: Method,
    path: String,
    query: QueryDict,
    post: QueryDict,
    path_params: Params,
    route_name: String,
}

impl<'a> EmbeddedRequest<'a> {
    /// Creates an embedded request on top of `inner`.
    #[must_use]
    pub fn new(inner: &'a dyn Request, get: Option<QueryDict>, post: Option<QueryDict>) -> Self {
        let method = if post.is_some() { Method::POST } else { Method::GET };
        Self {
            inner,
            method,
            path: inner.path().to_string(),
            query: get.unwrap_or_default(),
            post: post.unwrap_or_default(),
            path_params: Params::new(),
            route_name: String::new(),
        }
    }

    /// Sets the resolved route: its name, reversed path and captures.
    #[must_use]
    pub fn with_route(
        mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        params: Params,
    ) -> Self {
        self.route_name = name.into();
        self.path = path.into();
        self.path_params = params;
        self
    }

    /// The request the embedded one delegates to.
    #[must_use]
    pub fn inner(&self) -> &'a dyn Request {
        self.inner
    }
}

impl Request for EmbeddedRequest<'_> {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn query(&self) -> &QueryDict {
        &self.query
    }

    fn post(&self) -> &QueryDict {
        &self.post
    }

    fn body(&self) -> &[u8] {
        &[]
    }

    fn identity(&self) -> &Identity {
        self.inner.identity()
    }

    fn path_params(&self) -> &Params {
        &self.path_params
    }

    fn route_name(&self) -> Option<&str> {
        Some(&self.route_name)
    }

    fn extensions(&self) -> &Extensions {
        self.inner.extensions()
    }

    fn is_embedded(&self) -> bool {
        true
    }

    fn content_type(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::HttpRequest;

    fn outer() -> HttpRequest {
        HttpRequest::builder()
            .method(Method::POST)
            .uri("/contacts/?page=2")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("cookie", "sessionid=abc")
            .header("hx-request", "true")
            .body("name=Ada")
            .identity(Identity::user("7"))
            .path_param("contact_id", "3")
            .route_name("contact-list")
            .build()
            .unwrap()
    }

    #[test]
    fn test_isolated_hides_payload() {
        let outer = outer();
        let isolated = IsolatedRequest::new(&outer);
        assert_eq!(isolated.method(), Method::GET);
        assert!(isolated.query().is_empty());
        assert!(isolated.post().is_empty());
        assert!(isolated.body().is_empty());
        assert_eq!(isolated.content_type(), None);
    }

    #[test]
    fn test_isolated_delegates_the_rest() {
        let outer = outer();
        let isolated = IsolatedRequest::new(&outer);
        assert_eq!(isolated.path(), "/contacts/");
        assert_eq!(isolated.cookie("sessionid").as_deref(), Some("abc"));
        assert_eq!(isolated.identity().user_id(), Some("7"));
        assert_eq!(isolated.path_params().get("contact_id"), Some("3"));
        assert_eq!(isolated.route_name(), Some("contact-list"));
        assert!(isolated.is_htmx());
        assert!(!isolated.is_embedded());
    }

    #[test]
    fn test_embedded_method_follows_post() {
        let outer = outer();
        let get = EmbeddedRequest::new(&outer, None, None);
        assert_eq!(get.method(), Method::GET);
        assert!(get.post().is_empty());

        let post = EmbeddedRequest::new(
            &outer,
            None,
            Some(QueryDict::from_pairs([("title", "x")])),
        );
        assert_eq!(post.method(), Method::POST);
        assert_eq!(post.post().get("title"), Some("x"));
    }

    #[test]
    fn test_embedded_owns_route_and_delegates_identity() {
        let outer = outer();
        let params: Params = [("todo_id", "9")].into_iter().collect();
        let embedded = EmbeddedRequest::new(
            &outer,
            Some(QueryDict::from_pairs([("filter", "open")])),
            None,
        )
        .with_route("todo-detail", "/todos/9/", params);

        assert!(embedded.is_embedded());
        assert_eq!(embedded.path(), "/todos/9/");
        assert_eq!(embedded.route_name(), Some("todo-detail"));
        assert_eq!(embedded.path_params().get("todo_id"), Some("9"));
        assert_eq!(embedded.query().get("filter"), Some("open"));
        assert_eq!(embedded.identity().user_id(), Some("7"));
        assert_eq!(embedded.cookie("sessionid").as_deref(), Some("abc"));
        assert!(embedded.body().is_empty());
    }

    #[test]
    fn test_isolating_an_embedded_request_stays_embedded() {
        let outer = outer();
        let embedded = EmbeddedRequest::new(&outer, None, Some(QueryDict::new()));
        let isolated = IsolatedRequest::new(&embedded);
        assert!(isolated.is_embedded());
        assert_eq!(isolated.method(), Method::GET);
    }
}
