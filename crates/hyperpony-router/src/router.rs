//! Named route table.
//!
//! [`Router`] maps route names to path patterns. It resolves incoming paths to
//! a route name plus captures, and reverses a name plus parameters back to a
//! path.

use std::collections::HashMap;

use crate::error::RouteError;
use crate::node::{Node, SegmentKind};
use crate::params::Params;
use crate::RouteMatch;

#[derive(Debug, Clone)]
struct RoutePattern {
    pattern: String,
    segments: Vec<(String, SegmentKind)>,
    trailing_slash: bool,
}

/// A radix tree router keyed by route name.
///
/// # Example
///
/// ```rust
/// use hyperpony_router::{Params, Router};
///
/// let mut router = Router::new();
/// router.insert("contact-detail", "/contacts/{contact_id}/").unwrap();
///
/// let found = router.resolve("/contacts/17/").unwrap();
/// assert_eq!(found.name, "contact-detail");
/// assert_eq!(found.params.get("contact_id"), Some("17"));
///
/// let params: Params = [("contact_id", "18")].into_iter().collect();
/// assert_eq!(router.reverse("contact-detail", &params).unwrap(), "/contacts/18/");
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    routes: HashMap<String, RoutePattern>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: HashMap::new(),
        }
    }

    /// Registers `pattern` under `name`.
    pub fn insert(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), RouteError> {
        let name = name.into();
        if self.routes.contains_key(&name) {
            return Err(RouteError::DuplicateName(name));
        }
        let segments = Node::parse_pattern(pattern)?;
        self.root.insert(pattern, &name)?;
        self.routes.insert(
            name,
            RoutePattern {
                pattern: pattern.to_string(),
                segments,
                trailing_slash: pattern.len() > 1 && pattern.ends_with('/'),
            },
        );
        Ok(())
    }

    /// Resolves a path (without query string) to a route.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let (name, params) = self.root.match_path(path)?;
        Some(RouteMatch::new(name, params))
    }

    /// Builds the path for `name`, substituting `params`.
    ///
    /// Parameter values are percent-encoded. Unused entries in `params` are
    /// ignored.
    pub fn reverse(&self, name: &str, params: &Params) -> Result<String, RouteError> {
        let route = self.route(name)?;
        let mut path = String::new();
        for (segment, kind) in &route.segments {
            path.push('/');
            match kind {
                SegmentKind::Static => path.push_str(segment),
                SegmentKind::Param(param) => {
                    let value = params.get(param).ok_or_else(|| missing(name, param))?;
                    path.push_str(&urlencoding::encode(value));
                }
                SegmentKind::Wildcard(param) => {
                    let value = params.get(param).ok_or_else(|| missing(name, param))?;
                    let encoded: Vec<_> = value.split('/').map(urlencoding::encode).collect();
                    path.push_str(&encoded.join("/"));
                }
            }
        }
        if path.is_empty() || route.trailing_slash {
            path.push('/');
        }
        Ok(path)
    }

    /// Returns the names of the path parameters `name` requires, in order.
    pub fn required_params(&self, name: &str) -> Result<Vec<&str>, RouteError> {
        let route = self.route(name)?;
        Ok(route
            .segments
            .iter()
            .filter_map(|(_, kind)| match kind {
                SegmentKind::Param(p) | SegmentKind::Wildcard(p) => Some(p.as_str()),
                SegmentKind::Static => None,
            })
            .collect())
    }

    /// Returns the pattern registered under `name`.
    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(|r| r.pattern.as_str())
    }

    /// Returns `true` if a route is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn route(&self, name: &str) -> Result<&RoutePattern, RouteError> {
        self.routes
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))
    }
}

fn missing(route: &str, param: &str) -> RouteError {
    RouteError::MissingParameter {
        route: route.to_string(),
        param: param.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut router = Router::new();
        router.insert("list", "/contacts/").unwrap();
        assert_eq!(
            router.insert("list", "/other/"),
            Err(RouteError::DuplicateName("list".to_string()))
        );
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_resolve_trailing_slash_normalized() {
        let mut router = Router::new();
        router.insert("list", "/contacts").unwrap();
        assert_eq!(router.resolve("/contacts/").unwrap().name, "list");
        assert_eq!(router.resolve("/contacts").unwrap().name, "list");
    }

    #[test]
    fn test_reverse_keeps_trailing_slash() {
        let mut router = Router::new();
        router.insert("edit", "/contacts/{id}/edit/").unwrap();
        router.insert("plain", "/contacts/{id}").unwrap();

        let p = params(&[("id", "5")]);
        assert_eq!(router.reverse("edit", &p).unwrap(), "/contacts/5/edit/");
        assert_eq!(router.reverse("plain", &p).unwrap(), "/contacts/5");
    }

    #[test]
    fn test_reverse_root() {
        let mut router = Router::new();
        router.insert("index", "/").unwrap();
        assert_eq!(router.reverse("index", &Params::new()).unwrap(), "/");
    }

    #[test]
    fn test_reverse_encodes_values() {
        let mut router = Router::new();
        router.insert("search", "/search/{q}").unwrap();
        router.insert("files", "/files/*path").unwrap();

        assert_eq!(
            router.reverse("search", &params(&[("q", "a b/c")])).unwrap(),
            "/search/a%20b%2Fc"
        );
        assert_eq!(
            router
                .reverse("files", &params(&[("path", "img/a b.png")]))
                .unwrap(),
            "/files/img/a%20b.png"
        );
    }

    #[test]
    fn test_reverse_then_resolve() {
        let mut router = Router::new();
        router.insert("item", "/items/{name}/").unwrap();

        let path = router.reverse("item", &params(&[("name", "ä ö")])).unwrap();
        let found = router.resolve(&path).unwrap();
        assert_eq!(found.name, "item");
        assert_eq!(found.params.get("name"), Some("ä ö"));
    }

    #[test]
    fn test_reverse_errors() {
        let mut router = Router::new();
        router.insert("item", "/items/{id}").unwrap();

        assert_eq!(
            router.reverse("nope", &Params::new()),
            Err(RouteError::UnknownRoute("nope".to_string()))
        );
        assert!(matches!(
            router.reverse("item", &Params::new()),
            Err(RouteError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_required_params() {
        let mut router = Router::new();
        router
            .insert("org-user", "/orgs/{org}/users/{user}")
            .unwrap();
        assert_eq!(router.required_params("org-user").unwrap(), vec!["org", "user"]);
        assert_eq!(router.pattern("org-user"), Some("/orgs/{org}/users/{user}"));
        assert!(router.contains("org-user"));
    }
}
