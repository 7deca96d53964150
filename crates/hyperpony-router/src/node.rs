//! Radix tree node implementation.
//!
//! Each node is one path segment. A node that ends a registered pattern
//! carries the name of that route.

use crate::error::RouteError;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "contacts")
    Static,
    /// Named parameter (e.g., "{contact_id}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Name of the route ending at this node
    pub route: Option<String>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, must be leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            route: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind(String::new(), SegmentKind::Static)
    }

    /// Parses a pattern into segments.
    pub fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, s) in raw.iter().enumerate() {
            let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() {
                    return Err(invalid(pattern, "empty parameter name"));
                }
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix('*') {
                if i + 1 != raw.len() {
                    return Err(invalid(pattern, "wildcard must be the last segment"));
                }
                SegmentKind::Wildcard(name.to_string())
            } else if s.contains(['{', '}']) {
                return Err(invalid(pattern, "parameters must span a whole segment"));
            } else {
                SegmentKind::Static
            };
            segments.push(((*s).to_string(), kind));
        }
        Ok(segments)
    }

    /// Inserts a route name at the end of `pattern`.
    pub fn insert(&mut self, pattern: &str, name: &str) -> Result<(), RouteError> {
        let segments = Self::parse_pattern(pattern)?;
        self.insert_segments(pattern, &segments, name)
    }

    fn insert_segments(
        &mut self,
        pattern: &str,
        segments: &[(String, SegmentKind)],
        name: &str,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.claim(pattern, name);
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => i,
                    Err(i) => {
                        self.static_children
                            .insert(i, Self::with_kind(segment.clone(), SegmentKind::Static));
                        i
                    }
                };
                self.static_children[index].insert_segments(pattern, remaining, name)
            }
            SegmentKind::Param(param) => {
                let child = self.param_child.get_or_insert_with(|| {
                    Box::new(Self::with_kind(segment.clone(), kind.clone()))
                });
                if child.kind != *kind {
                    return Err(invalid(
                        pattern,
                        &format!("parameter '{param}' shadows '{}'", child.segment),
                    ));
                }
                child.insert_segments(pattern, remaining, name)
            }
            SegmentKind::Wildcard(_) => {
                let child = self.wildcard_child.get_or_insert_with(|| {
                    Box::new(Self::with_kind(segment.clone(), kind.clone()))
                });
                child.claim(pattern, name)
            }
        }
    }

    fn claim(&mut self, pattern: &str, name: &str) -> Result<(), RouteError> {
        match &self.route {
            Some(existing) => Err(RouteError::Conflict {
                pattern: pattern.to_string(),
                existing: existing.clone(),
            }),
            None => {
                self.route = Some(name.to_string());
                Ok(())
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the route name and the captured (percent-decoded) parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&str, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let name = self.match_segments(&segments, &mut params)?;
        Some((name, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a str> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.route.as_deref();
        };

        // Static first
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), decode(segment));
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                let rest: Vec<String> = segments.iter().map(|s| decode(s)).collect();
                params.push(name.clone(), rest.join("/"));
                return child.route.as_deref();
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn invalid(pattern: &str, reason: &str) -> RouteError {
    RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_kinds() {
        let segments = Node::parse_pattern("/files/{owner}/*path").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].1, SegmentKind::Static);
        assert_eq!(segments[1].1, SegmentKind::Param("owner".to_string()));
        assert_eq!(segments[2].1, SegmentKind::Wildcard("path".to_string()));
    }

    #[test]
    fn test_parse_pattern_rejects_inner_wildcard() {
        let err = Node::parse_pattern("/files/*path/more").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn test_parse_pattern_rejects_partial_param() {
        assert!(Node::parse_pattern("/users/id-{id}").is_err());
        assert!(Node::parse_pattern("/users/{}").is_err());
    }

    #[test]
    fn test_insert_and_match_param() {
        let mut root = Node::root();
        root.insert("/contacts/{id}", "contact-detail").unwrap();

        let (name, params) = root.match_path("/contacts/123").unwrap();
        assert_eq!(name, "contact-detail");
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert("/users/me", "me").unwrap();
        root.insert("/users/{id}", "user").unwrap();

        assert_eq!(root.match_path("/users/me").unwrap().0, "me");
        assert_eq!(root.match_path("/users/7").unwrap().0, "user");
    }

    #[test]
    fn test_param_backtracking_drops_capture() {
        let mut root = Node::root();
        root.insert("/a/{x}/b", "first").unwrap();
        root.insert("/a/*rest", "fallback").unwrap();

        let (name, params) = root.match_path("/a/1/c").unwrap();
        assert_eq!(name, "fallback");
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("1/c"));
    }

    #[test]
    fn test_captures_are_decoded() {
        let mut root = Node::root();
        root.insert("/search/{q}", "search").unwrap();

        let (_, params) = root.match_path("/search/hello%20world").unwrap();
        assert_eq!(params.get("q"), Some("hello world"));
    }

    #[test]
    fn test_conflicting_pattern() {
        let mut root = Node::root();
        root.insert("/users/{id}", "user").unwrap();
        let err = root.insert("/users/{id}", "other").unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                pattern: "/users/{id}".to_string(),
                existing: "user".to_string(),
            }
        );
    }

    #[test]
    fn test_shadowing_param_rejected() {
        let mut root = Node::root();
        root.insert("/users/{id}", "user").unwrap();
        assert!(root.insert("/users/{pk}/edit", "edit").is_err());
    }

    #[test]
    fn test_root_route() {
        let mut root = Node::root();
        root.insert("/", "index").unwrap();
        assert_eq!(root.match_path("/").unwrap().0, "index");
        assert!(root.match_path("/missing").is_none());
    }
}
