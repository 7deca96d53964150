//! Named route table for Hyperpony.
//!
//! Views are addressed by name. This crate keeps the mapping from route
//! names to path patterns in a radix tree so that a path can be resolved to
//! a name and its captures, and a name plus captures reversed into a path.
//!
//! # Example
//!
//! ```rust
//! use hyperpony_router::Router;
//!
//! let mut router = Router::new();
//! router.insert("contact-list", "/contacts/").unwrap();
//! router.insert("contact-detail", "/contacts/{contact_id}/").unwrap();
//!
//! let found = router.resolve("/contacts/42/").unwrap();
//! assert_eq!(found.name, "contact-detail");
//! assert_eq!(found.params.get("contact_id"), Some("42"));
//! ```
//!
//! # Patterns
//!
//! - static segments: `contacts`
//! - parameters spanning a whole segment: `{contact_id}`
//! - a trailing catch-all: `*path`

mod error;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A resolved route with its name and captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The route name
    pub name: &'a str,
    /// Captured path parameters
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(name: &'a str, params: Params) -> Self {
        Self { name, params }
    }
}
