//! Routing errors.

use thiserror::Error;

/// Errors raised while registering, resolving or reversing routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route is registered under the given name.
    #[error("no route named '{0}'")]
    UnknownRoute(String),

    /// A route with this name already exists.
    #[error("a route named '{0}' is already registered")]
    DuplicateName(String),

    /// Another route already ends at the same pattern.
    #[error("pattern '{pattern}' conflicts with route '{existing}'")]
    Conflict {
        /// The rejected pattern.
        pattern: String,
        /// Name of the route already registered there.
        existing: String,
    },

    /// The pattern could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Reversing a route without one of its path parameters.
    #[error("route '{route}' requires path parameter '{param}'")]
    MissingParameter {
        /// Name of the route being reversed.
        route: String,
        /// The missing parameter.
        param: String,
    },

    /// No route matches the path.
    #[error("no route matches path '{0}'")]
    NoMatch(String),
}
