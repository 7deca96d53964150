//! Caller identity.
//!
//! Authentication is performed by the host application. Hyperpony only reads
//! the resolved identity, to decide whether a login-required view may run.

use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name, if known.
    pub username: Option<String>,
}

/// The identity of the caller of a request.
///
/// # Example
///
/// ```rust
/// use hyperpony_core::Identity;
///
/// let identity = Identity::user("u-123");
/// assert!(identity.is_authenticated());
/// assert_eq!(identity.log_id(), "user:u-123");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// No authenticated user.
    #[default]
    Anonymous,
    /// An authenticated user.
    User(UserIdentity),
}

impl Identity {
    /// Creates an anonymous identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates a user identity without a display name.
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User(UserIdentity {
            user_id: user_id.into(),
            username: None,
        })
    }

    /// Creates a user identity with a display name.
    #[must_use]
    pub fn named_user(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self::User(UserIdentity {
            user_id: user_id.into(),
            username: Some(username.into()),
        })
    }

    /// Returns `true` for any identity other than [`Identity::Anonymous`].
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Returns the user id, if authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(u) => Some(&u.user_id),
            Self::Anonymous => None,
        }
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// Never includes anything beyond the user id.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::User(u) => format!("user:{}", u.user_id),
            Self::Anonymous => "anonymous".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_default() {
        let identity = Identity::default();
        assert_eq!(identity, Identity::Anonymous);
        assert!(!identity.is_authenticated());
        assert_eq!(identity.user_id(), None);
        assert_eq!(identity.log_id(), "anonymous");
    }

    #[test]
    fn test_user_log_id() {
        let identity = Identity::named_user("u-1", "alice");
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id(), Some("u-1"));
        assert_eq!(identity.log_id(), "user:u-1");
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&Identity::user("u-2")).unwrap();
        assert!(json.contains("\"kind\":\"user\""));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id(), Some("u-2"));
    }
}
