//! Error types for Hyperpony.
//!
//! [`HyperponyError`] is the single error type crossing crate boundaries.
//! Parameter coercion and entity lookup failures are the only variants a
//! view may opt into receiving as data (see `hyperpony_params::ErrorPolicy`);
//! everything else always propagates to the host framework.

use http::StatusCode;
use hyperpony_router::RouteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HyperponyError`].
pub type HyperponyResult<T> = Result<T, HyperponyError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A request parameter could not be resolved or converted.
    Parameter,
    /// An entity lookup by primary key failed.
    NotFound,
    /// A rendered fragment violated a markup invariant.
    Markup,
    /// An API was used outside its allowed context.
    Usage,
    /// A named view or URL could not be resolved.
    Routing,
    /// Internal failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    ///
    /// Parameter failures map to a server error: a view that declares a
    /// required parameter treats its absence as a programming error unless
    /// it opts into receiving the failure as data.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Routing => StatusCode::NOT_FOUND,
            Self::Parameter | Self::Markup | Self::Usage | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error type for Hyperpony.
///
/// # Example
///
/// ```
/// use hyperpony_core::{ErrorCategory, HyperponyError};
///
/// let err = HyperponyError::missing_parameter("p1");
/// assert_eq!(err.category(), ErrorCategory::Parameter);
/// assert!(err.to_string().contains("'p1'"));
/// ```
#[derive(Error, Debug)]
pub enum HyperponyError {
    /// A required, non-optional parameter had no value from any allowed origin.
    #[error("No value found for request parameter '{key}'")]
    MissingParameter {
        /// The lookup key of the parameter.
        key: String,
    },

    /// A raw value could not be converted to the parameter's target type.
    #[error("invalid value '{value}' for parameter '{key}': expected {target} ({reason})")]
    TypeConversion {
        /// The lookup key of the parameter.
        key: String,
        /// The raw value that failed to convert.
        value: String,
        /// The target type name.
        target: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// Entity lookup failed.
    #[error("{entity} matching query does not exist")]
    EntityNotFound {
        /// The entity type name.
        entity: String,
    },

    /// Entity lookup failed; carries the key that was looked up.
    #[error("{entity} with pk {pk} does not exist")]
    EntityNotFoundWithPk {
        /// The entity type name.
        entity: String,
        /// The primary key that was looked up.
        pk: String,
    },

    /// An out-of-band fragment lacked the id its swap strategy needs.
    #[error(
        "an out-of-band fragment must either have a single root element with an id attribute \
         or name its target explicitly, e.g. \"{strategy}:#some-id\" or \"outerHTML:#some-id\""
    )]
    MissingRootElementId {
        /// The swap strategy that was requested.
        strategy: String,
    },

    /// An out-of-band fragment did not have exactly one root element.
    #[error("the additional response does not contain exactly one element (found {count})")]
    InvalidFragment {
        /// Number of root elements found.
        count: usize,
    },

    /// Out-of-band content can only be attached to HTML responses.
    #[error("unable to add OOB content: the response's content type must be text/html, got '{content_type}'")]
    NotHtml {
        /// The response content type.
        content_type: String,
    },

    /// A view-stack dependent function was called outside any view dispatch.
    #[error("{operation} can only be called from within a hyperpony view dispatch")]
    OutOfContextInvocation {
        /// The operation that was attempted.
        operation: String,
    },

    /// A view returned something that cannot be treated as a document fragment.
    #[error("view returned {found}, expected a text response that can be wrapped as an element")]
    UnsupportedResponseType {
        /// Description of what was returned.
        found: String,
    },

    /// No view is registered under the given name.
    #[error("no view registered under the name '{name}'")]
    ViewNotFound {
        /// The requested view name.
        name: String,
    },

    /// A type-keyed helper was used for a view that has no singleton path.
    #[error("view {view} was not registered with create_path()")]
    ViewNotRegistered {
        /// The view type name.
        view: String,
    },

    /// URL reverse or resolution failed.
    #[error(transparent)]
    Routing(#[from] RouteError),

    /// Invalid registration or runtime configuration.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// Client state could not be decoded.
    #[error("invalid client state for element '{element_id}': {message}")]
    ClientState {
        /// The element whose state was rejected.
        element_id: String,
        /// Description of the problem.
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HyperponyError {
    /// Creates a missing parameter error.
    #[must_use]
    pub fn missing_parameter(key: impl Into<String>) -> Self {
        Self::MissingParameter { key: key.into() }
    }

    /// Creates a type conversion error.
    #[must_use]
    pub fn type_conversion(
        key: impl Into<String>,
        value: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TypeConversion {
            key: key.into(),
            value: value.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity: entity.into(),
        }
    }

    /// Creates an entity not found error carrying the looked-up key.
    #[must_use]
    pub fn entity_not_found_with_pk(entity: impl Into<String>, pk: impl Into<String>) -> Self {
        Self::EntityNotFoundWithPk {
            entity: entity.into(),
            pk: pk.into(),
        }
    }

    /// Creates an out-of-context invocation error.
    #[must_use]
    pub fn out_of_context(operation: impl Into<String>) -> Self {
        Self::OutOfContextInvocation {
            operation: operation.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameter { .. } | Self::TypeConversion { .. } => {
                ErrorCategory::Parameter
            }
            Self::EntityNotFound { .. } | Self::EntityNotFoundWithPk { .. } => {
                ErrorCategory::NotFound
            }
            Self::MissingRootElementId { .. }
            | Self::InvalidFragment { .. }
            | Self::NotHtml { .. }
            | Self::UnsupportedResponseType { .. } => ErrorCategory::Markup,
            Self::OutOfContextInvocation { .. }
            | Self::ViewNotRegistered { .. }
            | Self::Configuration { .. }
            | Self::ClientState { .. } => ErrorCategory::Usage,
            Self::ViewNotFound { .. } | Self::Routing(_) => ErrorCategory::Routing,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "MISSING_PARAMETER",
            Self::TypeConversion { .. } => "TYPE_CONVERSION",
            Self::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            Self::EntityNotFoundWithPk { .. } => "ENTITY_NOT_FOUND_WITH_PK",
            Self::MissingRootElementId { .. } => "MISSING_ROOT_ELEMENT_ID",
            Self::InvalidFragment { .. } => "INVALID_FRAGMENT",
            Self::NotHtml { .. } => "NOT_HTML",
            Self::OutOfContextInvocation { .. } => "OUT_OF_CONTEXT_INVOCATION",
            Self::UnsupportedResponseType { .. } => "UNSUPPORTED_RESPONSE_TYPE",
            Self::ViewNotFound { .. } => "VIEW_NOT_FOUND",
            Self::ViewNotRegistered { .. } => "VIEW_NOT_REGISTERED",
            Self::Routing(_) => "ROUTING_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::ClientState { .. } => "CLIENT_STATE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` if a parameter declaration may capture this error as a value.
    #[must_use]
    pub const fn is_recoverable_as_data(&self) -> bool {
        matches!(
            self,
            Self::TypeConversion { .. }
                | Self::EntityNotFound { .. }
                | Self::EntityNotFoundWithPk { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_names_key() {
        let error = HyperponyError::missing_parameter("p1");
        assert_eq!(error.category(), ErrorCategory::Parameter);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error_code(), "MISSING_PARAMETER");
        assert_eq!(
            error.to_string(),
            "No value found for request parameter 'p1'"
        );
    }

    #[test]
    fn test_type_conversion() {
        let error = HyperponyError::type_conversion("page", "abc", "int", "invalid digit");
        assert!(error.is_recoverable_as_data());
        assert!(error.to_string().contains("abc"));
        assert!(error.to_string().contains("int"));
    }

    #[test]
    fn test_entity_not_found_variants() {
        let plain = HyperponyError::entity_not_found("Contact");
        let with_pk = HyperponyError::entity_not_found_with_pk("Contact", "42");
        assert_eq!(plain.category(), ErrorCategory::NotFound);
        assert_eq!(plain.status_code(), StatusCode::NOT_FOUND);
        assert!(with_pk.to_string().contains("42"));
        assert_ne!(plain.error_code(), with_pk.error_code());
    }

    #[test]
    fn test_missing_root_element_id_message() {
        let error = HyperponyError::MissingRootElementId {
            strategy: "outerHTML".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("must either"));
        assert!(message.contains("outerHTML"));
        assert!(!error.is_recoverable_as_data());
    }

    #[test]
    fn test_out_of_context_message() {
        let error = HyperponyError::out_of_context("add_response_handler");
        assert_eq!(error.category(), ErrorCategory::Usage);
        assert!(error.to_string().contains("within a hyperpony view"));
    }

    #[test]
    fn test_routing_error_conversion() {
        let error: HyperponyError = RouteError::UnknownRoute("missing".to_string()).into();
        assert_eq!(error.category(), ErrorCategory::Routing);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_with_source() {
        let error = HyperponyError::internal_with_source("boom", anyhow::anyhow!("inner"));
        assert_eq!(error.category(), ErrorCategory::Internal);
        assert!(std::error::Error::source(&error).is_some());
    }
}
