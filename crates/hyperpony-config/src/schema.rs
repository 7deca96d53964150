//! Configuration sections.
//!
//! Every section rejects unknown fields and falls back to its defaults for
//! fields that are not set.

use serde::{Deserialize, Serialize};

/// Default limit for parsed request bodies, 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

/// Logging section.
///
/// # Example
///
/// ```
/// use hyperpony_config::{LogFormat, LoggingConfig};
///
/// let config = LoggingConfig::default();
/// assert_eq!(config.level, "info");
/// assert_eq!(config.format, LogFormat::Json);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info` or `hyperpony_params=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in log events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Parameter injection section.
///
/// # Example
///
/// ```
/// use hyperpony_config::ParamsConfig;
///
/// let config = ParamsConfig::default();
/// assert!(config.parse_form_body);
/// assert_eq!(config.max_body_bytes, 1024 * 1024);
/// assert!(!config.ignore_view_stack);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParamsConfig {
    /// Parse url-encoded and JSON bodies for parameters.
    #[serde(default = "default_true")]
    pub parse_form_body: bool,

    /// Bodies larger than this are not parsed.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Read request values in nested views too.
    #[serde(default)]
    pub ignore_view_stack: bool,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            parse_form_body: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            ignore_view_stack: false,
        }
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// View dispatch section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ViewsConfig {
    /// Where anonymous callers of login-required views are sent.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Query key carrying the original path on the login redirect.
    #[serde(default = "default_redirect_field")]
    pub redirect_field: String,

    /// Marker attribute on wrapped elements.
    #[serde(default = "default_element_marker")]
    pub element_marker: String,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            redirect_field: default_redirect_field(),
            element_marker: default_element_marker(),
        }
    }
}

fn default_login_url() -> String {
    "/accounts/login/".to_string()
}

fn default_redirect_field() -> String {
    "next".to_string()
}

fn default_element_marker() -> String {
    "hyperpony-element".to_string()
}

/// Client state section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientStateConfig {
    /// Read inbound client state on htmx requests.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prefix of the request keys carrying client state.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for ClientStateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_key_prefix() -> String {
    "__hyperpony_cs__".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert!(!config.include_location);
    }

    #[test]
    fn test_views_defaults() {
        let config = ViewsConfig::default();
        assert_eq!(config.login_url, "/accounts/login/");
        assert_eq!(config.redirect_field, "next");
        assert_eq!(config.element_marker, "hyperpony-element");
    }

    #[test]
    fn test_client_state_defaults() {
        let config = ClientStateConfig::default();
        assert!(config.enabled);
        assert_eq!(config.key_prefix, "__hyperpony_cs__");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: ParamsConfig = toml::from_str("max_body_bytes = 2048").unwrap();
        assert_eq!(config.max_body_bytes, 2048);
        assert!(config.parse_form_body);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ViewsConfig, _> = toml::from_str("login = \"/x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }
}
