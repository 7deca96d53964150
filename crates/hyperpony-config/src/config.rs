//! The root configuration type.

use serde::{Deserialize, Serialize};

use hyperpony_telemetry::logging::create_env_filter;
use hyperpony_telemetry::{LogConfig, TelemetryConfig};

use crate::{
    ClientStateConfig, ConfigError, LogFormat, LoggingConfig, MetricsConfig, ParamsConfig,
    ViewsConfig,
};

/// Complete Hyperpony configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use hyperpony_config::HyperponyConfig;
///
/// let config = HyperponyConfig::default();
/// assert_eq!(config.views.login_url, "/accounts/login/");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HyperponyConfig {
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Parameter injection.
    #[serde(default)]
    pub params: ParamsConfig,

    /// View dispatch.
    #[serde(default)]
    pub views: ViewsConfig,

    /// Client state.
    #[serde(default)]
    pub client_state: ClientStateConfig,
}

impl HyperponyConfig {
    /// Creates a configuration builder.
    ///
    /// ```
    /// use hyperpony_config::{HyperponyConfig, ViewsConfig};
    ///
    /// let config = HyperponyConfig::builder()
    ///     .views(ViewsConfig {
    ///         login_url: "/login/".to_string(),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.views.login_url, "/login/");
    /// ```
    #[must_use]
    pub fn builder() -> HyperponyConfigBuilder {
        HyperponyConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the log level is empty or not a valid filter directive
    /// - `params.max_body_bytes` is zero
    /// - `views.login_url` is neither a path nor an http(s) URL
    /// - `client_state.key_prefix` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty",
            ));
        }
        if let Err(e) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self.params.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "params.max_body_bytes",
                "must be greater than zero",
            ));
        }

        let login_url = &self.views.login_url;
        if !(login_url.starts_with('/') || login_url.starts_with("http")) {
            return Err(ConfigError::invalid_value(
                "views.login_url",
                format!("expected a path or an absolute URL, got '{login_url}'"),
            ));
        }

        if self.views.redirect_field.is_empty() {
            return Err(ConfigError::invalid_value(
                "views.redirect_field",
                "must not be empty",
            ));
        }

        if self.client_state.key_prefix.is_empty() {
            return Err(ConfigError::invalid_value(
                "client_state.key_prefix",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with locations.
    ///
    /// ```
    /// use hyperpony_config::HyperponyConfig;
    ///
    /// let config = HyperponyConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;
        config
    }

    /// The telemetry settings described by this configuration.
    ///
    /// ```
    /// use hyperpony_config::HyperponyConfig;
    ///
    /// let telemetry = HyperponyConfig::development().telemetry_config();
    /// assert!(!telemetry.logging.json_format);
    /// assert!(telemetry.logging.file_line_info);
    /// ```
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        TelemetryConfig {
            metrics: hyperpony_telemetry::MetricsConfig {
                enabled: self.metrics.enabled,
            },
            logging: LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                file_line_info: self.logging.include_location,
                ..base
            },
        }
    }
}

/// Builder for [`HyperponyConfig`].
#[derive(Debug, Default)]
pub struct HyperponyConfigBuilder {
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
    params: Option<ParamsConfig>,
    views: Option<ViewsConfig>,
    client_state: Option<ClientStateConfig>,
}

impl HyperponyConfigBuilder {
    /// Creates a builder with every section unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Sets the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the params section.
    #[must_use]
    pub fn params(mut self, params: ParamsConfig) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the views section.
    #[must_use]
    pub fn views(mut self, views: ViewsConfig) -> Self {
        self.views = Some(views);
        self
    }

    /// Sets the client state section.
    #[must_use]
    pub fn client_state(mut self, client_state: ClientStateConfig) -> Self {
        self.client_state = Some(client_state);
        self
    }

    /// Builds the configuration; unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> HyperponyConfig {
        HyperponyConfig {
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            params: self.params.unwrap_or_default(),
            views: self.views.unwrap_or_default(),
            client_state: self.client_state.unwrap_or_default(),
        }
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HyperponyConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
