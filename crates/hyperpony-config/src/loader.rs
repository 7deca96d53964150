//! Layered configuration loading.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, HyperponyConfig, LogFormat};

/// Loads configuration in layers; later layers override earlier ones:
///
/// 1. Defaults or a preset
/// 2. Configuration files and strings (TOML or JSON), merged key by key
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use hyperpony_config::ConfigLoader;
///
/// # fn main() -> Result<(), hyperpony_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_dotenv()?
///     .with_optional_file("hyperpony.toml")?
///     .with_env_prefix("HYPERPONY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HyperponyConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HyperponyConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HyperponyConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use hyperpony_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HyperponyConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HyperponyConfig::production();
        self
    }

    /// Merges a TOML (`.toml`) or JSON (`.json`) file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or unreadable, has an
    /// unsupported extension, does not parse, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        tracing::debug!(path = %path.display(), "loading configuration file");
        self.with_string(&content, &format)
    }

    /// Merges a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) for an existing file.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`toml` or `json`).
    ///
    /// Only the keys present in `content` change.
    ///
    /// ```
    /// use hyperpony_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .with_string("[views]\nlogin_url = \"/login/\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.views.login_url, "/login/");
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unsupported formats, parse errors and
    /// unknown fields.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let overlay: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        self.merge(overlay)?;
        Ok(self)
    }

    /// Sets the environment variable prefix, e.g. `HYPERPONY`.
    ///
    /// `HYPERPONY__VIEWS__LOGIN_URL=/login/` sets `views.login_url`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the current directory or its parents, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "loaded .env file");
                Ok(self)
            }
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(self) -> Result<HyperponyConfig, ConfigError> {
        let config = self.finish()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse.
    pub fn load_unvalidated(self) -> Result<HyperponyConfig, ConfigError> {
        self.finish()
    }

    fn finish(mut self) -> Result<HyperponyConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: BTreeMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }
        Ok(self.config)
    }

    fn merge(&mut self, overlay: Value) -> Result<(), ConfigError> {
        let mut base = serde_json::to_value(&self.config)?;
        merge_values(&mut base, overlay);
        self.config = serde_json::from_value(base)?;
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["LOGGING", "ENABLED"] => config.logging.enabled = env_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = env_bool(key, value)?;
            }

            ["METRICS", "ENABLED"] => config.metrics.enabled = env_bool(key, value)?,

            ["PARAMS", "PARSE_FORM_BODY"] => config.params.parse_form_body = env_bool(key, value)?,
            ["PARAMS", "MAX_BODY_BYTES"] => {
                config.params.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["PARAMS", "IGNORE_VIEW_STACK"] => {
                config.params.ignore_view_stack = env_bool(key, value)?;
            }

            ["VIEWS", "LOGIN_URL"] => config.views.login_url = value.to_string(),
            ["VIEWS", "REDIRECT_FIELD"] => config.views.redirect_field = value.to_string(),
            ["VIEWS", "ELEMENT_MARKER"] => config.views.element_marker = value.to_string(),

            ["CLIENT_STATE", "ENABLED"] => config.client_state.enabled = env_bool(key, value)?,
            ["CLIENT_STATE", "KEY_PREFIX"] => config.client_state.key_prefix = value.to_string(),

            _ => tracing::warn!(var = key, "ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn env_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
