//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }

    /// Development preset: pretty debug logs, metrics on.
    #[must_use]
    pub fn development() -> Self {
        Self {
            metrics: MetricsConfig::default(),
            logging: LogConfig::development(),
        }
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    metrics: Option<MetricsConfig>,
    logging: Option<LogConfig>,
}

impl TelemetryConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.metrics = Some(config);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Disables metrics.
    #[must_use]
    pub fn disable_metrics(mut self) -> Self {
        self.metrics = Some(MetricsConfig { enabled: false });
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        TelemetryConfig {
            metrics: self.metrics.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig::development())
            .disable_metrics()
            .build();
        assert!(!config.metrics.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_development_preset() {
        let config = TelemetryConfig::development();
        assert!(config.metrics.enabled);
        assert!(!config.logging.json_format);
    }
}
