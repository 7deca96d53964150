//! Observability for Hyperpony.
//!
//! - **Logging**: `tracing-subscriber` with an env filter and JSON or pretty output
//! - **Metrics**: counters through the `metrics` facade, rendered by a
//!   Prometheus recorder
//!
//! Every Hyperpony crate emits `tracing` events and records counters through
//! [`metrics`] unconditionally. Both are inert until [`init_telemetry`] (or
//! the host's own subscriber/recorder) is installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use hyperpony_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::development())?;
//! // ... later, from a /metrics route:
//! let text = hyperpony_telemetry::metrics::render_metrics().unwrap_or_default();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{fields, init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig, ParamOutcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_disabled() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .disable_metrics()
            .build();
        assert!(init_telemetry(&config).is_ok());
    }
}
