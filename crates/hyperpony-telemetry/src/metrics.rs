//! Prometheus metrics for Hyperpony.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`init_metrics`] installs a Prometheus recorder
//! without an HTTP listener; the host exposes [`render_metrics`] on whatever
//! route it likes.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hyperpony_view_dispatch_total` | Counter | `view`, `embedded` | View invocations |
//! | `hyperpony_param_resolution_total` | Counter | `outcome` | Resolved parameters |
//! | `hyperpony_oob_fragments_total` | Counter | `strategy` | Queued out-of-band fragments |
//! | `hyperpony_element_wraps_total` | Counter | - | Responses wrapped as elements |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Outcome label values for `hyperpony_param_resolution_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOutcome {
    /// A value was read from the request or kwargs and coerced.
    Coerced,
    /// The declared default was used.
    Defaulted,
    /// The parameter resolved to null.
    Null,
    /// A construction-time or entity override was used.
    Overridden,
    /// A failure was captured as a value.
    Captured,
    /// Resolution failed and the error propagated.
    Failed,
}

impl ParamOutcome {
    /// The label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coerced => "coerced",
            Self::Defaulted => "defaulted",
            Self::Null => "null",
            Self::Overridden => "overridden",
            Self::Captured => "captured",
            Self::Failed => "failed",
        }
    }
}

/// Installs the Prometheus recorder.
///
/// A second call is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        "hyperpony_view_dispatch_total",
        "Total number of view invocations, top-level and embedded"
    );
    describe_counter!(
        "hyperpony_param_resolution_total",
        "Total number of injected parameters by outcome"
    );
    describe_counter!(
        "hyperpony_oob_fragments_total",
        "Total number of out-of-band fragments queued by swap strategy"
    );
    describe_counter!(
        "hyperpony_element_wraps_total",
        "Total number of responses wrapped as elements"
    );
}

/// Records one view invocation.
pub fn record_view_dispatch(view: &str, embedded: bool) {
    counter!(
        "hyperpony_view_dispatch_total",
        "view" => view.to_string(),
        "embedded" => embedded.to_string()
    )
    .increment(1);
}

/// Records one resolved parameter.
pub fn record_param_resolution(outcome: ParamOutcome) {
    counter!(
        "hyperpony_param_resolution_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Records one queued out-of-band fragment.
pub fn record_oob_fragment(strategy: &str) {
    counter!(
        "hyperpony_oob_fragments_total",
        "strategy" => strategy.to_string()
    )
    .increment(1);
}

/// Records one element wrap.
pub fn record_element_wrap() {
    counter!("hyperpony_element_wraps_total").increment(1);
}
