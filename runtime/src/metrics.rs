//! Prometheus metrics for observability and monitoring.
//!
//! Metrics are recorded with the `metrics` facade throughout the runtime and
//! the domain crates:
//! - Store command processing and reducer latency
//! - Effect execution
//! - Graceful shutdown
//! - Marketplace outcomes (orders placed, commands rejected)
//!
//! [`MetricsRecorder`] installs the Prometheus exporter once per process and
//! renders the text exposition format for a `/metrics` route.
//!
//! # Example
//!
//! ```rust,no_run
//! use bazaar_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! let body = recorder.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
///
/// Cheap to clone once installed; clones share the same handle.
#[derive(Clone, Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), the call succeeds
    /// without a handle and [`render`](Self::render) returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Whether this recorder owns the installed exporter.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.handle.is_some()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder was never installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!(
        "store.commands.total",
        "Total number of actions sent to a store"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside the reducer while holding the state lock"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, labelled by effect type"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // Marketplace Metrics
    describe_counter!(
        "market.orders.placed",
        "Total number of orders committed"
    );
    describe_counter!(
        "market.commands.rejected",
        "Total number of commands rejected, labelled by error code"
    );
    describe_histogram!(
        "market.command.duration_seconds",
        "Round-trip latency of a command through the service facade"
    );
}

/// Marketplace metrics recorder.
pub struct MarketMetrics;

impl MarketMetrics {
    /// Record a committed order.
    pub fn record_order_placed() {
        counter!("market.orders.placed").increment(1);
    }

    /// Record a rejected command.
    pub fn record_rejection(code: &'static str) {
        counter!("market.commands.rejected", "code" => code).increment(1);
    }

    /// Record the round trip of a command.
    pub fn record_command(duration: Duration) {
        histogram!("market.command.duration_seconds").record(duration.as_secs_f64());
    }
}
