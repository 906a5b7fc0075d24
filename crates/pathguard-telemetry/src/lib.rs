//! Observability for the pathguard sanitization engine.
//!
//! This crate provides:
//! - Structured JSON or pretty logging with standard event names
//! - A Prometheus metrics registry and text exposition
//! - An [`EventCapture`] layer for asserting on log events
//!
//! # Usage
//!
//! ```ignore
//! use pathguard_telemetry::{Telemetry, TelemetryConfig};
//!
//! let telemetry = Telemetry::init(TelemetryConfig::new().with_log_level("warn"))?;
//! let validator = PathValidator::new().with_metrics(telemetry.metrics_clone());
//! ```

pub mod capture;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod prometheus;

pub use capture::EventCapture;
pub use config::{LogFormat, TelemetryConfig};
pub use logging::events;
pub use metrics::MetricsRegistry;
pub use prometheus::{render_metrics, PROMETHEUS_CONTENT_TYPE};

// Path the `log_*!` macros expand to.
#[doc(hidden)]
pub use tracing;

use std::sync::Arc;
use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Main telemetry handle.
pub struct Telemetry {
    config: TelemetryConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Telemetry {
    /// Install the global log subscriber and create a metrics registry.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        logging::init_logging(&config)?;
        Ok(Self::init_without_logging(config))
    }

    /// [`init`](Self::init) with settings read from `PATHGUARD_LOG_*`.
    pub fn init_from_env() -> Result<Self, TelemetryError> {
        Self::init(TelemetryConfig::from_env())
    }

    /// Create a metrics registry without touching the global subscriber.
    ///
    /// Use this when logging is already initialized (e.g., in tests).
    pub fn init_without_logging(config: TelemetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Get a cloned Arc reference to the metrics registry.
    pub fn metrics_clone(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// Render metrics in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        prometheus::render_metrics(&self.metrics)
    }
}
