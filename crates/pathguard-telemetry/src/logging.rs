//! Structured logging for the sanitization engine.
//!
//! Warnings raised while healing malformed paths carry an `event` field so
//! they can be filtered and counted downstream.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter, config.with_target),
        LogFormat::Pretty => init_pretty_logging(filter, config.with_target),
    }
}

fn init_json_logging(filter: EnvFilter, with_target: bool) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_target(with_target)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter, with_target: bool) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_target(with_target)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A parameter segment had a missing or malformed name and was replaced.
    pub const PARAM_REPAIRED: &str = "param_repaired";

    /// A pattern failed compilation and was replaced by the fallback.
    pub const PATTERN_REJECTED: &str = "pattern_rejected";

    /// An absolute URL could not be parsed and was stripped by hand.
    pub const URL_PARSE_FALLBACK: &str = "url_parse_fallback";

    /// The request interceptor hit an internal failure.
    pub const INTERCEPT_FAILED: &str = "intercept_failed";
}

#[macro_export]
macro_rules! log_param_repaired {
    ($($field:tt)*) => {
        $crate::tracing::warn!(
            event = $crate::logging::events::PARAM_REPAIRED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_pattern_rejected {
    ($($field:tt)*) => {
        $crate::tracing::warn!(
            event = $crate::logging::events::PATTERN_REJECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_url_parse_fallback {
    ($($field:tt)*) => {
        $crate::tracing::warn!(
            event = $crate::logging::events::URL_PARSE_FALLBACK,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_intercept_failed {
    ($($field:tt)*) => {
        $crate::tracing::warn!(
            event = $crate::logging::events::INTERCEPT_FAILED,
            $($field)*
        )
    };
}
