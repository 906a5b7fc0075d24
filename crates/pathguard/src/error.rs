//! Error types for the sanitization engine.

use std::any::Any;

use thiserror::Error;

/// Reasons a route pattern fails to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A `:` with no parameter name after it.
    #[error("missing parameter name at {offset}")]
    MissingParameterName { offset: usize },

    /// A `*` or `+` that does not follow a parameter or group.
    #[error("unexpected modifier '{modifier}'")]
    UnexpectedModifier { modifier: char },

    /// A `)` without a matching `(`.
    #[error("unbalanced group close at {offset}")]
    UnbalancedGroup { offset: usize },

    /// A `(` that is never closed.
    #[error("unterminated group at {offset}")]
    UnterminatedGroup { offset: usize },

    #[error("empty group at {offset}")]
    EmptyGroup { offset: usize },

    /// A group opening with `?`, or a nested group that is not `(?:...)`.
    #[error("capturing groups are not allowed at {offset}")]
    CapturingGroupNotAllowed { offset: usize },

    /// A trailing `\` with nothing to escape.
    #[error("dangling escape at {offset}")]
    DanglingEscape { offset: usize },

    /// The generated expression was refused by the regex engine.
    #[error("invalid route expression: {0}")]
    Regex(String),

    /// The compiler itself panicked.
    #[error("route compiler panicked: {0}")]
    Panicked(String),
}

/// Failures of the request interceptor that are not caused by bad input.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// The sanitizing pipeline panicked.
    #[error("request path sanitization failed internally: {0}")]
    Internal(String),

    /// The sanitized URL could not be turned back into a request URI.
    #[error("sanitized URL '{url}' is not a valid URI: {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse guard config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
