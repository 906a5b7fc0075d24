//! Telemetry configuration.

/// Environment variable holding the log level filter.
pub const LOG_LEVEL_ENV: &str = "PATHGUARD_LOG_LEVEL";
/// Environment variable selecting `json` or `pretty` output.
pub const LOG_FORMAT_ENV: &str = "PATHGUARD_LOG_FORMAT";
/// Environment variable toggling the target field (`true`/`false`).
pub const LOG_TARGET_ENV: &str = "PATHGUARD_LOG_TARGET";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON output (production).
    #[default]
    Json,
    /// Human-readable pretty output (development).
    Pretty,
}

impl LogFormat {
    /// Case-insensitive `json` or `pretty`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if s.eq_ignore_ascii_case("pretty") {
            Some(Self::Pretty)
        } else {
            None
        }
    }
}

/// Logging settings for the sanitization engine.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (default: "info").
    pub log_level: String,
    pub log_format: LogFormat,
    /// Include the emitting module in each log line.
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `PATHGUARD_LOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// Unrecognized values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|level| !level.trim().is_empty()) {
            config.log_level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV).and_then(|f| LogFormat::parse(f.trim())) {
            config.log_format = format;
        }
        if let Some(with_target) = lookup(LOG_TARGET_ENV).and_then(|v| v.trim().parse().ok()) {
            config.with_target = with_target;
        }
        config
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}
