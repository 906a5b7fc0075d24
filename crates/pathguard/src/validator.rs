//! Route validation with memoized results.
//!
//! A pattern is preprocessed, then compiled through the injected
//! [`RouteCompiler`]. Whether that worked is cached under the pattern as the
//! caller passed it, so a repeated request path costs one cache lookup.
//! Anything that does not compile resolves to [`FALLBACK`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use pathguard_telemetry::{log_pattern_rejected, MetricsRegistry};

use crate::cache::{CacheStats, PatternCache, PatternKey};
use crate::compiler::{CompileOptions, PathPatternCompiler, RouteCompiler};
use crate::config::GuardConfig;
use crate::error::{panic_message, CompileError};
use crate::preprocess::{normalize, preprocess_outcome, Preprocessed, RepairKind};

/// The pattern used whenever validation fails.
pub const FALLBACK: &str = "/";

/// Validates route patterns and request paths.
///
/// Cheap to share: wrap it in an `Arc` and hand it to the interceptor and
/// the route guard so both use the same cache.
pub struct PathValidator {
    compiler: Arc<dyn RouteCompiler>,
    cache: Arc<dyn PatternCache>,
    options: CompileOptions,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PathValidator {
    /// Default compiler, default options, bounded LRU cache.
    pub fn new() -> Self {
        Self::from_config(&GuardConfig::default())
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::with_parts(
            Arc::new(PathPatternCompiler),
            config.build_cache(),
            config.compile,
        )
    }

    pub fn with_parts(
        compiler: Arc<dyn RouteCompiler>,
        cache: Arc<dyn PatternCache>,
        options: CompileOptions,
    ) -> Self {
        Self {
            compiler,
            cache,
            options,
            metrics: None,
        }
    }

    /// Record validations into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub(crate) fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_deref()
    }

    /// Whether `pattern` compiles after preprocessing. Never panics.
    ///
    /// A cache hit answers without preprocessing the input again.
    pub fn is_valid(&self, pattern: &str) -> bool {
        let key = PatternKey::new(pattern, self.options);
        match self.lookup(&key) {
            Some(valid) => valid,
            None => self.resolve(key, &preprocess_outcome(pattern), &self.options),
        }
    }

    /// The preprocessed pattern if it compiles, otherwise [`FALLBACK`].
    pub fn validate(&self, pattern: &str) -> String {
        self.validate_with(pattern, &self.options)
    }

    /// [`validate`](Self::validate) under explicit compile options.
    pub fn validate_with(&self, pattern: &str, options: &CompileOptions) -> String {
        let key = PatternKey::new(pattern, *options);
        match self.lookup(&key) {
            Some(true) => normalize(pattern).pattern,
            Some(false) => FALLBACK.to_string(),
            None => {
                let outcome = preprocess_outcome(pattern);
                if self.resolve(key, &outcome, options) {
                    outcome.pattern
                } else {
                    FALLBACK.to_string()
                }
            }
        }
    }

    /// Validate each pattern in turn.
    pub fn validate_all<I, S>(&self, patterns: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|pattern| self.validate(pattern.as_ref()))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            capacity: self.cache.capacity(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn lookup(&self, key: &PatternKey) -> Option<bool> {
        let cached = self.cache.get(key);
        if let Some(metrics) = self.metrics() {
            metrics.record_cache_lookup(cached.is_some());
            if let Some(valid) = cached {
                metrics.record_validation(valid);
            }
        }
        cached
    }

    /// Compile a cache miss and remember the result.
    fn resolve(&self, key: PatternKey, outcome: &Preprocessed, options: &CompileOptions) -> bool {
        let valid = match self.compile(outcome, options) {
            Ok(()) => true,
            Err(error) => {
                log_pattern_rejected!(
                    pattern = %key.pattern,
                    processed = %outcome.pattern,
                    error = %error,
                    "invalid route pattern"
                );
                false
            }
        };
        self.cache.insert(key, valid);

        if let Some(metrics) = self.metrics() {
            metrics.record_param_repairs(outcome.repairs.len() as u64);
            metrics.record_validation(valid);
        }
        valid
    }

    fn compile(&self, outcome: &Preprocessed, options: &CompileOptions) -> Result<(), CompileError> {
        // A bare `:` declares a parameter without a name. The `:id` standing
        // in for it keeps the pattern well-formed but must not be routable.
        if let Some(repair) = outcome
            .repairs
            .iter()
            .find(|repair| repair.kind == RepairKind::MissingName)
        {
            return Err(CompileError::MissingParameterName {
                offset: segment_offset(&outcome.pattern, repair.index),
            });
        }

        catch_unwind(AssertUnwindSafe(|| {
            self.compiler.compile(&outcome.pattern, options)
        }))
        .unwrap_or_else(|payload| Err(CompileError::Panicked(panic_message(payload.as_ref()))))
    }
}

/// Byte offset of the `index`-th segment in a preprocessed pattern.
fn segment_offset(pattern: &str, index: usize) -> usize {
    pattern
        .split('/')
        .skip(1)
        .take(index)
        .map(|segment| segment.len() + 1)
        .sum::<usize>()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::UnboundedCache;
    use pathguard_telemetry::{events, EventCapture};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and delegates to the default compiler.
    #[derive(Default)]
    struct CountingCompiler {
        calls: AtomicUsize,
    }

    impl RouteCompiler for CountingCompiler {
        fn compile(&self, pattern: &str, options: &CompileOptions) -> Result<(), CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PathPatternCompiler.compile(pattern, options)
        }
    }

    struct PanickingCompiler;

    impl RouteCompiler for PanickingCompiler {
        fn compile(&self, _pattern: &str, _options: &CompileOptions) -> Result<(), CompileError> {
            panic!("compiler bug");
        }
    }

    fn counting() -> (Arc<CountingCompiler>, PathValidator) {
        let compiler = Arc::new(CountingCompiler::default());
        let validator = PathValidator::with_parts(
            compiler.clone(),
            Arc::new(UnboundedCache::new()),
            CompileOptions::default(),
        );
        (compiler, validator)
    }

    #[test]
    fn absolute_url_keeps_path_and_query() {
        let validator = PathValidator::new();
        assert_eq!(
            validator.validate("http://example.com/api/data?param=value"),
            "/api/data?param=value"
        );
    }

    #[test]
    fn spaces_are_percent_encoded() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/path/with spaces"), "/path/with%20spaces");
    }

    #[test]
    fn bare_parameter_marker_falls_back() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/test/:"), FALLBACK);
        assert!(!validator.is_valid("/test/:"));
        assert_eq!(validator.validate("https://git.new/some:path/:"), FALLBACK);
    }

    #[test]
    fn malformed_parameter_name_is_healed() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/users/:user-id"), "/users/:id");
        assert!(validator.is_valid("/users/:user-id"));
    }

    #[test]
    fn healed_name_next_to_existing_id_still_routes() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/users/:id/:bad-name"), "/users/:id/:id");
    }

    #[test]
    fn two_malformed_parameters_are_both_healed() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/a/:x-y/:p-q"), "/a/:id/:id");
        assert!(validator.is_valid("/a/:x-y/:p-q"));
    }

    #[test]
    fn compiler_rejection_falls_back() {
        let validator = PathValidator::new();
        assert_eq!(validator.validate("/foo(bar"), FALLBACK);
        assert_eq!(validator.validate("/foo(bar)"), "/foo(bar)");
    }

    #[test]
    fn embedded_url_is_tokenized() {
        let validator = PathValidator::new();
        assert_eq!(
            validator.validate("/api/resource/https://problem.com/path"),
            "/api/resource/https_COLON_/problem.com/path"
        );
    }

    #[test]
    fn repeated_validation_compiles_once() {
        let (compiler, validator) = counting();
        for _ in 0..5 {
            assert_eq!(validator.validate("/users/:id"), "/users/:id");
            assert!(validator.is_valid("/users/:id"));
        }
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(validator.cache_stats().entries, 1);
    }

    #[test]
    fn failures_are_cached_too() {
        let (compiler, validator) = counting();
        assert_eq!(validator.validate("/foo(bar"), FALLBACK);
        assert_eq!(validator.validate("/foo(bar"), FALLBACK);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_is_keyed_by_original_input() {
        let (compiler, validator) = counting();
        // Same preprocessed form, different originals.
        validator.validate("/a//b");
        validator.validate("/a/b");
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn options_override() {
        let (compiler, validator) = counting();
        let loose = CompileOptions {
            strict: false,
            ..CompileOptions::default()
        };
        validator.validate("/x");
        validator.validate_with("/x", &loose);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compiler_panic_is_contained() {
        let validator = PathValidator::with_parts(
            Arc::new(PanickingCompiler),
            Arc::new(UnboundedCache::new()),
            CompileOptions::default(),
        );
        assert_eq!(validator.validate("/anything"), FALLBACK);
        assert!(!validator.is_valid("/anything"));
    }

    #[test]
    fn validate_all_maps_each_pattern() {
        let validator = PathValidator::new();
        assert_eq!(
            validator.validate_all(["/ok", "/test/:", "/with space"]),
            vec!["/ok", "/", "/with%20space"]
        );
        assert!(validator.validate_all(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn totality() {
        let validator = PathValidator::new();
        let long_query = format!("/q?{}", "a=b&".repeat(5_000));
        let inputs = [
            "",
            ":",
            "?",
            "\\",
            "(((",
            "\u{0}\u{1}\u{2}",
            "http://",
            "://",
            "http://[::1",
            long_query.as_str(),
        ];
        for input in inputs {
            assert!(validator.validate(input).starts_with('/'), "input {input:?}");
        }
    }

    #[test]
    fn metrics_are_recorded() {
        let metrics = Arc::new(MetricsRegistry::new());
        let validator = PathValidator::new().with_metrics(metrics.clone());
        validator.validate("/users/:bad-name");
        validator.validate("/users/:bad-name");

        // Repairs are counted once, when the pattern is first compiled.
        assert_eq!(metrics.param_repairs_total.get(), 1);
        let rendered = pathguard_telemetry::render_metrics(&metrics);
        assert!(rendered.contains("result=\"hit\"} 1"));
        assert!(rendered.contains("result=\"miss\"} 1"));
    }

    #[test]
    fn rejection_warns_once_per_pattern() {
        let validator = PathValidator::new();
        let capture = EventCapture::new();

        capture.run(|| assert_eq!(validator.validate("/test/:"), FALLBACK));
        assert_eq!(
            capture.events(),
            vec![events::PARAM_REPAIRED, events::PATTERN_REJECTED]
        );

        // Served from the cache: no preprocessing, no new warnings.
        capture.clear();
        capture.run(|| {
            assert_eq!(validator.validate("/test/:"), FALLBACK);
            assert!(!validator.is_valid("/test/:"));
        });
        assert!(capture.events().is_empty());
    }

    #[test]
    fn cached_healed_pattern_is_rebuilt_quietly() {
        let validator = PathValidator::new();
        let capture = EventCapture::new();

        capture.run(|| {
            assert!(validator.is_valid("/users/:bad-name"));
            assert_eq!(validator.validate("/users/:bad-name"), "/users/:id");
            assert_eq!(validator.validate("/users/:bad-name"), "/users/:id");
        });
        assert_eq!(capture.count(events::PARAM_REPAIRED), 1);
        assert_eq!(capture.count(events::PATTERN_REJECTED), 0);
    }

    #[test]
    fn segment_offsets() {
        assert_eq!(segment_offset("/test/:id", 1), 6);
        assert_eq!(segment_offset("/:id", 0), 1);
    }
}
