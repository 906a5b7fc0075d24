//! Prometheus metrics registry.

use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Validation outcome labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

/// Cache lookup labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CacheLabels {
    pub result: String,
}

/// Metrics registry holding all pathguard metrics.
///
/// Counters are registered without the `_total` suffix; the OpenMetrics
/// encoder appends it.
pub struct MetricsRegistry {
    /// The prometheus-client registry for encoding.
    pub registry: Registry,

    pub validations_total: Family<OutcomeLabels, Counter>,
    pub cache_lookups_total: Family<CacheLabels, Counter>,
    pub param_repairs_total: Counter,
    pub intercept_errors_total: Counter,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let validations_total = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "pathguard_validations",
            "Total number of route pattern validations by outcome",
            validations_total.clone(),
        );

        let cache_lookups_total = Family::<CacheLabels, Counter>::default();
        registry.register(
            "pathguard_cache_lookups",
            "Total number of pattern cache lookups by result",
            cache_lookups_total.clone(),
        );

        let param_repairs_total = Counter::default();
        registry.register(
            "pathguard_param_repairs",
            "Total number of parameter segments replaced with :id",
            param_repairs_total.clone(),
        );

        let intercept_errors_total = Counter::default();
        registry.register(
            "pathguard_intercept_errors",
            "Total number of internal failures in the request interceptor",
            intercept_errors_total.clone(),
        );

        Self {
            registry,
            validations_total,
            cache_lookups_total,
            param_repairs_total,
            intercept_errors_total,
        }
    }

    /// Record the result of a validation: `accepted` or `fallback`.
    pub fn record_validation(&self, accepted: bool) {
        let labels = OutcomeLabels {
            outcome: if accepted { "accepted" } else { "fallback" }.to_string(),
        };
        self.validations_total.get_or_create(&labels).inc();
    }

    /// Record a pattern cache lookup.
    pub fn record_cache_lookup(&self, hit: bool) {
        let labels = CacheLabels {
            result: if hit { "hit" } else { "miss" }.to_string(),
        };
        self.cache_lookups_total.get_or_create(&labels).inc();
    }

    pub fn record_param_repairs(&self, count: u64) {
        if count > 0 {
            self.param_repairs_total.inc_by(count);
        }
    }

    pub fn record_intercept_error(&self) {
        self.intercept_errors_total.inc();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
