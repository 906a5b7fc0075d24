//! Guard configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{LruCache, PatternCache, UnboundedCache, DEFAULT_CAPACITY};
use crate::compiler::CompileOptions;
use crate::error::ConfigError;

/// Pattern cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of memoized patterns; 0 disables eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Top-level configuration of a [`crate::PathValidator`].
///
/// ```toml
/// [cache]
/// capacity = 10000
///
/// [compile]
/// sensitive = true
/// strict = true
/// end = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub cache: CacheConfig,
    pub compile: CompileOptions,
}

impl GuardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Set the cache capacity (0 = unbounded).
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity;
        self
    }

    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile = options;
        self
    }

    /// Build the cache this configuration describes.
    pub fn build_cache(&self) -> Arc<dyn PatternCache> {
        match self.cache.capacity {
            0 => Arc::new(UnboundedCache::new()),
            capacity => Arc::new(LruCache::new(capacity)),
        }
    }
}
