//! Request-path sanitization and route-pattern validation.
//!
//! `pathguard` sits in front of an HTTP router. Whatever arrives in a path
//! position (absolute URLs, unterminated parameters, regex metacharacters)
//! is reduced to a pattern the router's compiler accepts, or to `/` when
//! that is not possible. Legitimate special characters are encoded into
//! reversible tokens instead of being dropped.
//!
//! ```text
//! raw string → preprocess → validate (cached) → sanitize
//! ```
//!
//! The same [`PathValidator`] serves both entry points: the per-request
//! [`RequestInterceptor`] and the startup-time [`wrap_route_constructor`].
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use pathguard::{PathContext, PathValidator, RequestInterceptor};
//!
//! let validator = Arc::new(PathValidator::new());
//! let interceptor = RequestInterceptor::new(validator);
//!
//! let mut ctx = PathContext::new("/api/resource/https://problem.com/path");
//! interceptor.intercept(&mut ctx).unwrap();
//! assert_eq!(
//!     ctx.url.as_deref(),
//!     Some("/api/resource/https_COLON_/problem_DOT_com/path")
//! );
//! ```

pub mod cache;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod error;
pub mod guard;
pub mod interceptor;
pub mod preprocess;
pub mod validator;

pub use cache::{CacheStats, LruCache, PatternCache, PatternKey, UnboundedCache};
pub use codec::{decode, decode_url, encode, sanitize};
pub use compiler::{
    CompileOptions, CompiledRoute, ParamKey, PathPatternCompiler, Route, RouteCompiler,
};
pub use config::{CacheConfig, GuardConfig};
pub use error::{CompileError, ConfigError, InterceptError};
pub use guard::{wrap_route_constructor, RouteGuard};
pub use interceptor::{MountPrefix, PathContext, RawPaths, RequestInterceptor};
pub use preprocess::{preprocess, preprocess_outcome, ParamRepair, Preprocessed, RepairKind};
pub use validator::{PathValidator, FALLBACK};
