//! Route registration guard.
//!
//! Wraps a router's route constructor so every pattern registered at startup
//! goes through the same [`PathValidator`] as live request paths. A pattern
//! that would not compile is registered as `/` instead of aborting boot.

use std::sync::Arc;

use crate::validator::PathValidator;

/// Wrap `original` so it only ever sees validated patterns.
///
/// ```
/// use std::sync::Arc;
/// use pathguard::{wrap_route_constructor, PathValidator, Route};
///
/// let validator = Arc::new(PathValidator::new());
/// let route = wrap_route_constructor(validator, Route::new);
/// assert_eq!(route("/users/:id/:").unwrap().pattern(), "/");
/// ```
pub fn wrap_route_constructor<R, F>(
    validator: Arc<PathValidator>,
    original: F,
) -> impl Fn(&str) -> R
where
    F: Fn(&str) -> R,
{
    let guard = RouteGuard::new(validator, original);
    move |pattern: &str| guard.construct(pattern)
}

/// Named form of [`wrap_route_constructor`], for storing in a struct.
pub struct RouteGuard<F> {
    validator: Arc<PathValidator>,
    original: F,
}

impl<F> RouteGuard<F> {
    pub fn new(validator: Arc<PathValidator>, original: F) -> Self {
        Self {
            validator,
            original,
        }
    }

    pub fn validator(&self) -> &Arc<PathValidator> {
        &self.validator
    }

    /// Validate `pattern` and hand the result to the wrapped constructor.
    pub fn construct<R>(&self, pattern: &str) -> R
    where
        F: Fn(&str) -> R,
    {
        let validated = self.validator.validate(pattern);
        if validated != pattern {
            tracing::debug!(
                pattern = %pattern,
                validated = %validated,
                "route pattern rewritten before registration"
            );
        }
        (self.original)(&validated)
    }
}
