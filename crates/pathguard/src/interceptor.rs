//! Per-request sanitization stage.
//!
//! Runs once per inbound request before routing. Each path-bearing field is
//! validated (falling back to `/`) and then sanitized, after the untouched
//! values have been saved in [`RawPaths`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use http::{Request, Uri};
use pathguard_telemetry::log_intercept_failed;

use crate::codec;
use crate::error::{panic_message, InterceptError};
use crate::validator::PathValidator;

/// The path-bearing fields as they arrived, before sanitization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPaths {
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub path: Option<String>,
    pub base_url: Option<String>,
}

/// Mount prefix of the handler a request is routed to.
///
/// Hosts that nest routers insert this extension so the interceptor can
/// sanitize the prefix along with the rest of the request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPrefix(pub String);

/// The four path-bearing fields of a request.
///
/// After interception the fields hold sanitized values and `raw` holds what
/// was there before. This is also the request extension that
/// [`RequestInterceptor::intercept_request`] leaves for downstream handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathContext {
    /// Primary request URL (path and query).
    pub url: Option<String>,
    /// URL before any rewriting.
    pub original_url: Option<String>,
    /// Path without the query.
    pub path: Option<String>,
    /// Mount prefix.
    pub base_url: Option<String>,
    /// Snapshot taken by the interceptor.
    pub raw: Option<RawPaths>,
}

impl PathContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_original_url(mut self, original_url: impl Into<String>) -> Self {
        self.original_url = Some(original_url.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the context for an `http` request.
    ///
    /// An absolute-form target (`GET http://host/path`) is kept whole so the
    /// preprocessor can reduce it.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let url = if uri.scheme().is_some() {
            uri.to_string()
        } else {
            uri.path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string())
        };

        Self {
            original_url: Some(url.clone()),
            path: Some(uri.path().to_string()),
            base_url: req.extensions().get::<MountPrefix>().map(|p| p.0.clone()),
            url: Some(url),
            raw: None,
        }
    }

    /// The current URL, sanitized. Recomputed on every call.
    pub fn sanitized_url(&self) -> Option<String> {
        self.url.as_deref().map(codec::sanitize)
    }

    /// The original URL exactly as it arrived.
    pub fn raw_original_url(&self) -> Option<&str> {
        self.raw.as_ref().and_then(|raw| raw.original_url.as_deref())
    }

    /// The current URL with codec tokens turned back into characters.
    pub fn decoded_url(&self) -> Option<String> {
        self.url.as_deref().map(codec::decode_url)
    }
}

/// Sanitizes request path fields through a shared [`PathValidator`].
#[derive(Clone)]
pub struct RequestInterceptor {
    validator: Arc<PathValidator>,
}

impl RequestInterceptor {
    pub fn new(validator: Arc<PathValidator>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Arc<PathValidator> {
        &self.validator
    }

    /// Validate then sanitize one value.
    pub fn sanitize(&self, value: &str) -> String {
        codec::sanitize(&self.validator.validate(value))
    }

    /// Snapshot and sanitize every present field of `ctx`.
    ///
    /// Malformed input never fails here; it resolves to `/`. An error means
    /// the pipeline itself broke and should go to the host's error handling.
    pub fn intercept(&self, ctx: &mut PathContext) -> Result<(), InterceptError> {
        ctx.raw = Some(RawPaths {
            url: ctx.url.clone(),
            original_url: ctx.original_url.clone(),
            path: ctx.path.clone(),
            base_url: ctx.base_url.clone(),
        });

        catch_unwind(AssertUnwindSafe(|| {
            for field in [
                &mut ctx.url,
                &mut ctx.path,
                &mut ctx.original_url,
                &mut ctx.base_url,
            ] {
                if let Some(value) = field.as_mut() {
                    *value = self.sanitize(value);
                }
            }
        }))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            log_intercept_failed!(error = %message, "URL preprocessing failed");
            if let Some(metrics) = self.validator.metrics() {
                metrics.record_intercept_error();
            }
            InterceptError::Internal(message)
        })
    }

    /// Sanitize an `http` request in place.
    ///
    /// The request URI is replaced by the sanitized URL and the resulting
    /// [`PathContext`] (with its raw snapshot) is stored as an extension.
    pub fn intercept_request<B>(&self, req: &mut Request<B>) -> Result<(), InterceptError> {
        let mut ctx = PathContext::from_request(req);
        self.intercept(&mut ctx)?;

        if let Some(url) = ctx.url.as_deref() {
            let uri = url
                .parse::<Uri>()
                .map_err(|source| InterceptError::InvalidUri {
                    url: url.to_string(),
                    source,
                })?;
            *req.uri_mut() = uri;
        }

        req.extensions_mut().insert(ctx);
        Ok(())
    }
}
