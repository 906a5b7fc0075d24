//! Pattern preprocessing.
//!
//! Turns whatever arrived in a path position (an absolute URL, a path with a
//! query string, a raw path) into a canonical pattern with exactly one
//! leading slash, no empty segments, well-formed parameter names and
//! route-syntax characters replaced by codec tokens.

use std::borrow::Cow;

use http::Uri;
use pathguard_telemetry::{log_param_repaired, log_url_parse_fallback};

use crate::codec;

/// Replacement for a parameter segment whose name is missing or malformed.
pub const DEFAULT_PARAM: &str = ":id";

/// Why a parameter segment was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairKind {
    /// A bare `:` with no name after it.
    MissingName,
    /// A name containing characters outside `[A-Za-z0-9_]`.
    MalformedName,
}

/// A parameter segment that was replaced with [`DEFAULT_PARAM`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRepair {
    /// Position of the segment among the non-empty segments.
    pub index: usize,
    /// The segment as it appeared in the input.
    pub segment: String,
    pub kind: RepairKind,
}

/// Result of preprocessing, with the repairs that were needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub pattern: String,
    pub repairs: Vec<ParamRepair>,
}

impl Preprocessed {
    /// True if some parameter segment had no name at all.
    pub fn has_missing_name(&self) -> bool {
        self.repairs
            .iter()
            .any(|repair| repair.kind == RepairKind::MissingName)
    }
}

/// Normalize `input` into a canonical route pattern.
///
/// Never fails; the result always starts with `/`.
pub fn preprocess(input: &str) -> String {
    preprocess_outcome(input).pattern
}

/// Like [`preprocess`], also reporting parameter repairs.
///
/// Each repair is logged as a `param_repaired` warning.
pub fn preprocess_outcome(input: &str) -> Preprocessed {
    let outcome = normalize(input);
    for repair in &outcome.repairs {
        log_param_repaired!(
            segment = %repair.segment,
            replacement = DEFAULT_PARAM,
            "invalid parameter name in segment, using :id instead"
        );
    }
    outcome
}

/// [`preprocess_outcome`] without the repair warnings.
pub(crate) fn normalize(input: &str) -> Preprocessed {
    let target = strip_origin(input);
    let trimmed = target.trim_start_matches('/');

    let mut segments = Vec::new();
    let mut repairs = Vec::new();
    let mut in_query = false;

    for (index, segment) in trimmed.split('/').filter(|s| !s.is_empty()).enumerate() {
        // Everything after the segment carrying `?` is query text.
        if in_query {
            segments.push(segment.to_string());
            continue;
        }

        if let Some(name) = segment.strip_prefix(':') {
            if is_param_name(name) {
                segments.push(segment.to_string());
            } else {
                let kind = if name.is_empty() {
                    RepairKind::MissingName
                } else {
                    RepairKind::MalformedName
                };
                repairs.push(ParamRepair {
                    index,
                    segment: segment.to_string(),
                    kind,
                });
                segments.push(DEFAULT_PARAM.to_string());
            }
            continue;
        }

        if segment.contains('?') {
            in_query = true;
            segments.push(segment.to_string());
            continue;
        }

        segments.push(encode_literal(segment));
    }

    Preprocessed {
        pattern: format!("/{}", segments.join("/")),
        repairs,
    }
}

/// `[A-Za-z0-9_]+`
pub fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Encode a literal (non-parameter, non-query) segment.
///
/// Unlike [`codec::encode`], dots are kept: a dot is literal text to the
/// compiler and only the full sanitize pass tokenizes it.
fn encode_literal(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for ch in segment.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '~' | '.' | '(' | ')') {
            encoded.push(ch);
        } else if ch == ' ' {
            encoded.push_str(codec::SPACE);
        } else if let Some(token) = codec::token_for(ch) {
            encoded.push_str(token);
        } else {
            encoded.push(ch);
        }
    }
    encoded
}

/// True for `scheme://...`, where scheme is `[A-Za-z][A-Za-z0-9+.-]*`.
pub fn is_absolute_url(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Reduce an absolute URL to its path and query; other input is returned as is.
pub(crate) fn strip_origin(input: &str) -> Cow<'_, str> {
    if !is_absolute_url(input) {
        return Cow::Borrowed(input);
    }

    let target = match input.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
        Ok(_) | Err(_) => {
            log_url_parse_fallback!(
                url = %input,
                "absolute URL could not be parsed, stripping scheme and host"
            );
            strip_authority(input).to_string()
        }
    };

    Cow::Owned(collapse_slashes(&target))
}

/// Everything from the first `/` after `scheme://`, or nothing.
fn strip_authority(input: &str) -> &str {
    let after_scheme = input
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(input);
    match after_scheme.find('/') {
        Some(pos) => &after_scheme[pos..],
        None => "",
    }
}

/// Collapse runs of `/` into one.
fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut prev_slash = false;

    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                collapsed.push('/');
            }
            prev_slash = true;
        } else {
            collapsed.push(ch);
            prev_slash = false;
        }
    }

    collapsed
}
