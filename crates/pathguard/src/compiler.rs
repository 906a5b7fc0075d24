//! Route pattern compilation.
//!
//! [`RouteCompiler`] is the seam to whatever router sits behind the guard.
//! [`PathPatternCompiler`] is the built-in implementation: `:name`
//! parameters, `(...)` custom groups, `?`/`*`/`+` modifiers and `\` escapes,
//! compiled into an anchored `regex-lite` expression.

use regex_lite::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Options that change how a pattern compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Case-sensitive matching.
    pub sensitive: bool,
    /// Trailing slash must match exactly.
    pub strict: bool,
    /// Anchor the match at the end of the path.
    pub end: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            sensitive: true,
            strict: true,
            end: true,
        }
    }
}

/// A compiler that turns a pattern string into a route matcher.
///
/// Implementations must be usable from many request threads at once.
pub trait RouteCompiler: Send + Sync {
    /// Check that `pattern` compiles under `options`.
    fn compile(&self, pattern: &str, options: &CompileOptions) -> Result<(), CompileError>;
}

/// Parameter key of a compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKey {
    /// `:name`
    Named(String),
    /// An unnamed `(...)` group, numbered from zero.
    Index(usize),
}

impl ParamKey {
    pub fn as_string(&self) -> String {
        match self {
            ParamKey::Named(name) => name.clone(),
            ParamKey::Index(index) => index.to_string(),
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pattern: String,
    regex: Regex,
    keys: Vec<ParamKey>,
}

impl CompiledRoute {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// The generated regular expression.
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Match a request path, returning captured parameters in declaration order.
    ///
    /// Parameters that did not participate (optional ones) are omitted.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(path)?;
        let params = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                captures
                    .get(i + 1)
                    .map(|m| (key.as_string(), m.as_str().to_string()))
            })
            .collect();
        Some(params)
    }
}

/// A route built with the default compiler and options.
///
/// This is the plain route constructor that [`crate::guard`] wraps.
#[derive(Debug, Clone)]
pub struct Route {
    compiled: CompiledRoute,
}

impl Route {
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        let compiled = PathPatternCompiler.build(pattern, &CompileOptions::default())?;
        Ok(Self { compiled })
    }

    pub fn pattern(&self) -> &str {
        self.compiled.pattern()
    }

    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        self.compiled.matches(path)
    }
}

/// Default parameter pattern: one segment, no query or fragment.
const DEFAULT_PARAM_PATTERN: &str = "[^/#?]+";

/// Built-in path-to-regexp style compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPatternCompiler;

impl PathPatternCompiler {
    /// Compile `pattern` into a matcher.
    pub fn build(
        &self,
        pattern: &str,
        options: &CompileOptions,
    ) -> Result<CompiledRoute, CompileError> {
        let tokens = lex(pattern)?;
        let parts = parse(tokens)?;

        let mut keys = Vec::new();
        let mut source = String::from("^");
        let mut unnamed = 0usize;

        for part in parts {
            match part {
                Part::Literal(text) => source.push_str(&regex_lite::escape(&text)),
                Part::Param {
                    name,
                    pattern,
                    modifier,
                    prefix,
                } => {
                    let key = match name {
                        Some(name) => ParamKey::Named(name),
                        None => {
                            unnamed += 1;
                            ParamKey::Index(unnamed - 1)
                        }
                    };
                    keys.push(key);

                    let pat = pattern.as_deref().unwrap_or(DEFAULT_PARAM_PATTERN);
                    let pre = if prefix { "/" } else { "" };
                    let fragment = match modifier {
                        None => format!("{pre}({pat})"),
                        Some('?') => format!("(?:{pre}({pat}))?"),
                        Some('+') => format!("{pre}((?:{pat})(?:{pre}(?:{pat}))*)"),
                        Some(_) => format!("(?:{pre}((?:{pat})(?:{pre}(?:{pat}))*))?"),
                    };
                    source.push_str(&fragment);
                }
            }
        }

        if !options.strict {
            source.push_str("/?");
        }
        if options.end {
            source.push('$');
        } else {
            source.push_str("(?:/|$)");
        }

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.sensitive)
            .build()
            .map_err(|e| CompileError::Regex(e.to_string()))?;

        Ok(CompiledRoute {
            pattern: pattern.to_string(),
            regex,
            keys,
        })
    }
}

impl RouteCompiler for PathPatternCompiler {
    fn compile(&self, pattern: &str, options: &CompileOptions) -> Result<(), CompileError> {
        self.build(pattern, options).map(|_| ())
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Char(char),
    Name(String),
    Pattern(String),
    Modifier(char),
}

/// Split a pattern into tokens.
///
/// A `?` directly after a parameter or group is a modifier; any other `?`
/// starts the query string, which is not part of the route.
fn lex(pattern: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<(usize, char)> = pattern.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        let after_param = matches!(tokens.last(), Some(Token::Name(_) | Token::Pattern(_)));

        match ch {
            '?' if !after_param => break,
            '?' | '*' | '+' => {
                tokens.push(Token::Modifier(ch));
                i += 1;
            }
            '\\' => {
                let (_, escaped) = *chars
                    .get(i + 1)
                    .ok_or(CompileError::DanglingEscape { offset })?;
                tokens.push(Token::Char(escaped));
                i += 2;
            }
            ':' => {
                let mut name = String::new();
                let mut j = i + 1;
                while let Some(&(_, c)) = chars.get(j) {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        j += 1;
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(CompileError::MissingParameterName { offset });
                }
                tokens.push(Token::Name(name));
                i = j;
            }
            '(' => {
                let (group, next) = lex_group(&chars, i)?;
                tokens.push(Token::Pattern(group));
                i = next;
            }
            ')' => return Err(CompileError::UnbalancedGroup { offset }),
            _ => {
                tokens.push(Token::Char(ch));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Read a `(...)` group starting at `start`; returns its body and the next index.
fn lex_group(chars: &[(usize, char)], start: usize) -> Result<(String, usize), CompileError> {
    let offset = chars[start].0;
    let mut depth = 1usize;
    let mut body = String::new();
    let mut j = start + 1;

    if let Some(&(_, '?')) = chars.get(j) {
        return Err(CompileError::CapturingGroupNotAllowed { offset });
    }

    while let Some(&(inner_offset, c)) = chars.get(j) {
        match c {
            '\\' => {
                let (_, escaped) = *chars
                    .get(j + 1)
                    .ok_or(CompileError::DanglingEscape {
                        offset: inner_offset,
                    })?;
                body.push('\\');
                body.push(escaped);
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    j += 1;
                    break;
                }
            }
            '(' => {
                // Nested groups must be non-capturing.
                if !matches!(chars.get(j + 1), Some(&(_, '?'))) {
                    return Err(CompileError::CapturingGroupNotAllowed {
                        offset: inner_offset,
                    });
                }
                depth += 1;
            }
            _ => {}
        }
        body.push(c);
        j += 1;
    }

    if depth > 0 {
        return Err(CompileError::UnterminatedGroup { offset });
    }
    if body.is_empty() {
        return Err(CompileError::EmptyGroup { offset });
    }
    Ok((body, j))
}

#[derive(Debug)]
enum Part {
    Literal(String),
    Param {
        name: Option<String>,
        pattern: Option<String>,
        modifier: Option<char>,
        /// The `/` before the parameter belongs to it (matters for optional ones).
        prefix: bool,
    },
}

fn parse(tokens: Vec<Token>) -> Result<Vec<Part>, CompileError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let (name, pattern) = match token {
            Token::Char(c) => {
                literal.push(c);
                continue;
            }
            Token::Modifier(modifier) => {
                return Err(CompileError::UnexpectedModifier { modifier });
            }
            Token::Name(name) => {
                let pattern = match iter.peek() {
                    Some(Token::Pattern(_)) => match iter.next() {
                        Some(Token::Pattern(p)) => Some(p),
                        _ => None,
                    },
                    _ => None,
                };
                (Some(name), pattern)
            }
            Token::Pattern(p) => (None, Some(p)),
        };

        let modifier = match iter.peek() {
            Some(Token::Modifier(m)) => {
                let m = *m;
                iter.next();
                Some(m)
            }
            _ => None,
        };

        let prefix = literal.ends_with('/');
        if prefix {
            literal.pop();
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(std::mem::take(&mut literal)));
        }
        parts.push(Part::Param {
            name,
            pattern,
            modifier,
            prefix,
        });
    }

    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}
