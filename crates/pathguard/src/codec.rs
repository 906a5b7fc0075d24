//! Reversible encoding of route-syntax characters.
//!
//! Every character the pattern compiler treats as syntax is replaced by a
//! fixed `_NAME_` token, so a path segment can pass through the compiler as
//! plain literal text and still be decoded back to what the client sent.

use crate::preprocess::strip_origin;

/// Reserved characters and their tokens.
///
/// No token is a prefix of another, so a left-to-right scan decodes
/// unambiguously.
pub const TOKENS: [(char, &str); 15] = [
    (':', "_COLON_"),
    ('/', "_SLASH_"),
    ('?', "_QMARK_"),
    ('=', "_EQ_"),
    ('&', "_AMP_"),
    ('[', "_LBRACK_"),
    (']', "_RBRACK_"),
    ('{', "_LCURLY_"),
    ('}', "_RCURLY_"),
    ('$', "_DOLLAR_"),
    ('^', "_CARET_"),
    ('+', "_PLUS_"),
    ('*', "_ASTERISK_"),
    ('.', "_DOT_"),
    ('|', "_PIPE_"),
];

/// Percent form used for a literal space.
pub const SPACE: &str = "%20";

/// Token for a reserved character, if it is one.
pub fn token_for(ch: char) -> Option<&'static str> {
    TOKENS
        .iter()
        .find(|(reserved, _)| *reserved == ch)
        .map(|(_, token)| *token)
}

/// Encode a single path segment.
pub fn encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            ' ' => encoded.push_str(SPACE),
            _ => match token_for(ch) {
                Some(token) => encoded.push_str(token),
                None => encoded.push(ch),
            },
        }
    }
    encoded
}

/// Decode tokens (and `%20`) back to the characters they stand for.
///
/// Text that already spelled a token before encoding (a literal `_DOT_`)
/// decodes to the character as well; the format has no escape for it.
pub fn decode(input: &str) -> String {
    let mut decoded = String::with_capacity(input.len());
    let mut rest = input;

    'scan: while let Some(ch) = rest.chars().next() {
        if ch == '_' {
            for (reserved, token) in TOKENS {
                if let Some(tail) = rest.strip_prefix(token) {
                    decoded.push(reserved);
                    rest = tail;
                    continue 'scan;
                }
            }
        } else if let Some(tail) = rest.strip_prefix(SPACE) {
            decoded.push(' ');
            rest = tail;
            continue;
        }
        decoded.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    decoded
}

/// Encode every segment of a URL's path, keeping the query string verbatim.
///
/// Absolute URLs are reduced to path and query first. Empty segments are
/// dropped, so the result has exactly one leading slash and no runs.
pub fn sanitize(url: &str) -> String {
    let target = strip_origin(url);
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target.as_ref(), None),
    };

    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(encode)
        .collect();

    let mut sanitized = format!("/{}", segments.join("/"));
    if let Some(query) = query {
        sanitized.push('?');
        sanitized.push_str(query);
    }
    sanitized
}

/// Decode a whole URL produced by [`sanitize`].
pub fn decode_url(url: &str) -> String {
    decode(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_replaces_every_reserved_character() {
        assert_eq!(encode("a:b"), "a_COLON_b");
        assert_eq!(encode("x.y"), "x_DOT_y");
        assert_eq!(encode("{id}"), "_LCURLY_id_RCURLY_");
        assert_eq!(encode("a|b^c$"), "a_PIPE_b_CARET_c_DOLLAR_");
        assert_eq!(encode("k=v&w"), "k_EQ_v_AMP_w");
        assert_eq!(encode("[*+?/]"), "_LBRACK__ASTERISK__PLUS__QMARK__SLASH__RBRACK_");
    }

    #[test]
    fn encode_passes_unreserved_through() {
        assert_eq!(encode("Az09-_~()"), "Az09-_~()");
        assert_eq!(encode("café@!"), "café@!");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn space_uses_percent_form() {
        assert_eq!(encode("with spaces"), "with%20spaces");
        assert_eq!(decode("with%20spaces"), "with spaces");
    }

    #[test]
    fn tokens_are_unique_and_prefix_free() {
        for (i, (a_char, a)) in TOKENS.iter().enumerate() {
            for (b_char, b) in &TOKENS[i + 1..] {
                assert_ne!(a_char, b_char);
                assert!(!a.starts_with(b) && !b.starts_with(a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn round_trip_over_supported_characters() {
        let alphabet: Vec<char> = ":/?=&[]{}$^+*.| azAZ09-~()".chars().collect();
        // Deterministic walk over combinations of up to three characters.
        for a in &alphabet {
            for b in &alphabet {
                for c in &alphabet {
                    let s: String = [*a, *b, *c].iter().collect();
                    assert_eq!(decode(&encode(&s)), s, "input {s:?}");
                }
            }
        }
    }

    #[test]
    fn round_trip_with_underscores_between_words() {
        for s in ["snake_case.json", "a_b:c", "__init__.py", "x_y_z"] {
            assert_eq!(decode(&encode(s)), s);
        }
    }

    #[test]
    fn text_spelling_a_token_does_not_round_trip() {
        // `_` passes through encode, so literal token text is indistinguishable
        // from an encoded character.
        for (input, decoded) in [
            ("x_DOT_", "x."),
            ("my_PIPE_name", "my|name"),
            ("_COLON_", ":"),
        ] {
            assert_eq!(encode(input), input);
            assert_eq!(decode(&encode(input)), decoded);
        }
        assert_eq!(decode_url(&sanitize("/files/x_DOT_")), "/files/x.");
    }

    #[test]
    fn encode_is_idempotent() {
        for s in ["a:b.c", "with space", "plain", "{x}|[y]"] {
            let once = encode(s);
            assert_eq!(encode(&once), once);
        }
    }

    #[test]
    fn decode_leaves_unknown_underscore_text() {
        assert_eq!(decode("_UNKNOWN_"), "_UNKNOWN_");
        assert_eq!(decode("a_"), "a_");
        assert_eq!(decode("%2"), "%2");
    }

    #[test]
    fn sanitize_encodes_segments_and_keeps_query() {
        assert_eq!(
            sanitize("/path with spaces/and:colons/"),
            "/path%20with%20spaces/and_COLON_colons"
        );
        assert_eq!(
            sanitize("http://example.com/path/to/data?key=value&other:key=other_value"),
            "/path/to/data?key=value&other:key=other_value"
        );
        assert_eq!(sanitize(""), "/");
        assert_eq!(sanitize("//"), "/");
        assert_eq!(sanitize("/?q=1"), "/?q=1");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for url in [
            "/api/resource/https:/problem.com/path",
            "/a b/c.d?x=y.z",
            "http://h/x:y",
            "/",
        ] {
            let once = sanitize(url);
            assert_eq!(sanitize(&once), once, "input {url:?}");
        }
    }

    #[test]
    fn decode_url_restores_sanitized_path() {
        let sanitized = sanitize("/api/resource/https:/problem.com/path");
        assert_eq!(sanitized, "/api/resource/https_COLON_/problem_DOT_com/path");
        assert_eq!(decode_url(&sanitized), "/api/resource/https:/problem.com/path");
    }
}
