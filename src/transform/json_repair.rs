//! Best-effort recovery of JSON values from malformed request bodies.
//!
//! Clients regularly send JSON that was encoded twice, escaped once too often,
//! URL-encoded, or written as a JavaScript object literal. Each recovery
//! strategy is a pure function `&str -> Option<Value>`; [`repair`] tries them in
//! order and keeps the first value produced.
//!
//! The heuristic strategy rewrites quotes and bare keys textually and can mangle
//! string values that contain quote characters. There is no validation pass
//! after it: whatever parses is forwarded.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::Value;

/// A single recovery attempt.
pub type RepairStrategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are attempted.
pub const STRATEGIES: [(&str, RepairStrategy); 5] = [
    ("direct", parse_direct),
    ("unquote", strip_wrapping_quotes),
    ("unescape", unescape_then_parse),
    ("percent_decode", percent_decode_then_parse),
    ("heuristic", heuristic_repair),
];

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:").expect("bare key pattern is valid")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"));

/// Outcome of a successful repair.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub value: Value,
    /// Name of the strategy that produced the value.
    pub strategy: &'static str,
}

/// Run the cascade over `text`. Returns `None` only if every strategy fails.
pub fn repair(text: &str) -> Option<Repaired> {
    let repaired = STRATEGIES.iter().find_map(|&(name, strategy)| {
        strategy(text).map(|value| Repaired {
            value,
            strategy: name,
        })
    });

    if repaired.is_none() {
        tracing::debug!(len = text.len(), "JSON repair exhausted all strategies");
    }
    repaired
}

fn parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Parse as-is.
///
/// A top-level string whose content is itself a JSON object or array is
/// treated as double-encoded and left to the unquoting strategy.
pub fn parse_direct(text: &str) -> Option<Value> {
    match parse(text)? {
        Value::String(inner) if encodes_container(&inner) => None,
        value => Some(value),
    }
}

fn encodes_container(s: &str) -> bool {
    matches!(parse(s.trim()), Some(Value::Object(_) | Value::Array(_)))
}

/// Remove one layer of matching `"` or `'` around the text and parse the rest.
///
/// Only a matched pair counts as a wrapper; a lone or mismatched quote is left
/// for the later strategies on purpose.
pub fn strip_wrapping_quotes(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let inner = ['"', '\'']
        .iter()
        .find_map(|q| trimmed.strip_prefix(*q)?.strip_suffix(*q))?;

    // The body of a string literal is still escaped.
    parse(inner).or_else(|| parse(&unescape(inner)))
}

/// Resolve common backslash escapes, then parse.
pub fn unescape_then_parse(text: &str) -> Option<Value> {
    let unescaped = unescape(text);
    if unescaped == text {
        return None;
    }
    parse(&unescaped)
}

/// Percent-decode, then parse.
pub fn percent_decode_then_parse(text: &str) -> Option<Value> {
    let decoded = percent_decode_str(text).decode_utf8().ok()?;
    if decoded == text {
        return None;
    }
    parse(&decoded)
}

/// Quote bare keys, swap single quotes for double quotes, drop trailing commas.
pub fn heuristic_repair(text: &str) -> Option<Value> {
    let quoted_keys = BARE_KEY.replace_all(text, "$1\"$2\":");
    let double_quoted = quoted_keys.replace('\'', "\"");
    let no_trailing = TRAILING_COMMA.replace_all(&double_quoted, "$1");
    parse(&no_trailing)
}

/// Single pass over `\"`, `\'`, `\\`, `\n`, `\r` and `\t`. Other escapes are
/// left untouched.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
