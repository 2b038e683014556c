//! Rewrites a relaxed JavaScript object literal into strict JSON.
//!
//! This is a narrow text-rewrite pipeline, not a grammar:
//!
//! 1. drop commas that are followed only by whitespace and a closer,
//! 2. quote bare keys (`name:`, `Long Name:`, `some-key:`),
//! 3. turn every single quote into a double quote.
//!
//! It handles flat and nested literals with primitive values. Known
//! limitation: a quoted value containing something shaped like `, word:` is
//! rewritten as if it held a key, and apostrophes inside values become double
//! quotes.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::ExtractError;

/// Characters of context kept on each side of a parse failure.
const CONTEXT_RADIUS: usize = 60;

fn trailing_comma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"))
}

fn bare_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([{\s,])([A-Za-z_][A-Za-z0-9_\- ]*)\s*:").expect("bare key pattern is valid")
    })
}

/// Applies the three rewrites without parsing.
pub fn rewrite(block: &str) -> String {
    let without_trailing = trailing_comma_pattern().replace_all(block, "$1");
    let quoted_keys = bare_key_pattern().replace_all(&without_trailing, |caps: &Captures| {
        format!("{}\"{}\":", &caps[1], caps[2].trim_end())
    });
    quoted_keys.replace('\'', "\"")
}

/// Normalizes `block` and parses the result as JSON.
///
/// # Returns
///
/// The parsed value, or [`ExtractError::Normalization`] carrying the parser
/// message, the byte offset of the failure within the rewritten text and up
/// to 60 characters of context on each side.
///
/// # Example
///
/// ```rust
/// use station_feed::extract::normalize;
/// use serde_json::json;
///
/// let value = normalize("{a: 1, 'b': 'two',}")?;
/// assert_eq!(value, json!({"a": 1, "b": "two"}));
/// # Ok::<(), station_feed::ExtractError>(())
/// ```
pub fn normalize(block: &str) -> Result<Value, ExtractError> {
    let rewritten = rewrite(block);
    serde_json::from_str(&rewritten).map_err(|e| {
        let offset = byte_offset(&rewritten, e.line(), e.column());
        ExtractError::Normalization {
            message: e.to_string(),
            offset,
            context: context_window(&rewritten, offset).to_string(),
        }
    })
}

/// Converts serde_json's 1-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (idx, current) in text.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            return (offset + column.saturating_sub(1)).min(text.len());
        }
        offset += current.len();
    }
    text.len()
}

fn context_window(text: &str, offset: usize) -> &str {
    let mut start = offset.saturating_sub(CONTEXT_RADIUS);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + CONTEXT_RADIUS).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}
