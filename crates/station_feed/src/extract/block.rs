//! Balanced delimiter block extraction.

use crate::error::ExtractError;

/// Returns the `{ ... }` block that starts at, or after, `start`.
///
/// `start` is a byte offset. If the character there is not an opening brace
/// the text is scanned forward to the next one. The returned slice runs from
/// that brace to the brace that brings the nesting depth back to zero.
///
/// Braces inside string literals are counted like any other brace.
///
/// # Errors
///
/// [`ExtractError::MalformedInput`] when `start` is past the end or inside a
/// multi-byte character, when no `{` follows it, or when the block never
/// closes.
///
/// # Example
///
/// ```rust
/// use station_feed::extract::extract_block;
///
/// let text = "let x = {a: {b: 1}} + 2";
/// assert_eq!(extract_block(text, 0)?, "{a: {b: 1}}");
/// assert!(extract_block("{a: {b: 1}", 0).is_err());
/// # Ok::<(), station_feed::ExtractError>(())
/// ```
pub fn extract_block(text: &str, start: usize) -> Result<&str, ExtractError> {
    extract_delimited(text, start, '{', '}')
}

/// Same as [`extract_block`] for an arbitrary pair of delimiters.
pub fn extract_delimited(
    text: &str,
    start: usize,
    open: char,
    close: char,
) -> Result<&str, ExtractError> {
    if start >= text.len() {
        return Err(ExtractError::MalformedInput {
            offset: start,
            reason: format!("start position out of range (length {})", text.len()),
        });
    }
    if !text.is_char_boundary(start) {
        return Err(ExtractError::MalformedInput {
            offset: start,
            reason: "start position is not on a character boundary".to_string(),
        });
    }

    let begin = match text[start..].find(open) {
        Some(relative) => start + relative,
        None => {
            return Err(ExtractError::MalformedInput {
                offset: start,
                reason: format!("opening `{open}` not found"),
            })
        }
    };

    let mut depth = 0usize;
    for (idx, ch) in text[begin..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let end = begin + idx + ch.len_utf8();
                return Ok(&text[begin..end]);
            }
        }
    }

    Err(ExtractError::MalformedInput {
        offset: begin,
        reason: format!("matching `{close}` not found"),
    })
}
