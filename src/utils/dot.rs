//! DOT format utilities for circuit visualization.
//!
//! This module provides utilities for generating DOT format output,
//! which can be rendered using Graphviz tools.

/// Escapes a string for safe use in DOT labels and identifiers.
///
/// Handles quotes, backslashes, line breaks, angle brackets and the record
/// delimiters `{`, `}` and `|`, so the result is also safe inside
/// `shape=record` labels.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::utils::escape_dot;
///
/// assert_eq!(escape_dot("phi<i32>"), "phi\\<i32\\>");
/// assert_eq!(escape_dot("{a|b}"), "\\{a\\|b\\}");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            '<' | '>' | '{' | '}' | '|' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
