//! MySQL 5.x SQL literal codec.
//!
//! Pure, stateless formatting functions for identifiers and string literals.
//! Escape table and backtick-pair handling are grounded on the original
//! `MySQL5Escape`/`MySQL5Backtick`/`MySQL5BacktickUser` implementation; unlike
//! that implementation, [`backtick_user`] validates its input instead of
//! indexing past a missing `@`.

use crate::error::DumpError;

/// Wraps an identifier in backticks. Does not escape backticks inside the
/// identifier; MySQL identifiers containing a backtick must be doubled by
/// the caller before reaching this function (none of the introspected names
/// in practice contain one).
pub fn backtick(identifier: &str) -> String {
    format!("`{identifier}`")
}

/// Splits a `user@host` literal into `` `user`@`host` ``.
pub fn backtick_user(user_at_host: &str) -> Result<String, DumpError> {
    match user_at_host.split_once('@') {
        Some((user, host)) => Ok(format!("{}@{}", backtick(user), backtick(host))),
        None => Err(DumpError::InvalidUserLiteral { raw: user_at_host.to_string() }),
    }
}

/// Escapes the eight characters MySQL treats specially inside a quoted
/// string literal. All other bytes pass through unchanged.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\x1b' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wraps an already-escaped-or-not string value in single quotes, escaping
/// it along the way.
pub fn quote(value: &str) -> String {
    format!("'{}'", escape(value))
}

/// Joins a list of already-quoted SQL values with `, `.
pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backticks and joins a list of column names with `, `.
pub fn join_columns<I, S>(columns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|c| backtick(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
