//! Tolerant field extraction over the printer's XML-like replies.
//!
//! The printer does not always emit well-formed XML, so instead of parsing a
//! document we look for the first `<name>value</name>` pair. Tag names match
//! case-insensitively and values may span lines.

use crate::error::{Error, Result};

/// Find the first occurrence of `needle` in `haystack`, ignoring ASCII case.
fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from > haystack.len() || haystack.len() - from < needle.len() {
        return None;
    }

    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Return the raw text between `<name>` and the next `</name>`, if both exist.
pub fn field<'a>(name: &str, data: &'a str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");

    let start = find_ignore_case(data, &open, 0)? + open.len();
    let end = find_ignore_case(data, &close, start)?;

    Some(&data[start..end])
}

/// A non-empty string field.
pub fn string(name: &str, data: &str) -> Option<String> {
    field(name, data).filter(|value| !value.is_empty()).map(ToOwned::to_owned)
}

/// An integer field. Values that do not parse count as absent.
pub fn integer(name: &str, data: &str) -> Option<i64> {
    field(name, data).and_then(|value| value.trim().parse().ok())
}

/// A decimal field. Values that do not parse count as absent.
pub fn float(name: &str, data: &str) -> Option<f64> {
    field(name, data).and_then(|value| value.trim().parse().ok())
}

/// A string field that must be present.
pub fn required_string(name: &'static str, data: &str) -> Result<String> {
    string(name, data).ok_or(Error::FieldMissing(name))
}

/// An integer field that must be present.
pub fn required_integer(name: &'static str, data: &str) -> Result<i64> {
    integer(name, data).ok_or(Error::FieldMissing(name))
}
