use std::cell::Ref;

use crate::runtime::{
    kind::Kind,
    status::{Failure, StatusCode},
    value::Value,
};

/// `(op) detail` type error with a typed-null fallback.
pub(crate) fn type_error(op: &str, detail: &str, fallback: Kind) -> Failure {
    Failure::typed(StatusCode::TypeError, format!("({}) {}", op, detail), fallback)
}

pub(crate) fn arg_str<'a>(
    value: &'a Value,
    op: &str,
    label: &str,
    fallback: Kind,
) -> Result<&'a str, Failure> {
    value
        .as_str()
        .ok_or_else(|| type_error(op, &format!("{} must be a string", label), fallback))
}

pub(crate) fn arg_number(
    value: &Value,
    op: &str,
    label: &str,
    fallback: Kind,
) -> Result<f64, Failure> {
    value
        .as_number()
        .ok_or_else(|| type_error(op, &format!("{} must be a number", label), fallback))
}

/// Number argument that falls back to `default` when absent or mistyped.
pub(crate) fn arg_number_or(value: &Value, default: f64) -> f64 {
    value.as_number().unwrap_or(default)
}

pub(crate) fn arg_array<'a>(
    value: &'a Value,
    op: &str,
    fallback: Kind,
) -> Result<Ref<'a, Vec<Value>>, Failure> {
    value
        .as_array()
        .ok_or_else(|| type_error(op, "requires array", fallback))
}

/// Character index → byte offset; `None` past the end.
pub(crate) fn char_to_byte(s: &str, char_index: usize) -> Option<usize> {
    if char_index == s.chars().count() {
        return Some(s.len());
    }
    s.char_indices().nth(char_index).map(|(offset, _)| offset)
}

/// Truncates `index` and clamps it to `[0, len]`. Negative indices do not
/// count from the end.
pub(crate) fn clamp_index(index: f64, len: usize) -> usize {
    if index.is_nan() || index <= 0.0 {
        0
    } else if index >= len as f64 {
        len
    } else {
        index as usize
    }
}
