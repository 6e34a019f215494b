//! Cross-kind operators. None of these touch the status channel: malformed
//! operands degrade through the lossy numeric view instead of failing.

use std::cmp::Ordering;

use crate::runtime::{
    coerce::{display_string, to_number_lossy},
    value::{Payload, Value},
};

/// Concatenates when either side is text, adds numerically otherwise.
pub fn add(a: &Value, b: &Value) -> Value {
    if a.as_str().is_some() || b.as_str().is_some() {
        let mut text = display_string(a);
        text.push_str(&display_string(b));
        return Value::string(text);
    }
    Value::number(to_number_lossy(a) + to_number_lossy(b))
}

pub fn sub(a: &Value, b: &Value) -> Value {
    Value::number(to_number_lossy(a) - to_number_lossy(b))
}

pub fn mul(a: &Value, b: &Value) -> Value {
    Value::number(to_number_lossy(a) * to_number_lossy(b))
}

/// `0/0` is NaN and `x/0` is infinite with the sign of `x`, whatever the
/// sign of the zero divisor.
pub fn div(a: &Value, b: &Value) -> Value {
    let dividend = to_number_lossy(a);
    let divisor = to_number_lossy(b);
    if divisor != 0.0 {
        return Value::number(dividend / divisor);
    }
    let quotient = if dividend == 0.0 || dividend.is_nan() {
        f64::NAN
    } else if dividend > 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    };
    Value::number(quotient)
}

/// Remainder with the sign of the dividend; modulo by zero is NaN.
pub fn modulo(a: &Value, b: &Value) -> Value {
    Value::number(to_number_lossy(a) % to_number_lossy(b))
}

pub fn neg(a: &Value) -> Value {
    Value::number(-to_number_lossy(a))
}

/// Ordering for `<` and friends. Two strings compare by bytes; any other pair
/// compares numerically and is unordered when either side is NaN.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    to_number_lossy(a).partial_cmp(&to_number_lossy(b))
}

pub fn lt(a: &Value, b: &Value) -> Value {
    Value::bool(compare(a, b) == Some(Ordering::Less))
}

pub fn le(a: &Value, b: &Value) -> Value {
    Value::bool(matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal)))
}

pub fn gt(a: &Value, b: &Value) -> Value {
    Value::bool(compare(a, b) == Some(Ordering::Greater))
}

pub fn ge(a: &Value, b: &Value) -> Value {
    Value::bool(matches!(
        compare(a, b),
        Some(Ordering::Greater | Ordering::Equal)
    ))
}

/// Language-level `==`.
///
/// Null equals only null. Mixed kinds compare through the lossy numeric
/// view, so `0 == false` and `"2" == 2` hold. Same-kind numbers and booleans
/// compare by value, text by content, and collections and functions by
/// identity.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return a.is_null() && b.is_null();
    }
    if a.kind() != b.kind() {
        return to_number_lossy(a) == to_number_lossy(b);
    }
    match (a.payload(), b.payload()) {
        (Payload::Number(x), Payload::Number(y)) => x == y,
        (Payload::Bool(x), Payload::Bool(y)) => x == y,
        (Payload::Undefined, Payload::Undefined) => true,
        (Payload::Text(x), Payload::Text(y)) => x.as_str() == y.as_str(),
        _ => Value::ptr_eq(a, b),
    }
}

pub fn equals(a: &Value, b: &Value) -> Value {
    Value::bool(values_equal(a, b))
}

pub fn not_equals(a: &Value, b: &Value) -> Value {
    Value::bool(!values_equal(a, b))
}
