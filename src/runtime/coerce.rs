//! Conversions between kinds: truthiness, the lossy numeric view used by
//! operators, the text rendering used by concatenation, and the explicit
//! `toNum` / `toStr` / `toBl` / `toInt` conversions.

use crate::runtime::{
    kind::{Kind, SubKind},
    number_format::{parse_lossy, parse_strict, to_display},
    status::{self, Failure, StatusCode},
    value::{Payload, Value},
};

/// Best-effort numeric view: text parses its numeric prefix, booleans are
/// 0/1, everything else (undefined included) is 0.
pub fn to_number_lossy(value: &Value) -> f64 {
    match value.payload() {
        Payload::Number(n) => *n,
        Payload::Bool(b) => f64::from(u8::from(*b)),
        Payload::Text(text) => parse_lossy(text.as_str()),
        Payload::Cell(inner) => to_number_lossy(&inner.borrow()),
        _ => 0.0,
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value.payload() {
        Payload::Number(n) => *n != 0.0 && !n.is_nan(),
        Payload::Bool(b) => *b,
        Payload::Null | Payload::Undefined => false,
        Payload::Text(text) => !text.as_str().is_empty(),
        Payload::Cell(inner) => is_truthy(&inner.borrow()),
        Payload::Array(_) | Payload::Object(_) | Payload::Ext(_) | Payload::Function(_) => true,
    }
}

/// Text form used by `+` concatenation, `join` and `toStr`.
pub fn display_string(value: &Value) -> String {
    match value.payload() {
        Payload::Number(n) => to_display(*n),
        Payload::Bool(b) => b.to_string(),
        Payload::Null => "null".to_string(),
        Payload::Undefined => "undef".to_string(),
        Payload::Text(text) => text.as_str().to_string(),
        Payload::Array(_) => "[...]".to_string(),
        Payload::Object(_) | Payload::Ext(_) => "{...}".to_string(),
        Payload::Function(_) => "[Function]".to_string(),
        Payload::Cell(inner) => display_string(&inner.borrow()),
    }
}

/// `typeof`: reports the declared kind, so a null held by a `num` variable
/// still reads as `num`.
pub fn type_of(value: &Value) -> Value {
    let name = match (value.declared_kind(), value.sub_kind()) {
        (Kind::Object, SubKind::Buffer) => "obj:Buffer",
        (Kind::Object, SubKind::FileHandle) => "obj:FileHandle",
        (Kind::Object, SubKind::Error) => "obj:Error",
        (declared, _) => declared.type_of_name(),
    };
    Value::static_str(name)
}

pub fn to_num(value: &Value) -> Value {
    status::settle(|| match value.payload() {
        Payload::Number(_) => Ok(value.clone()),
        Payload::Undefined => Ok(Value::number(0.0)),
        Payload::Bool(b) => Ok(Value::number(f64::from(u8::from(*b)))),
        Payload::Null => Ok(Value::null_typed(Kind::Number)),
        Payload::Text(text) if text.as_str().is_empty() => Err(Failure::typed(
            StatusCode::TypeError,
            "(toNum) Empty string cannot be converted to number",
            Kind::Number,
        )),
        Payload::Text(text) => match parse_strict(text.as_str()) {
            Some(n) => Ok(Value::number(n)),
            None => Err(Failure::typed(
                StatusCode::TypeError,
                "(toNum) Invalid number format",
                Kind::Number,
            )),
        },
        _ => Err(Failure::typed(
            StatusCode::TypeError,
            "(toNum) Cannot convert array/object to number",
            Kind::Number,
        )),
    })
}

pub fn to_str(value: &Value) -> Value {
    if value.as_str().is_some() {
        return status::ok(value.clone());
    }
    status::ok(Value::string(display_string(value)))
}

pub fn to_bl(value: &Value) -> Value {
    status::ok(Value::bool(is_truthy(value)))
}

/// Floor of `to_num`; a failed conversion passes its sentinel through.
pub fn to_int(value: &Value) -> Value {
    let number = to_num(value);
    match number.as_number() {
        Some(n) => Value::number(n.floor()),
        None => number,
    }
}
