use crate::runtime::{kind::Kind, status, value::Value};

fn kind_is(value: &Value, test: impl FnOnce(Kind) -> bool) -> Value {
    status::ok(Value::bool(test(value.kind())))
}

pub fn is_num(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Number)
}

pub fn is_str(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::String)
}

pub fn is_bl(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Bool)
}

pub fn is_arr(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Array)
}

/// Arrays count as objects.
pub fn is_obj(value: &Value) -> Value {
    kind_is(value, |k| matches!(k, Kind::Object | Kind::Array))
}

pub fn is_null(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Null)
}

pub fn is_undef(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Undefined)
}

pub fn is_func(value: &Value) -> Value {
    kind_is(value, |k| k == Kind::Function)
}
