use rand::Rng;

use crate::runtime::{
    helpers::{arg_number, type_error},
    kind::Kind,
    status::{self, Failure, StatusCode},
    value::Value,
};

fn unary(op: &str, value: &Value, f: impl FnOnce(f64) -> f64) -> Value {
    status::settle(|| {
        let n = arg_number(value, op, "argument", Kind::Number)?;
        Ok(Value::number(f(n)))
    })
}

pub fn abs(value: &Value) -> Value {
    unary("abs", value, f64::abs)
}

pub fn floor(value: &Value) -> Value {
    unary("floor", value, f64::floor)
}

pub fn ceil(value: &Value) -> Value {
    unary("ceil", value, f64::ceil)
}

/// Rounds half away from zero.
pub fn round(value: &Value) -> Value {
    unary("round", value, f64::round)
}

/// `round(x, digits)`.
pub fn round_to(value: &Value, digits: &Value) -> Value {
    status::settle(|| {
        let n = arg_number(value, "round", "first argument", Kind::Number)?;
        let digits = arg_number(digits, "round", "second argument", Kind::Number)?;
        let scale = 10f64.powi(digits as i32);
        Ok(Value::number((n * scale).round() / scale))
    })
}

pub fn sqrt(value: &Value) -> Value {
    status::settle(|| {
        let n = arg_number(value, "sqrt", "argument", Kind::Number)?;
        if n < 0.0 {
            return Err(Failure::typed(
                StatusCode::MathError,
                "(sqrt) negative number",
                Kind::Number,
            ));
        }
        Ok(Value::number(n.sqrt()))
    })
}

pub fn pow(base: &Value, exponent: &Value) -> Value {
    status::settle(|| {
        let base = arg_number(base, "pow", "base", Kind::Number)?;
        let exponent = arg_number(exponent, "pow", "exponent", Kind::Number)?;
        Ok(Value::number(base.powf(exponent)))
    })
}

fn binary(op: &str, a: &Value, b: &Value, f: impl FnOnce(f64, f64) -> f64) -> Value {
    status::settle(|| {
        let a = arg_number(a, op, "first argument", Kind::Number)?;
        let b = arg_number(b, op, "second argument", Kind::Number)?;
        Ok(Value::number(f(a, b)))
    })
}

pub fn min(a: &Value, b: &Value) -> Value {
    binary("min", a, b, |a, b| if a < b { a } else { b })
}

pub fn max(a: &Value, b: &Value) -> Value {
    binary("max", a, b, |a, b| if a > b { a } else { b })
}

pub fn clamp(value: &Value, low: &Value, high: &Value) -> Value {
    status::settle(|| {
        let n = arg_number(value, "clamp", "first argument", Kind::Number)?;
        let low = arg_number(low, "clamp", "second argument", Kind::Number)?;
        let high = arg_number(high, "clamp", "third argument", Kind::Number)?;
        if low > high {
            return Err(type_error(
                "clamp",
                "min must be less than or equal to max",
                Kind::Number,
            ));
        }
        let clamped = if n < low {
            low
        } else if n > high {
            high
        } else {
            n
        };
        Ok(Value::number(clamped))
    })
}

/// False for non-numbers.
pub fn is_nan(value: &Value) -> Value {
    status::ok(Value::bool(value.as_number().is_some_and(f64::is_nan)))
}

/// False for non-numbers.
pub fn is_finite(value: &Value) -> Value {
    status::ok(Value::bool(value.as_number().is_some_and(f64::is_finite)))
}

/// Uniform in `[0, 1)` from the thread-local generator.
pub fn random() -> Value {
    status::ok(Value::number(rand::rng().random::<f64>()))
}
