//! Retain/release and the immortal value cache.
//!
//! Booleans, `null`, `undefined` and integers in `[INTERN_MIN, INTERN_MAX]`
//! are built once per thread, on first use, and handed out for the rest of
//! the thread's life. The cache itself holds their last reference, so they
//! are never freed and never show up in the leak counters.

use crate::runtime::{
    kind::Kind,
    value::{Payload, Value},
};

pub const INTERN_MIN: i64 = -128;
pub const INTERN_MAX: i64 = 256;

struct Immortals {
    numbers: Vec<Value>,
    yes: Value,
    no: Value,
    null: Value,
    undefined: Value,
}

impl Immortals {
    fn new() -> Self {
        let numbers = (INTERN_MIN..=INTERN_MAX)
            .map(|n| Value::immortal(Payload::Number(n as f64), Kind::Number))
            .collect();
        Self {
            numbers,
            yes: Value::immortal(Payload::Bool(true), Kind::Bool),
            no: Value::immortal(Payload::Bool(false), Kind::Bool),
            null: Value::immortal(Payload::Null, Kind::Null),
            undefined: Value::immortal(Payload::Undefined, Kind::Undefined),
        }
    }
}

thread_local! {
    static IMMORTALS: Immortals = Immortals::new();
}

/// Cached cell for `n` when it is a small integer. Negative zero is never
/// interned, so it keeps its sign bit.
pub fn interned_number(n: f64) -> Option<Value> {
    if n.fract() != 0.0 || (n == 0.0 && n.is_sign_negative()) {
        return None;
    }
    if n < INTERN_MIN as f64 || n > INTERN_MAX as f64 {
        return None;
    }
    let slot = (n as i64 - INTERN_MIN) as usize;
    IMMORTALS
        .try_with(|cache| cache.numbers[slot].clone())
        .ok()
}

pub fn boolean(b: bool) -> Value {
    with_cache(
        |cache| if b { cache.yes.clone() } else { cache.no.clone() },
        || Value::immortal(Payload::Bool(b), Kind::Bool),
    )
}

pub fn null() -> Value {
    with_cache(
        |cache| cache.null.clone(),
        || Value::immortal(Payload::Null, Kind::Null),
    )
}

pub fn undefined() -> Value {
    with_cache(
        |cache| cache.undefined.clone(),
        || Value::immortal(Payload::Undefined, Kind::Undefined),
    )
}

// Values built while the thread is shutting down get a fresh immortal cell.
fn with_cache(hit: impl FnOnce(&Immortals) -> Value, miss: impl FnOnce() -> Value) -> Value {
    IMMORTALS.try_with(hit).unwrap_or_else(|_| miss())
}

/// Adds a reference and returns the same cell.
pub fn retain(value: &Value) -> Value {
    value.clone()
}

/// Drops a reference; the cell is freed when this was the last one, unless
/// it is immortal.
pub fn release(value: Value) {
    drop(value);
}
