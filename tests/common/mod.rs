#![allow(dead_code)]

use flyux::runtime::leak_detector::{self, LeakStats};
use flyux::runtime::value::Value;

pub fn n(x: f64) -> Value {
    Value::number(x)
}

pub fn s(text: &str) -> Value {
    Value::string(text)
}

pub fn nums(xs: &[f64]) -> Value {
    Value::array(xs.iter().copied().map(Value::number).collect())
}

/// Runs `body` and returns the allocation counters it moved.
pub fn measure(body: impl FnOnce()) -> LeakStats {
    let before = leak_detector::snapshot();
    body();
    leak_detector::snapshot().since(&before)
}
