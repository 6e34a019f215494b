//! Array operators and generic indexing.
//!
//! Everything except `set_index` returns a new array: elements are shared
//! into the result and the input is left as it was.

use std::cmp::Ordering;

use crate::runtime::{
    arith::values_equal,
    closure,
    coerce::to_number_lossy,
    ext::Extension,
    helpers::{arg_array, clamp_index, type_error},
    kind::Kind,
    object_ops,
    status::{self, Failure, OpResult, StatusCode},
    value::{Payload, Value},
};

pub fn len(value: &Value) -> Value {
    status::settle(|| {
        let count = match value.payload() {
            Payload::Text(text) => text.char_len(),
            Payload::Array(items) => items.borrow().len(),
            Payload::Object(map) => map.borrow().len(),
            Payload::Ext(ext) => match &*ext.borrow() {
                Extension::Buffer(buffer) => buffer.bytes.len(),
                _ => 0,
            },
            _ => {
                return Err(type_error(
                    "len",
                    "argument must be a string, array, or object",
                    Kind::Number,
                ));
            }
        };
        Ok(Value::number(count as f64))
    })
}

/// Most `undefined` slots a single assignment may append past the end.
pub const MAX_ARRAY_GROWTH: usize = 1 << 24;

/// Array position for `key`, or `None` when negative, NaN or infinite.
fn position(key: &Value) -> Option<usize> {
    let index = to_number_lossy(key);
    if !index.is_finite() || index < 0.0 {
        None
    } else {
        Some(index as usize)
    }
}

fn lookup(container: &Value, key: &Value) -> OpResult {
    match container.payload() {
        Payload::Null => Err(Failure::type_error(
            "Attempt to index null value",
            Value::null(),
        )),
        Payload::Array(items) => {
            let items = items.borrow();
            position(key)
                .and_then(|i| items.get(i).cloned())
                .ok_or_else(|| Failure::out_of_bounds("Array index out of bounds", Value::null()))
        }
        Payload::Ext(ext) if key.as_number().is_some() => {
            let ext = ext.borrow();
            let Some(buffer) = ext.as_buffer() else {
                return Err(Failure::type_error("Invalid index operation", Value::null()));
            };
            position(key)
                .and_then(|i| buffer.bytes.get(i))
                .map(|byte| Value::number(f64::from(*byte)))
                .ok_or_else(|| Failure::out_of_bounds("Buffer index out of bounds", Value::null()))
        }
        Payload::Ext(ext) if key.as_str().is_some() => {
            let name = key.as_str().unwrap_or_default();
            ext.borrow()
                .virtual_property(name)
                .ok_or_else(|| Failure::type_error("Object key not found", Value::null()))
        }
        Payload::Object(map) if key.as_str().is_some() => {
            let name = key.as_str().unwrap_or_default();
            map.borrow()
                .get(name)
                .cloned()
                .ok_or_else(|| Failure::type_error("Object key not found", Value::null()))
        }
        _ => Err(Failure::type_error("Invalid index operation", Value::null())),
    }
}

/// `container[key]` for arrays, buffers and objects. Misses set the status
/// channel and return null.
pub fn index(container: &Value, key: &Value) -> Value {
    status::settle(|| lookup(container, key))
}

/// `container[key]` that never reports: any miss is `undefined`.
pub fn index_safe(container: &Value, key: &Value) -> Value {
    status::set_ok();
    lookup(container, key).unwrap_or_else(|_| Value::undefined())
}

/// Element access for indices the caller has already bounds-checked.
///
/// # Panics
/// When `index` is past the end of the array.
pub fn index_unchecked(array: &Value, index: usize) -> Value {
    match array.as_array() {
        Some(items) => items[index].clone(),
        None => Value::undefined(),
    }
}

/// `container[key] := value`, in place. Arrays grow with `undefined` to
/// reach `key`; negative and NaN indices are ignored. An infinite index, or
/// one more than `MAX_ARRAY_GROWTH` past the end, is out of bounds and
/// leaves the array untouched.
pub fn set_index(container: &Value, key: &Value, value: Value) -> Value {
    if let (Payload::Object(_), Some(name)) = (container.payload(), key.as_str()) {
        return object_ops::set_field(container, name, value);
    }
    status::settle(|| match container.payload() {
        Payload::Array(items) => {
            let index = to_number_lossy(key);
            if index.is_nan() || index < 0.0 {
                return Ok(value);
            }
            let previous = {
                let mut items = items.borrow_mut();
                let limit = items.len().saturating_add(MAX_ARRAY_GROWTH);
                let i = position(key).filter(|&i| i < limit).ok_or_else(|| {
                    Failure::out_of_bounds("Array index out of bounds", Value::null())
                })?;
                if i >= items.len() {
                    items.resize_with(i + 1, Value::undefined);
                }
                std::mem::replace(&mut items[i], value.clone())
            };
            drop(previous);
            Ok(value)
        }
        Payload::Ext(ext) if key.as_number().is_some() => {
            let mut ext = ext.borrow_mut();
            let Extension::Buffer(buffer) = &mut *ext else {
                return Err(Failure::type_error("Invalid index assignment", Value::null()));
            };
            let slot = position(key)
                .and_then(|i| buffer.bytes.get_mut(i))
                .ok_or_else(|| Failure::out_of_bounds("Buffer index out of bounds", Value::null()))?;
            *slot = (to_number_lossy(&value) as i64 & 0xff) as u8;
            Ok(value)
        }
        Payload::Null => Err(Failure::type_error(
            "Attempt to index null value",
            Value::null(),
        )),
        _ => Err(Failure::type_error("Invalid index assignment", Value::null())),
    })
}

pub fn push(array: &Value, item: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "push", Kind::Object)?;
        let mut out = Vec::with_capacity(items.len() + 1);
        out.extend(items.iter().cloned());
        out.push(item.clone());
        Ok(Value::array(out))
    })
}

pub fn unshift(array: &Value, item: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "unshift", Kind::Object)?;
        let mut out = Vec::with_capacity(items.len() + 1);
        out.push(item.clone());
        out.extend(items.iter().cloned());
        Ok(Value::array(out))
    })
}

pub fn pop(array: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "pop", Kind::Object)?;
        match items.split_last() {
            Some((_, rest)) => Ok(Value::array(rest.to_vec())),
            None => Err(Failure::typed(
                StatusCode::OutOfBounds,
                "(pop) cannot pop from empty array",
                Kind::Object,
            )),
        }
    })
}

pub fn shift(array: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "shift", Kind::Object)?;
        match items.split_first() {
            Some((_, rest)) => Ok(Value::array(rest.to_vec())),
            None => Err(Failure::typed(
                StatusCode::OutOfBounds,
                "(shift) cannot shift from empty array",
                Kind::Object,
            )),
        }
    })
}

/// Half-open `[start, end)` clamped to the array. A non-number start reads
/// as 0 and a non-number end as the length.
pub fn slice(array: &Value, start: &Value, end: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "slice", Kind::Object)?;
        let len = items.len();
        let start = start.as_number().map_or(0, |n| clamp_index(n, len));
        let end = end.as_number().map_or(len, |n| clamp_index(n, len));
        if start >= end {
            return Ok(Value::array(Vec::new()));
        }
        Ok(Value::array(items[start..end].to_vec()))
    })
}

fn joined(a: &[Value], b: &[Value]) -> Value {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend(a.iter().cloned());
    out.extend(b.iter().cloned());
    Value::array(out)
}

pub fn concat(left: &Value, right: &Value) -> Value {
    status::settle(|| match (left.as_array(), right.as_array()) {
        (Some(a), Some(b)) => Ok(joined(&a, &b)),
        _ => Err(type_error("concat", "requires two arrays", Kind::Object)),
    })
}

/// `[...target, ...source]`. Never fails: a non-array side contributes
/// nothing, and two non-arrays give `[]`.
pub fn spread_array(target: &Value, source: &Value) -> Value {
    let spread = match (target.as_array(), source.as_array()) {
        (Some(a), Some(b)) => joined(&a, &b),
        (Some(only), None) | (None, Some(only)) => Value::array(only.clone()),
        (None, None) => Value::array(Vec::new()),
    };
    status::ok(spread)
}

pub fn reverse(array: &Value) -> Value {
    status::settle(|| {
        let items = arg_array(array, "reverse", Kind::Object)?;
        Ok(Value::array(items.iter().rev().cloned().collect()))
    })
}

/// Position of the first element `==` to `needle`.
pub fn position_of(array: &Value, needle: &Value) -> Option<usize> {
    array
        .as_array()?
        .iter()
        .position(|item| values_equal(item, needle))
}

pub fn index_of(array: &Value, needle: &Value) -> Value {
    status::settle(|| {
        arg_array(array, "indexOf", Kind::Number)?;
        let found = position_of(array, needle).map_or(-1.0, |i| i as f64);
        Ok(Value::number(found))
    })
}

pub fn includes(array: &Value, needle: &Value) -> Value {
    status::settle(|| {
        arg_array(array, "includes", Kind::Bool)?;
        Ok(Value::bool(position_of(array, needle).is_some()))
    })
}

/// Numbers ascending, then strings by bytes, then the remaining kinds by tag.
fn default_order(a: &Value, b: &Value) -> Ordering {
    match (a.payload(), b.payload()) {
        (Payload::Number(x), Payload::Number(y)) => x.total_cmp(y),
        (Payload::Text(x), Payload::Text(y)) => x.as_str().cmp(y.as_str()),
        _ => (a.kind() as u8).cmp(&(b.kind() as u8)),
    }
}

/// Stable merge sort. User comparators need not be consistent, so this
/// never relies on the ordering being total.
fn merge_sort(items: &mut Vec<Value>, compare: &mut dyn FnMut(&Value, &Value) -> Ordering) {
    if items.len() < 2 {
        return;
    }
    let mut right = items.split_off(items.len() / 2);
    merge_sort(items, compare);
    merge_sort(&mut right, compare);
    let left = std::mem::take(items);
    items.reserve(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        items.extend(next);
    }
}

/// Sorted copy. `comparator`, when given, is called as `cmp(a, b)` and a
/// negative result orders `a` first.
pub fn sort(array: &Value, comparator: &Value) -> Value {
    status::settle(|| {
        let mut items = arg_array(array, "sort", Kind::Object)?.clone();
        if comparator.is_null() || comparator.is_undefined() {
            merge_sort(&mut items, &mut default_order);
        } else if comparator.is_function() {
            merge_sort(&mut items, &mut |a, b| {
                let verdict = to_number_lossy(&closure::call(comparator, &[a.clone(), b.clone()]));
                verdict.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
            });
        } else {
            return Err(type_error(
                "sort",
                "comparator must be a function",
                Kind::Object,
            ));
        }
        Ok(Value::array(items))
    })
}

/// `range(start, end, step?)`: numbers from `start` toward `end`, exclusive.
pub fn range(start: &Value, end: &Value, step: &Value) -> Value {
    status::settle(|| {
        let from = start
            .as_number()
            .ok_or_else(|| type_error("range", "start must be a number", Kind::Object))?;
        let to = end
            .as_number()
            .ok_or_else(|| type_error("range", "end must be a number", Kind::Object))?;
        let step = if step.is_undefined() || step.is_null() {
            1.0
        } else {
            step.as_number()
                .ok_or_else(|| type_error("range", "step must be a number", Kind::Object))?
        };
        if step == 0.0 {
            return Err(Failure::error("(range) step cannot be 0", Value::null()));
        }
        let span = to - from;
        let count = if span != 0.0 && span.signum() == step.signum() {
            (span / step).ceil() as usize
        } else {
            0
        };
        Ok(Value::array(
            (0..count)
                .map(|i| Value::number(from + i as f64 * step))
                .collect(),
        ))
    })
}
