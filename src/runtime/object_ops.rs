//! Field access on objects. Extension objects answer their virtual
//! properties first; plain objects go to their entry storage.

use std::collections::HashMap;

use crate::runtime::{
    array_ops, closure,
    kind::Kind,
    object_map::ObjectMap,
    status::{self, Failure, OpResult, StatusCode},
    value::{Payload, Value, ValueCell},
};

fn not_an_object(op: &str, fallback: Value) -> Failure {
    Failure::type_error(format!("({}) Not an object", op), fallback)
}

fn read_field(object: &Value, key: &str) -> OpResult {
    let found = match object.payload() {
        Payload::Ext(ext) => ext.borrow().virtual_property(key),
        Payload::Object(map) => map.borrow().get(key).cloned(),
        _ => return Err(not_an_object("getField", Value::undefined())),
    };
    found.ok_or_else(|| Failure::type_error("(getField) Field not found", Value::undefined()))
}

pub fn get_field(object: &Value, key: &str) -> Value {
    status::settle(|| read_field(object, key))
}

/// `get_field` with a runtime key, as generated code passes it.
pub fn get_field_by(object: &Value, key: &Value) -> Value {
    status::settle(|| {
        let name = key.as_str().ok_or_else(|| {
            Failure::type_error("(getField) Field name must be a string", Value::undefined())
        })?;
        read_field(object, name)
    })
}

/// Optional chaining: any miss is `undefined` and the channel stays `Ok`.
pub fn get_field_safe(object: &Value, key: &str) -> Value {
    status::set_ok();
    read_field(object, key).unwrap_or_else(|_| Value::undefined())
}

/// Writes `key` in place. Assigning `undefined` removes the key.
pub fn set_field(object: &Value, key: &str, value: Value) -> Value {
    status::settle(|| {
        let Some(mut map) = object.as_object_mut() else {
            return Err(not_an_object("setField", Value::undefined()));
        };
        let previous = if value.is_undefined() {
            map.remove(key)
        } else {
            map.insert(key, value.clone())
        };
        drop(map);
        drop(previous);
        Ok(value)
    })
}

pub fn delete_field(object: &Value, key: &str) -> Value {
    status::settle(|| {
        let Some(mut map) = object.as_object_mut() else {
            return Err(not_an_object("deleteField", Value::bool(false)));
        };
        let removed = map.remove(key);
        drop(map);
        Ok(Value::bool(removed.is_some()))
    })
}

pub fn has_field(object: &Value, key: &str) -> Value {
    let present = match object.payload() {
        Payload::Ext(ext) => ext.borrow().virtual_property(key).is_some(),
        Payload::Object(map) => map.borrow().contains_key(key),
        _ => false,
    };
    status::ok(Value::bool(present))
}

fn collect_entries<T>(
    object: &Value,
    op: &str,
    project: impl Fn(&str, &Value) -> T,
) -> Result<Vec<T>, Failure> {
    let map = object.as_object().ok_or_else(|| {
        Failure::typed(
            StatusCode::TypeError,
            format!("({}) requires object", op),
            Kind::Object,
        )
    })?;
    Ok(map.iter().map(|(key, value)| project(key, value)).collect())
}

pub fn keys(object: &Value) -> Value {
    status::settle(|| {
        collect_entries(object, "keys", |key, _| Value::string(key)).map(Value::array)
    })
}

pub fn values(object: &Value) -> Value {
    status::settle(|| {
        collect_entries(object, "values", |_, value| value.clone()).map(Value::array)
    })
}

/// `[key, value]` pairs in insertion order.
pub fn entries(object: &Value) -> Value {
    status::settle(|| {
        collect_entries(object, "entries", |key, value| {
            Value::array(vec![Value::string(key), value.clone()])
        })
        .map(Value::array)
    })
}

/// Spread: a new object with the entries of `left` then `right`; on a shared
/// key the right-hand value wins. Null or undefined sides contribute nothing.
pub fn merge(left: &Value, right: &Value) -> Value {
    status::settle(|| {
        let mut merged = ObjectMap::new();
        for side in [left, right] {
            if side.is_null() || side.is_undefined() {
                continue;
            }
            let map = side.as_object().ok_or_else(|| {
                Failure::typed(
                    StatusCode::TypeError,
                    "(merge) requires object",
                    Kind::Object,
                )
            })?;
            for (key, value) in map.iter() {
                merged.insert(key, value.clone());
            }
        }
        Ok(Value::object(merged))
    })
}

/// `{...target, ...source}`. Never fails: when `source` is not a plain
/// object the result is a shallow copy of `target`, and when `target` is
/// not one it is a shallow copy of `source`.
pub fn spread_object(target: &Value, source: &Value) -> Value {
    let spread = match (target.as_object(), source.as_object()) {
        (Some(left), Some(right)) => {
            let mut merged = left.clone();
            for (key, value) in right.iter() {
                merged.insert(key, value.clone());
            }
            Value::object(merged)
        }
        (Some(_), None) => shallow_clone(target),
        (None, _) => shallow_clone(source),
    };
    status::ok(spread)
}

/// Field read for a call site: functions come back bound to `object`.
pub fn get_method(object: &Value, key: &str) -> Value {
    let field = get_field(object, key);
    if field.is_function() {
        closure::bind_receiver(&field, object)
    } else {
        field
    }
}

/// Computed `object[key]` read for a call site. Same lookup and status as
/// `array_ops::index`; a function result comes back bound to `object`.
pub fn get_method_by_index(object: &Value, key: &Value) -> Value {
    let item = array_ops::index(object, key);
    if item.is_function() {
        closure::bind_receiver(&item, object)
    } else {
        item
    }
}

/// One-level copy: a new container sharing the same elements.
pub fn shallow_clone(value: &Value) -> Value {
    match value.payload() {
        Payload::Array(items) => Value::array(items.borrow().clone()),
        Payload::Object(map) => Value::object(map.borrow().clone()),
        Payload::Ext(ext) => Value::extension(ext.borrow().clone()),
        _ => value.clone(),
    }
}

/// Recursive copy of arrays and objects. Shared and cyclic structure is
/// preserved: a node reached twice maps to the same copy.
pub fn deep_clone(value: &Value) -> Value {
    let mut copies = HashMap::new();
    deep_clone_into(value, &mut copies)
}

fn deep_clone_into(value: &Value, copies: &mut HashMap<*const ValueCell, Value>) -> Value {
    if let Some(copy) = copies.get(&value.as_ptr()) {
        return copy.clone();
    }
    match value.payload() {
        Payload::Array(items) => {
            let copy = Value::array(Vec::new());
            copies.insert(value.as_ptr(), copy.clone());
            let source = items.borrow().clone();
            let cloned: Vec<Value> = source
                .iter()
                .map(|item| deep_clone_into(item, copies))
                .collect();
            if let Some(mut target) = copy.as_array_mut() {
                *target = cloned;
            }
            copy
        }
        Payload::Object(map) => {
            let copy = Value::empty_object();
            copies.insert(value.as_ptr(), copy.clone());
            let source = map.borrow().clone();
            for (key, item) in source.iter() {
                let cloned = deep_clone_into(item, copies);
                if let Some(mut target) = copy.as_object_mut() {
                    target.insert(key, cloned);
                }
            }
            copy
        }
        Payload::Ext(ext) => Value::extension(ext.borrow().clone()),
        _ => value.clone(),
    }
}
