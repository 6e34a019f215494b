use crate::runtime::{
    array_ops,
    coerce::display_string,
    helpers::char_to_byte,
    kind::Kind,
    status::{self, Failure, StatusCode},
    value::Value,
};

fn requires(op: &str, what: &str, fallback: Value) -> Failure {
    Failure::type_error(format!("({}) {}", op, what), fallback)
}

/// `charAt(s, i)` on text, or element access on arrays.
pub fn char_at(target: &Value, index: &Value) -> Value {
    status::settle(|| {
        if let Some(items) = target.as_array() {
            let i = index
                .as_number()
                .ok_or_else(|| requires("charAt", "requires numeric index", Value::null()))?;
            return (i >= 0.0)
                .then(|| items.get(i as usize).cloned())
                .flatten()
                .ok_or_else(|| {
                    Failure::out_of_bounds("(charAt) array index out of range", Value::null())
                });
        }
        let text = target.as_str().ok_or_else(|| {
            requires(
                "charAt",
                "requires string or array",
                Value::null_typed(Kind::String),
            )
        })?;
        let i = index.as_number().ok_or_else(|| {
            requires(
                "charAt",
                "requires numeric index",
                Value::null_typed(Kind::String),
            )
        })?;
        (i >= 0.0)
            .then(|| text.chars().nth(i as usize))
            .flatten()
            .map(|ch| Value::string(ch.to_string()))
            .ok_or_else(|| {
                Failure::typed(
                    StatusCode::OutOfBounds,
                    "(charAt) index out of range",
                    Kind::String,
                )
            })
    })
}

/// `substr(s, start, length?)` in characters. Out-of-range starts give "";
/// the length is clamped to what remains.
pub fn substr(text: &Value, start: &Value, length: &Value) -> Value {
    status::settle(|| {
        let s = text
            .as_str()
            .ok_or_else(|| requires("substr", "requires string", Value::string("")))?;
        let start = start
            .as_number()
            .ok_or_else(|| requires("substr", "requires numeric start", Value::string("")))?
            as i64;
        let count = s.chars().count() as i64;
        if start < 0 || start >= count {
            return Ok(Value::string(""));
        }
        let length = length
            .as_number()
            .map_or(count - start, |n| n as i64)
            .clamp(0, count - start);
        let from = char_to_byte(s, start as usize).unwrap_or(s.len());
        let to = char_to_byte(s, (start + length) as usize).unwrap_or(s.len());
        Ok(Value::string(&s[from..to]))
    })
}

/// Character position of `needle` in text, or element position in an array.
pub fn index_of(target: &Value, needle: &Value) -> Value {
    if target.as_array().is_some() {
        return array_ops::index_of(target, needle);
    }
    status::settle(|| {
        let (Some(haystack), Some(needle)) = (target.as_str(), needle.as_str()) else {
            return Err(requires(
                "indexOf",
                "requires two strings or array and value",
                Value::number(-1.0),
            ));
        };
        let found = haystack
            .find(needle)
            .map_or(-1.0, |byte| haystack[..byte].chars().count() as f64);
        Ok(Value::number(found))
    })
}

/// Replaces the first occurrence only.
pub fn replace(text: &Value, from: &Value, to: &Value) -> Value {
    status::settle(|| {
        let (Some(s), Some(from), Some(to)) = (text.as_str(), from.as_str(), to.as_str()) else {
            return Err(requires("replace", "requires three strings", Value::string("")));
        };
        if from.is_empty() {
            return Ok(Value::string(s));
        }
        Ok(Value::string(s.replacen(from, to, 1)))
    })
}

/// `split(s, delim?)`; the delimiter defaults to a space and an empty one
/// splits into characters.
pub fn split(text: &Value, delimiter: &Value) -> Value {
    status::settle(|| {
        let s = text.as_str().ok_or_else(|| {
            requires("split", "requires string", Value::null_typed(Kind::Object))
        })?;
        let delimiter = delimiter.as_str().unwrap_or(" ");
        let parts: Vec<Value> = if delimiter.is_empty() {
            s.chars().map(|ch| Value::string(ch.to_string())).collect()
        } else {
            s.split(delimiter).map(Value::string).collect()
        };
        Ok(Value::array(parts))
    })
}

/// `join(a, sep?)`; elements go through `toStr`, the separator defaults to
/// a comma.
pub fn join(array: &Value, separator: &Value) -> Value {
    status::settle(|| {
        let items = array
            .as_array()
            .ok_or_else(|| requires("join", "requires array", Value::string("")))?;
        let separator = separator.as_str().unwrap_or(",");
        let parts: Vec<String> = items.iter().map(display_string).collect();
        Ok(Value::string(parts.join(separator)))
    })
}

fn map_text(op: &str, text: &Value, transform: impl FnOnce(&str) -> String) -> Value {
    status::settle(|| {
        let s = text
            .as_str()
            .ok_or_else(|| requires(op, "requires string", Value::string("")))?;
        Ok(Value::string(transform(s)))
    })
}

pub fn trim(text: &Value) -> Value {
    map_text("trim", text, |s| s.trim().to_string())
}

pub fn upper(text: &Value) -> Value {
    map_text("upper", text, str::to_uppercase)
}

pub fn lower(text: &Value) -> Value {
    map_text("lower", text, str::to_lowercase)
}

fn test_text(op: &str, text: &Value, other: &Value, test: impl FnOnce(&str, &str) -> bool) -> Value {
    status::settle(|| {
        let s = text
            .as_str()
            .ok_or_else(|| requires(op, "first argument must be a string", Value::bool(false)))?;
        let other = other
            .as_str()
            .ok_or_else(|| requires(op, "second argument must be a string", Value::bool(false)))?;
        Ok(Value::bool(test(s, other)))
    })
}

pub fn starts_with(text: &Value, prefix: &Value) -> Value {
    test_text("startsWith", text, prefix, |s, p| s.starts_with(p))
}

pub fn ends_with(text: &Value, suffix: &Value) -> Value {
    test_text("endsWith", text, suffix, |s, p| s.ends_with(p))
}

pub fn contains(text: &Value, part: &Value) -> Value {
    test_text("contains", text, part, |s, p| s.contains(p))
}
