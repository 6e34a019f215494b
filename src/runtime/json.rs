//! `toJSON` / `parseJSON`.
//!
//! Encoding is hand-written so it can mark cycles and cut off deep graphs
//! instead of failing. Decoding goes through `serde_json` (with
//! `preserve_order`, so key order survives) and converts the tree into
//! runtime values. Both directions share the `json_max_depth` limit.

use serde::Deserialize;
use serde_json::error::Category;

use crate::{
    config,
    runtime::{
        kind::Kind,
        number_format::format_g,
        object_map::ObjectMap,
        status::{self, Failure, StatusCode},
        value::{Payload, Value, ValueCell},
    },
};

pub const CIRCULAR_MARKER: &str = "[Circular]";
pub const DEPTH_MARKER: &str = "[Max Depth Exceeded]";

pub fn encode(value: &Value) -> Value {
    status::ok(Value::string(to_json_string(value)))
}

pub fn to_json_string(value: &Value) -> String {
    let mut encoder = Encoder {
        out: String::new(),
        stack: Vec::new(),
        max_depth: config::with(|c| c.json_max_depth),
    };
    encoder.write(value, 0);
    encoder.out
}

struct Encoder {
    out: String,
    /// Containers currently being written, outermost first.
    stack: Vec<*const ValueCell>,
    max_depth: usize,
}

impl Encoder {
    fn write(&mut self, value: &Value, depth: usize) {
        if depth >= self.max_depth {
            write_quoted(&mut self.out, DEPTH_MARKER);
            return;
        }
        match value.payload() {
            Payload::Number(n) if n.is_finite() => self.out.push_str(&format_g(*n, 16)),
            Payload::Number(_) | Payload::Null | Payload::Undefined | Payload::Function(_) => {
                self.out.push_str("null")
            }
            Payload::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Payload::Text(text) => write_quoted(&mut self.out, text.as_str()),
            Payload::Ext(ext) => write_quoted(&mut self.out, ext.borrow().type_name()),
            Payload::Cell(inner) => {
                let inner = inner.borrow().clone();
                self.write(&inner, depth);
            }
            Payload::Array(items) => {
                if self.enter(value) {
                    self.out.push('[');
                    for (i, item) in items.borrow().iter().enumerate() {
                        if i > 0 {
                            self.out.push(',');
                        }
                        self.write(item, depth + 1);
                    }
                    self.out.push(']');
                    self.stack.pop();
                }
            }
            Payload::Object(map) => {
                if self.enter(value) {
                    self.out.push('{');
                    for (i, (key, item)) in map.borrow().iter().enumerate() {
                        if i > 0 {
                            self.out.push(',');
                        }
                        write_quoted(&mut self.out, key);
                        self.out.push(':');
                        self.write(item, depth + 1);
                    }
                    self.out.push('}');
                    self.stack.pop();
                }
            }
        }
    }

    /// Pushes `value` onto the visit stack, or writes the circular marker
    /// and returns false when it is already there.
    fn enter(&mut self, value: &Value) -> bool {
        let ptr = value.as_ptr();
        if self.stack.contains(&ptr) {
            write_quoted(&mut self.out, CIRCULAR_MARKER);
            return false;
        }
        self.stack.push(ptr);
        true
    }
}

fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

pub fn decode(text: &Value) -> Value {
    status::settle(|| {
        let source = text.as_str().ok_or_else(|| {
            Failure::typed(
                StatusCode::TypeError,
                "(parseJSON) argument must be a string",
                Kind::Object,
            )
        })?;
        if nesting_depth(source) > config::with(|c| c.json_max_depth) {
            return Err(Failure::typed(
                StatusCode::TypeError,
                "(parseJSON) nesting too deep",
                Kind::Object,
            ));
        }
        // Depth is bounded above, so serde_json's own 128-level cap can go.
        let mut deserializer = serde_json::Deserializer::from_str(source);
        deserializer.disable_recursion_limit();
        let parsed = serde_json::Value::deserialize(&mut deserializer)
            .and_then(|parsed| deserializer.end().map(|()| parsed))
            .map_err(|err| {
                log::debug!("parseJSON rejected input: {}", err);
                let message = match err.classify() {
                    Category::Syntax | Category::Eof => "(parseJSON) invalid JSON format",
                    _ => "(parseJSON) parse error",
                };
                Failure::typed(StatusCode::TypeError, message, Kind::Object)
            })?;
        Ok(from_json(&parsed))
    })
}

/// Deepest bracket nesting in `source`, ignoring brackets inside strings.
fn nesting_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;
    for byte in source.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Converts a parsed document into runtime values.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::null(),
        serde_json::Value::Bool(b) => Value::bool(*b),
        serde_json::Value::Number(n) => Value::number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::string(s.as_str()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(entries) => Value::object(
            entries
                .iter()
                .map(|(key, value)| (key.as_str(), from_json(value)))
                .collect::<ObjectMap>(),
        ),
    }
}
