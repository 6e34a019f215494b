use std::{io::Write, time::Duration};

use crate::runtime::{
    coerce::is_truthy,
    helpers::{arg_number, arg_str},
    kind::Kind,
    object_map::ObjectMap,
    status::{self, Failure},
    value::Value,
};

/// Milliseconds since the Unix epoch, with sub-millisecond precision.
pub fn now() -> Value {
    let micros = chrono::Utc::now().timestamp_micros();
    status::ok(Value::number(micros as f64 / 1000.0))
}

/// Whole seconds since the Unix epoch.
pub fn time() -> Value {
    status::ok(Value::number(chrono::Utc::now().timestamp() as f64))
}

/// Local time as `YYYY-MM-DD HH:MM:SS`.
pub fn date() -> Value {
    let text = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    status::ok(Value::string(text))
}

pub fn sleep(seconds: &Value) -> Value {
    status::settle(|| {
        let seconds = arg_number(seconds, "sleep", "argument", Kind::Null)?;
        if seconds < 0.0 || seconds.is_nan() {
            return Err(Failure::type_error(
                "(sleep) argument must be non-negative",
                Value::null(),
            ));
        }
        std::thread::sleep(Duration::from_secs_f64(seconds.min(u32::MAX as f64)));
        Ok(Value::null())
    })
}

/// Terminates the process. A non-number code exits with 0.
pub fn exit(code: &Value) -> ! {
    let code = code.as_number().map_or(0, |n| n as i32);
    log::debug!("exit({})", code);
    if let Err(err) = std::io::stdout().flush() {
        log::debug!("stdout flush before exit failed: {}", err);
    }
    std::process::exit(code)
}

/// Missing variables are a typed null string, not an error.
pub fn get_env(name: &Value) -> Value {
    status::settle(|| {
        let name = arg_str(name, "getEnv", "argument", Kind::String)?;
        Ok(std::env::var(name)
            .map(Value::string)
            .unwrap_or_else(|_| Value::null_typed(Kind::String)))
    })
}

pub fn set_env(name: &Value, value: &Value) -> Value {
    status::settle(|| {
        let name = name.as_str().ok_or_else(|| {
            Failure::type_error("(setEnv) first argument must be a string", Value::bool(false))
        })?;
        let value = value.as_str().ok_or_else(|| {
            Failure::type_error("(setEnv) second argument must be a string", Value::bool(false))
        })?;
        if name.is_empty() || name.contains(['=', '\0']) || value.contains('\0') {
            return Err(Failure::io(
                "(setEnv) failed to set environment variable",
                Value::bool(false),
            ));
        }
        // SAFETY: the runtime is single-threaded; no other thread reads the
        // environment concurrently.
        unsafe { std::env::set_var(name, value) };
        Ok(Value::bool(true))
    })
}

/// All environment variables as an object.
pub fn environment() -> Value {
    let map: ObjectMap = std::env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                Value::string(value.to_string_lossy().into_owned()),
            )
        })
        .collect();
    status::ok(Value::object(map))
}

/// Aborts through the fatal path when `condition` is falsy.
pub fn assert(condition: &Value, message: &Value) -> Value {
    if !is_truthy(condition) {
        match message.as_str() {
            Some(text) => status::fatal(&format!("Assertion failed: {}", text)),
            None => status::fatal("Assertion failed"),
        }
    }
    Value::bool(true)
}

// ---------------------------------------------------------------------------
// Status inspection used by try/catch
// ---------------------------------------------------------------------------

pub fn is_ok() -> Value {
    Value::bool(status::is_ok())
}

pub fn last_error() -> Value {
    Value::string(status::message())
}

pub fn last_status() -> Value {
    Value::number(f64::from(status::code().as_i32()))
}

pub fn clear_error() -> Value {
    status::clear();
    Value::null()
}

