//! Builtin function table. Generated code calls builtins by name or table
//! index; every entry takes its arguments as a slice and reads missing ones
//! as `undefined`.

use crate::runtime::{
    array_ops,
    builtin_function::BuiltinFunction,
    coerce, ext, json, object_ops, print,
    status::{self, Failure},
    value::Value,
};

pub mod fs_ops;
mod helpers;
pub mod io_ops;
pub mod math_ops;
pub mod string_ops;
pub mod sys_ops;
pub mod type_check;

use helpers::{arg, rest};

macro_rules! builtin {
    ($name:literal, $arity:literal, $func:expr) => {
        BuiltinFunction {
            name: $name,
            arity: $arity,
            func: $func,
        }
    };
}

/// Runs `op` with a string key, or fails with `(op) key must be a string`.
fn with_key(op: &str, key: &Value, fallback: Value, f: impl FnOnce(&str) -> Value) -> Value {
    match key.as_str() {
        Some(key) => f(key),
        None => status::settle(|| {
            Err(Failure::type_error(
                format!("({}) key must be a string", op),
                fallback,
            ))
        }),
    }
}

fn builtin_print(args: &[Value]) -> Value {
    print::print_values(args, false);
    status::ok(Value::undefined())
}

fn builtin_println(args: &[Value]) -> Value {
    print::print_values(args, true);
    status::ok(Value::undefined())
}

fn builtin_round(args: &[Value]) -> Value {
    if args.len() >= 2 {
        math_ops::round_to(&args[0], &args[1])
    } else {
        math_ops::round(&arg(args, 0))
    }
}

fn builtin_has_field(args: &[Value]) -> Value {
    with_key("hasField", &arg(args, 1), Value::bool(false), |key| {
        object_ops::has_field(&arg(args, 0), key)
    })
}

fn builtin_delete_field(args: &[Value]) -> Value {
    with_key("deleteField", &arg(args, 1), Value::bool(false), |key| {
        object_ops::delete_field(&arg(args, 0), key)
    })
}

/// All builtins in order (index matters for `get_builtin_by_index`).
pub static BUILTINS: &[BuiltinFunction] = &[
    // io
    builtin!("print", 0, builtin_print),
    builtin!("println", 0, builtin_println),
    builtin!("printf", 1, |args| print::printf(&arg(args, 0), rest(args, 1))),
    builtin!("input", 1, |args| io_ops::input(&arg(args, 0))),
    // conversion and inspection
    builtin!("len", 1, |args| array_ops::len(&arg(args, 0))),
    builtin!("typeOf", 1, |args| coerce::type_of(&arg(args, 0))),
    builtin!("toNum", 1, |args| coerce::to_num(&arg(args, 0))),
    builtin!("toStr", 1, |args| coerce::to_str(&arg(args, 0))),
    builtin!("toBl", 1, |args| coerce::to_bl(&arg(args, 0))),
    builtin!("toInt", 1, |args| coerce::to_int(&arg(args, 0))),
    builtin!("isNum", 1, |args| type_check::is_num(&arg(args, 0))),
    builtin!("isStr", 1, |args| type_check::is_str(&arg(args, 0))),
    builtin!("isBl", 1, |args| type_check::is_bl(&arg(args, 0))),
    builtin!("isArr", 1, |args| type_check::is_arr(&arg(args, 0))),
    builtin!("isObj", 1, |args| type_check::is_obj(&arg(args, 0))),
    builtin!("isNull", 1, |args| type_check::is_null(&arg(args, 0))),
    builtin!("isUndef", 1, |args| type_check::is_undef(&arg(args, 0))),
    builtin!("isFunc", 1, |args| type_check::is_func(&arg(args, 0))),
    // arrays
    builtin!("push", 2, |args| array_ops::push(&arg(args, 0), &arg(args, 1))),
    builtin!("pop", 1, |args| array_ops::pop(&arg(args, 0))),
    builtin!("shift", 1, |args| array_ops::shift(&arg(args, 0))),
    builtin!("unshift", 2, |args| array_ops::unshift(&arg(args, 0), &arg(args, 1))),
    builtin!("slice", 3, |args| {
        array_ops::slice(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    builtin!("concat", 2, |args| array_ops::concat(&arg(args, 0), &arg(args, 1))),
    builtin!("reverse", 1, |args| array_ops::reverse(&arg(args, 0))),
    builtin!("indexOf", 2, |args| string_ops::index_of(&arg(args, 0), &arg(args, 1))),
    builtin!("includes", 2, |args| array_ops::includes(&arg(args, 0), &arg(args, 1))),
    builtin!("sort", 2, |args| array_ops::sort(&arg(args, 0), &arg(args, 1))),
    builtin!("range", 3, |args| {
        array_ops::range(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    // strings
    builtin!("charAt", 2, |args| string_ops::char_at(&arg(args, 0), &arg(args, 1))),
    builtin!("substr", 3, |args| {
        string_ops::substr(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    builtin!("replace", 3, |args| {
        string_ops::replace(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    builtin!("split", 2, |args| string_ops::split(&arg(args, 0), &arg(args, 1))),
    builtin!("join", 2, |args| string_ops::join(&arg(args, 0), &arg(args, 1))),
    builtin!("trim", 1, |args| string_ops::trim(&arg(args, 0))),
    builtin!("upper", 1, |args| string_ops::upper(&arg(args, 0))),
    builtin!("lower", 1, |args| string_ops::lower(&arg(args, 0))),
    builtin!("startsWith", 2, |args| {
        string_ops::starts_with(&arg(args, 0), &arg(args, 1))
    }),
    builtin!("endsWith", 2, |args| string_ops::ends_with(&arg(args, 0), &arg(args, 1))),
    builtin!("contains", 2, |args| string_ops::contains(&arg(args, 0), &arg(args, 1))),
    // objects
    builtin!("keys", 1, |args| object_ops::keys(&arg(args, 0))),
    builtin!("values", 1, |args| object_ops::values(&arg(args, 0))),
    builtin!("entries", 1, |args| object_ops::entries(&arg(args, 0))),
    builtin!("hasField", 2, builtin_has_field),
    builtin!("deleteField", 2, builtin_delete_field),
    builtin!("merge", 2, |args| object_ops::merge(&arg(args, 0), &arg(args, 1))),
    builtin!("clone", 1, |args| object_ops::shallow_clone(&arg(args, 0))),
    builtin!("deepClone", 1, |args| object_ops::deep_clone(&arg(args, 0))),
    builtin!("toJSON", 1, |args| json::encode(&arg(args, 0))),
    builtin!("parseJSON", 1, |args| json::decode(&arg(args, 0))),
    // math
    builtin!("abs", 1, |args| math_ops::abs(&arg(args, 0))),
    builtin!("floor", 1, |args| math_ops::floor(&arg(args, 0))),
    builtin!("ceil", 1, |args| math_ops::ceil(&arg(args, 0))),
    builtin!("round", 2, builtin_round),
    builtin!("sqrt", 1, |args| math_ops::sqrt(&arg(args, 0))),
    builtin!("pow", 2, |args| math_ops::pow(&arg(args, 0), &arg(args, 1))),
    builtin!("min", 2, |args| math_ops::min(&arg(args, 0), &arg(args, 1))),
    builtin!("max", 2, |args| math_ops::max(&arg(args, 0), &arg(args, 1))),
    builtin!("clamp", 3, |args| {
        math_ops::clamp(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    builtin!("isNaN", 1, |args| math_ops::is_nan(&arg(args, 0))),
    builtin!("isFinite", 1, |args| math_ops::is_finite(&arg(args, 0))),
    builtin!("random", 0, |_| math_ops::random()),
    // system
    builtin!("now", 0, |_| sys_ops::now()),
    builtin!("time", 0, |_| sys_ops::time()),
    builtin!("date", 0, |_| sys_ops::date()),
    builtin!("sleep", 1, |args| sys_ops::sleep(&arg(args, 0))),
    builtin!("exit", 1, |args| sys_ops::exit(&arg(args, 0))),
    builtin!("getEnv", 1, |args| sys_ops::get_env(&arg(args, 0))),
    builtin!("setEnv", 2, |args| sys_ops::set_env(&arg(args, 0), &arg(args, 1))),
    builtin!("environment", 0, |_| sys_ops::environment()),
    builtin!("assert", 2, |args| sys_ops::assert(&arg(args, 0), &arg(args, 1))),
    builtin!("isOk", 0, |_| sys_ops::is_ok()),
    builtin!("lastError", 0, |_| sys_ops::last_error()),
    builtin!("lastStatus", 0, |_| sys_ops::last_status()),
    builtin!("clearError", 0, |_| sys_ops::clear_error()),
    builtin!("makeError", 3, |args| {
        ext::make_error(&arg(args, 0), &arg(args, 1), &arg(args, 2))
    }),
    builtin!("errorObject", 0, |_| ext::last_error()),
    // files
    builtin!("readFile", 1, |args| fs_ops::read_file(&arg(args, 0))),
    builtin!("writeFile", 2, |args| fs_ops::write_file(&arg(args, 0), &arg(args, 1))),
    builtin!("appendFile", 2, |args| fs_ops::append_file(&arg(args, 0), &arg(args, 1))),
    builtin!("fileExists", 1, |args| fs_ops::file_exists(&arg(args, 0))),
    builtin!("dirExists", 1, |args| fs_ops::dir_exists(&arg(args, 0))),
    builtin!("deleteFile", 1, |args| fs_ops::delete_file(&arg(args, 0))),
    builtin!("getFileSize", 1, |args| fs_ops::get_file_size(&arg(args, 0))),
    builtin!("readBytes", 1, |args| fs_ops::read_bytes(&arg(args, 0))),
    builtin!("writeBytes", 2, |args| fs_ops::write_bytes(&arg(args, 0), &arg(args, 1))),
    builtin!("readLines", 1, |args| fs_ops::read_lines(&arg(args, 0))),
    builtin!("renameFile", 2, |args| fs_ops::rename_file(&arg(args, 0), &arg(args, 1))),
    builtin!("copyFile", 2, |args| fs_ops::copy_file(&arg(args, 0), &arg(args, 1))),
    builtin!("createDir", 1, |args| fs_ops::create_dir(&arg(args, 0))),
    builtin!("removeDir", 1, |args| fs_ops::remove_dir(&arg(args, 0))),
    builtin!("listDir", 1, |args| fs_ops::list_dir(&arg(args, 0))),
    builtin!("openFile", 2, |args| fs_ops::open_file(&arg(args, 0), &arg(args, 1))),
    builtin!("closeFile", 1, |args| fs_ops::close_file(&arg(args, 0))),
];

pub fn get_builtin(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn get_builtin_by_index(index: usize) -> Option<&'static BuiltinFunction> {
    BUILTINS.get(index)
}

/// Wraps a builtin as a first-class function value with no captures.
pub fn builtin_value(name: &str) -> Option<Value> {
    get_builtin(name).map(|builtin| Value::native_fn(builtin.func, builtin.arity, Vec::new()))
}

#[cfg(test)]
mod helpers_test;
