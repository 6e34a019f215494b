//! C-callable entry points used by generated native code.
//!
//! Values cross the boundary as `*const ValueCell`, produced by
//! [`Value::into_raw`]. Every pointer returned from this module is an owned
//! reference the caller must eventually hand to `flyux_release`. Pointer
//! arguments are borrowed: the callee takes its own reference when it keeps
//! one. A null pointer argument reads as `undefined`.
//!
//! Callers must only pass pointers obtained from this module (or null) and
//! must keep them alive for the duration of the call.

use std::{
    ffi::{CStr, c_char},
    ptr, slice,
};

use smallvec::SmallVec;

use crate::{
    logging,
    runtime::{
        arith, array_ops,
        builtins::{BUILTINS, get_builtin_by_index},
        closure::{self, CaptureMode, Closure, EntryPoint, ExternFn},
        coerce, json,
        kind::Kind,
        leak_detector, object_ops,
        object_map::ObjectMap,
        print,
        status::{self, Failure, StatusCode},
        value::{Value, ValueCell},
    },
};

type Args = SmallVec<[Value; 8]>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fresh handle to a borrowed cell; null reads as `undefined`.
unsafe fn borrow(ptr: *const ValueCell) -> Value {
    if ptr.is_null() {
        Value::undefined()
    } else {
        unsafe { Value::clone_from_raw(ptr) }
    }
}

unsafe fn borrow_all(ptrs: *const *const ValueCell, count: usize) -> Args {
    if ptrs.is_null() || count == 0 {
        return Args::new();
    }
    unsafe { slice::from_raw_parts(ptrs, count) }
        .iter()
        .map(|&ptr| unsafe { borrow(ptr) })
        .collect()
}

/// NUL-terminated UTF-8 key, or `None` for null / invalid input.
unsafe fn c_key<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn bad_key(op: &str, fallback: Value) -> Value {
    status::settle(|| {
        Err(Failure::type_error(
            format!("({}) Field name must be a string", op),
            fallback,
        ))
    })
}

fn give(value: Value) -> *const ValueCell {
    value.into_raw()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_runtime_init() {
    logging::init();
    log::debug!("runtime config: {:?}", crate::config::current());
}

/// Adds a reference and returns the same pointer.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_retain(value: *const ValueCell) -> *const ValueCell {
    if value.is_null() {
        return ptr::null();
    }
    give(unsafe { Value::clone_from_raw(value) })
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_release(value: *const ValueCell) {
    if !value.is_null() {
        drop(unsafe { Value::from_raw(value) });
    }
}

/// Cells currently alive on this thread, immortals excluded.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_live_values() -> usize {
    leak_detector::snapshot().live()
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_number(n: f64) -> *const ValueCell {
    give(Value::number(n))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_bool(b: i32) -> *const ValueCell {
    give(Value::bool(b != 0))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_null() -> *const ValueCell {
    give(Value::null())
}

/// Null remembering the declared kind tag; unknown tags give a plain null.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_null_typed(kind: i32) -> *const ValueCell {
    give(Value::null_typed(Kind::from_tag(kind).unwrap_or(Kind::Null)))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_undef() -> *const ValueCell {
    give(Value::undefined())
}

/// Wraps a string literal without copying it. The text must live for the
/// rest of the program; non-UTF-8 input is copied lossily instead.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_string_static(text: *const c_char) -> *const ValueCell {
    if text.is_null() {
        return give(Value::string(""));
    }
    let text: &'static CStr = unsafe { CStr::from_ptr(text) };
    match text.to_str() {
        Ok(s) => give(Value::static_str(s)),
        Err(_) => give(Value::string(text.to_string_lossy().into_owned())),
    }
}

/// Copies `len` bytes into a new string.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_string(bytes: *const u8, len: usize) -> *const ValueCell {
    if bytes.is_null() || len == 0 {
        return give(Value::string(""));
    }
    let bytes = unsafe { slice::from_raw_parts(bytes, len) };
    give(Value::string(String::from_utf8_lossy(bytes).into_owned()))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_array(
    items: *const *const ValueCell,
    count: usize,
) -> *const ValueCell {
    let items = unsafe { borrow_all(items, count) };
    give(Value::array(items.into_vec()))
}

/// Object from parallel key / value arrays. Later duplicates overwrite.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_object(
    keys: *const *const c_char,
    values: *const *const ValueCell,
    count: usize,
) -> *const ValueCell {
    let values = unsafe { borrow_all(values, count) };
    let mut map = ObjectMap::new();
    if !keys.is_null() {
        let keys = unsafe { slice::from_raw_parts(keys, values.len()) };
        for (&key, value) in keys.iter().zip(values) {
            match unsafe { c_key(key) } {
                Some(key) => {
                    map.insert(key, value);
                }
                None => log::warn!("flyux_box_object: skipping invalid key"),
            }
        }
    }
    give(Value::object(map))
}

/// Closure over a generated body. `flags` bit 0 selects capture by
/// reference, bit 1 marks a method that expects its receiver first.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_box_function(
    entry: ExternFn,
    param_count: usize,
    captured: *const *const ValueCell,
    captured_count: usize,
    flags: u32,
) -> *const ValueCell {
    let captured = unsafe { borrow_all(captured, captured_count) }.into_vec();
    let mode = if flags & 1 != 0 {
        CaptureMode::ByReference
    } else {
        CaptureMode::ByValue
    };
    let entry = EntryPoint::Extern(entry);
    let closure = if flags & 2 != 0 {
        Closure::method(entry, param_count, captured, mode)
    } else {
        Closure::new(entry, param_count, captured, mode)
    };
    give(Value::function(closure))
}

/// UTF-8 bytes of a string value, valid while the value is alive. Writes
/// the byte length to `len`; non-strings give null and length 0.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_string_data(value: *const ValueCell, len: *mut usize) -> *const u8 {
    let value = unsafe { borrow(value) };
    // The caller's reference keeps the text alive after `value` drops.
    let (data, size) = match value.as_text() {
        Some(text) => (text.as_str().as_ptr(), text.byte_len()),
        None => (ptr::null(), 0),
    };
    if !len.is_null() {
        unsafe { *len = size };
    }
    data
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_kind(value: *const ValueCell) -> i32 {
    unsafe { borrow(value) }.kind() as i32
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_len(value: *const ValueCell) -> *const ValueCell {
    give(array_ops::len(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_index(
    container: *const ValueCell,
    key: *const ValueCell,
) -> *const ValueCell {
    let (container, key) = unsafe { (borrow(container), borrow(key)) };
    give(array_ops::index(&container, &key))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_index_safe(
    container: *const ValueCell,
    key: *const ValueCell,
) -> *const ValueCell {
    let (container, key) = unsafe { (borrow(container), borrow(key)) };
    give(array_ops::index_safe(&container, &key))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_set_index(
    container: *const ValueCell,
    key: *const ValueCell,
    value: *const ValueCell,
) -> *const ValueCell {
    let (container, key, value) = unsafe { (borrow(container), borrow(key), borrow(value)) };
    give(array_ops::set_index(&container, &key, value))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_push(array: *const ValueCell, item: *const ValueCell) -> *const ValueCell {
    let (array, item) = unsafe { (borrow(array), borrow(item)) };
    give(array_ops::push(&array, &item))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_pop(array: *const ValueCell) -> *const ValueCell {
    give(array_ops::pop(&unsafe { borrow(array) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_slice(
    array: *const ValueCell,
    start: *const ValueCell,
    end: *const ValueCell,
) -> *const ValueCell {
    let (array, start, end) = unsafe { (borrow(array), borrow(start), borrow(end)) };
    give(array_ops::slice(&array, &start, &end))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_concat(left: *const ValueCell, right: *const ValueCell) -> *const ValueCell {
    let (left, right) = unsafe { (borrow(left), borrow(right)) };
    give(array_ops::concat(&left, &right))
}

/// `[...target, ...source]`; a non-array side contributes nothing.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_spread_array(
    target: *const ValueCell,
    source: *const ValueCell,
) -> *const ValueCell {
    let (target, source) = unsafe { (borrow(target), borrow(source)) };
    give(array_ops::spread_array(&target, &source))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_get_field(object: *const ValueCell, key: *const c_char) -> *const ValueCell {
    let object = unsafe { borrow(object) };
    give(match unsafe { c_key(key) } {
        Some(key) => object_ops::get_field(&object, key),
        None => bad_key("getField", Value::undefined()),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_get_field_safe(
    object: *const ValueCell,
    key: *const c_char,
) -> *const ValueCell {
    let object = unsafe { borrow(object) };
    give(match unsafe { c_key(key) } {
        Some(key) => object_ops::get_field_safe(&object, key),
        None => status::ok(Value::undefined()),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_set_field(
    object: *const ValueCell,
    key: *const c_char,
    value: *const ValueCell,
) -> *const ValueCell {
    let (object, value) = unsafe { (borrow(object), borrow(value)) };
    give(match unsafe { c_key(key) } {
        Some(key) => object_ops::set_field(&object, key, value),
        None => bad_key("setField", Value::undefined()),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_delete_field(
    object: *const ValueCell,
    key: *const c_char,
) -> *const ValueCell {
    let object = unsafe { borrow(object) };
    give(match unsafe { c_key(key) } {
        Some(key) => object_ops::delete_field(&object, key),
        None => bad_key("deleteField", Value::bool(false)),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_get_method(
    object: *const ValueCell,
    key: *const c_char,
) -> *const ValueCell {
    let object = unsafe { borrow(object) };
    give(match unsafe { c_key(key) } {
        Some(key) => object_ops::get_method(&object, key),
        None => bad_key("getField", Value::undefined()),
    })
}

/// Computed `object[key]` read for a call site.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_get_method_by_index(
    object: *const ValueCell,
    key: *const ValueCell,
) -> *const ValueCell {
    let (object, key) = unsafe { (borrow(object), borrow(key)) };
    give(object_ops::get_method_by_index(&object, &key))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_keys(object: *const ValueCell) -> *const ValueCell {
    give(object_ops::keys(&unsafe { borrow(object) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_merge(left: *const ValueCell, right: *const ValueCell) -> *const ValueCell {
    let (left, right) = unsafe { (borrow(left), borrow(right)) };
    give(object_ops::merge(&left, &right))
}

/// `{...target, ...source}`; a non-object side contributes nothing.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_spread_object(
    target: *const ValueCell,
    source: *const ValueCell,
) -> *const ValueCell {
    let (target, source) = unsafe { (borrow(target), borrow(source)) };
    give(object_ops::spread_object(&target, &source))
}

// ---------------------------------------------------------------------------
// Closures and builtins
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_bind_method(
    function: *const ValueCell,
    receiver: *const ValueCell,
) -> *const ValueCell {
    let (function, receiver) = unsafe { (borrow(function), borrow(receiver)) };
    give(closure::bind_receiver(&function, &receiver))
}

/// Points capture `slot` at the closure itself. Returns 1 on success.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_bind_self_capture(function: *const ValueCell, slot: usize) -> i32 {
    i32::from(closure::bind_self_capture(&unsafe { borrow(function) }, slot))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_call(
    function: *const ValueCell,
    args: *const *const ValueCell,
    count: usize,
) -> *const ValueCell {
    let function = unsafe { borrow(function) };
    let args = unsafe { borrow_all(args, count) };
    give(closure::call(&function, &args))
}

/// Table index of a builtin, or -1 when the name is unknown.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_builtin_index(name: *const c_char) -> isize {
    unsafe { c_key(name) }
        .and_then(|name| BUILTINS.iter().position(|b| b.name == name))
        .map_or(-1, |index| index as isize)
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_call_builtin(
    index: usize,
    args: *const *const ValueCell,
    count: usize,
) -> *const ValueCell {
    let args = unsafe { borrow_all(args, count) };
    match get_builtin_by_index(index) {
        Some(builtin) => give(builtin.call(&args)),
        None => status::fatal(&format!("unknown builtin index {}", index)),
    }
}

// ---------------------------------------------------------------------------
// Operators and coercion
// ---------------------------------------------------------------------------

macro_rules! binary_op {
    ($name:ident, $op:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn $name(a: *const ValueCell, b: *const ValueCell) -> *const ValueCell {
            let (a, b) = unsafe { (borrow(a), borrow(b)) };
            give($op(&a, &b))
        }
    };
}

binary_op!(flyux_add, arith::add);
binary_op!(flyux_sub, arith::sub);
binary_op!(flyux_mul, arith::mul);
binary_op!(flyux_div, arith::div);
binary_op!(flyux_mod, arith::modulo);
binary_op!(flyux_lt, arith::lt);
binary_op!(flyux_le, arith::le);
binary_op!(flyux_gt, arith::gt);
binary_op!(flyux_ge, arith::ge);
binary_op!(flyux_equals, arith::equals);
binary_op!(flyux_not_equals, arith::not_equals);

#[unsafe(no_mangle)]
pub extern "C" fn flyux_neg(value: *const ValueCell) -> *const ValueCell {
    give(arith::neg(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_truthy(value: *const ValueCell) -> i32 {
    i32::from(coerce::is_truthy(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_typeof(value: *const ValueCell) -> *const ValueCell {
    give(coerce::type_of(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_to_num(value: *const ValueCell) -> *const ValueCell {
    give(coerce::to_num(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_to_str(value: *const ValueCell) -> *const ValueCell {
    give(coerce::to_str(&unsafe { borrow(value) }))
}

// ---------------------------------------------------------------------------
// Serialization and output
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_to_json(value: *const ValueCell) -> *const ValueCell {
    give(json::encode(&unsafe { borrow(value) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_parse_json(text: *const ValueCell) -> *const ValueCell {
    give(json::decode(&unsafe { borrow(text) }))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_print(value: *const ValueCell) {
    print::print(&unsafe { borrow(value) });
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_println(value: *const ValueCell) {
    print::println(&unsafe { borrow(value) });
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_printf(
    template: *const ValueCell,
    args: *const *const ValueCell,
    count: usize,
) -> *const ValueCell {
    let template = unsafe { borrow(template) };
    let args = unsafe { borrow_all(args, count) };
    give(print::printf(&template, &args))
}

// ---------------------------------------------------------------------------
// Status channel
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn flyux_status_code() -> i32 {
    status::code().as_i32()
}

/// Current status message as a string value.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_status_message() -> *const ValueCell {
    give(Value::string(status::message()))
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_status_clear() {
    status::clear();
}

/// Publishes a failure from generated code.
#[unsafe(no_mangle)]
pub extern "C" fn flyux_status_set(code: i32, message: *const c_char) {
    let code = match code {
        0 => StatusCode::Ok,
        2 => StatusCode::EndOfInput,
        3 => StatusCode::TypeError,
        4 => StatusCode::OutOfBounds,
        5 => StatusCode::IoError,
        6 => StatusCode::MathError,
        _ => StatusCode::Error,
    };
    let message = unsafe { c_key(message) }.unwrap_or_default().to_string();
    status::set(code, message);
}

#[unsafe(no_mangle)]
pub extern "C" fn flyux_fatal(message: *const c_char) -> ! {
    let message = unsafe { c_key(message) }.unwrap_or("unknown error");
    status::fatal(message)
}
