use std::ffi::CString;

use flyux::abi::*;
use flyux::runtime::{
    kind::Kind,
    status::StatusCode,
    value::{Value, ValueCell},
};

fn take(ptr: *const ValueCell) -> Value {
    assert!(!ptr.is_null());
    unsafe { Value::from_raw(ptr) }
}

fn text_of(ptr: *const ValueCell) -> String {
    let mut len = 0usize;
    let data = flyux_string_data(ptr, &mut len);
    assert!(!data.is_null());
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    String::from_utf8(bytes.to_vec()).unwrap()
}

unsafe extern "C" fn add_captured(args: *const *const ValueCell, count: usize) -> *const ValueCell {
    assert_eq!(count, 2);
    let args = unsafe { std::slice::from_raw_parts(args, count) };
    flyux_add(args[0], args[1])
}

#[test]
fn boxed_scalars_round_trip() {
    let before = flyux_live_values();
    let number = flyux_box_number(1234.5);
    assert_eq!(flyux_kind(number), Kind::Number as i32);
    let typed = flyux_box_null_typed(Kind::String as i32);
    assert_eq!(take(typed).declared_kind(), Kind::String);
    flyux_release(number);
    assert_eq!(flyux_live_values(), before);
}

#[test]
fn retain_and_release_pair_up() {
    let before = flyux_live_values();
    let value = flyux_box_string(b"hello".as_ptr(), 5);
    let again = flyux_retain(value);
    assert_eq!(again, value);
    flyux_release(value);
    assert_eq!(text_of(again), "hello");
    flyux_release(again);
    assert_eq!(flyux_live_values(), before);
}

#[test]
fn static_strings_are_not_copied() {
    static LITERAL: &[u8] = b"literal\0";
    let value = take(flyux_box_string_static(LITERAL.as_ptr().cast()));
    assert_eq!(value.as_str().map(str::as_ptr), Some(LITERAL.as_ptr()));
}

#[test]
fn arrays_and_objects() {
    let items = [flyux_box_number(1.0), flyux_box_number(2.0)];
    let array = flyux_box_array(items.as_ptr(), items.len());
    for item in items {
        flyux_release(item);
    }
    let three = flyux_box_number(3.0);
    let pushed = take(flyux_push(array, three));
    assert_eq!(pushed.len(), 3);
    assert_eq!(take(array).len(), 2);
    flyux_release(three);

    let key = CString::new("name").unwrap();
    let keys = [key.as_ptr()];
    let values = [flyux_box_string(b"fly".as_ptr(), 3)];
    let object = flyux_box_object(keys.as_ptr(), values.as_ptr(), 1);
    flyux_release(values[0]);
    let field = flyux_get_field(object, key.as_ptr());
    assert_eq!(text_of(field), "fly");
    flyux_release(field);

    let missing = CString::new("nope").unwrap();
    flyux_release(flyux_get_field(object, missing.as_ptr()));
    assert_eq!(flyux_status_code(), StatusCode::TypeError.as_i32());
    flyux_status_clear();
    assert_eq!(flyux_status_code(), 0);
    flyux_release(object);
}

#[test]
fn spread_entry_points_never_fail() {
    let before = flyux_live_values();
    let items = [flyux_box_number(1000.5)];
    let array = flyux_box_array(items.as_ptr(), 1);
    flyux_release(items[0]);
    let copy = take(flyux_spread_array(array, std::ptr::null()));
    assert_eq!(copy, Value::array(vec![Value::number(1000.5)]));
    assert_eq!(flyux_status_code(), 0);

    let key = CString::new("k").unwrap();
    let keys = [key.as_ptr()];
    let object = flyux_box_object(keys.as_ptr(), &array, 1);
    let spread = take(flyux_spread_object(object, array));
    assert_eq!(spread.len(), 1);
    assert_eq!(flyux_status_code(), 0);

    let zero = flyux_box_number(0.0);
    let element = take(flyux_get_method_by_index(array, zero));
    assert_eq!(element, Value::number(1000.5));
    flyux_release(zero);
    flyux_release(object);
    flyux_release(array);
    drop((copy, spread, element));
    assert_eq!(flyux_live_values(), before);
}

#[test]
fn null_arguments_read_as_undefined() {
    let result = take(flyux_index_safe(std::ptr::null(), std::ptr::null()));
    assert!(result.is_undefined());
    let kind = take(flyux_typeof(std::ptr::null()));
    assert_eq!(kind.as_str(), Some("undef"));
}

#[test]
fn extern_closures_receive_captures() {
    let captured = [flyux_box_number(10.0)];
    let function = flyux_box_function(add_captured, 1, captured.as_ptr(), 1, 0);
    flyux_release(captured[0]);

    let args = [flyux_box_number(5.0)];
    let result = take(flyux_call(function, args.as_ptr(), 1));
    assert_eq!(result, Value::number(15.0));
    flyux_release(args[0]);
    flyux_release(function);
}

#[test]
fn builtins_by_index() {
    let name = CString::new("upper").unwrap();
    let index = flyux_builtin_index(name.as_ptr());
    assert!(index >= 0);
    let args = [flyux_box_string(b"abc".as_ptr(), 3)];
    let out = flyux_call_builtin(index as usize, args.as_ptr(), 1);
    assert_eq!(text_of(out), "ABC");
    flyux_release(out);
    flyux_release(args[0]);

    let unknown = CString::new("noSuchBuiltin").unwrap();
    assert_eq!(flyux_builtin_index(unknown.as_ptr()), -1);
}

#[test]
fn operators_follow_runtime_semantics() {
    let two = flyux_box_number(2.0);
    let text = flyux_box_string(b"2".as_ptr(), 1);
    assert_eq!(take(flyux_equals(two, text)), Value::bool(true));
    let sum = flyux_add(text, two);
    assert_eq!(text_of(sum), "22");
    flyux_release(sum);
    assert_eq!(flyux_truthy(two), 1);
    flyux_release(two);
    flyux_release(text);
}

#[test]
fn json_through_the_boundary() {
    let source = flyux_box_string(br#"{"a":[1,2]}"#.as_ptr(), 11);
    let parsed = flyux_parse_json(source);
    let encoded = flyux_to_json(parsed);
    assert_eq!(text_of(encoded), r#"{"a":[1,2]}"#);
    for ptr in [source, parsed, encoded] {
        flyux_release(ptr);
    }
}

#[test]
fn status_can_be_set_from_generated_code() {
    let message = CString::new("custom failure").unwrap();
    flyux_status_set(StatusCode::MathError.as_i32(), message.as_ptr());
    assert_eq!(flyux_status_code(), 6);
    let text = flyux_status_message();
    assert_eq!(text_of(text), "custom failure");
    flyux_release(text);
    flyux_status_clear();
}
