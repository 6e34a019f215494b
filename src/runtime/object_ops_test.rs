use crate::runtime::{
    closure::{self, CaptureMode, EntryPoint},
    kind::Kind,
    object_ops::{
        deep_clone, delete_field, entries, get_field, get_field_by, get_field_safe, get_method,
        get_method_by_index, has_field, keys, merge, set_field, shallow_clone, spread_object,
        values,
    },
    status::{self, StatusCode},
    value::Value,
};

fn n(x: f64) -> Value {
    Value::number(x)
}

fn s(text: &str) -> Value {
    Value::string(text)
}

fn sample() -> Value {
    Value::object_from([("name", s("fly")), ("age", n(3.0))])
}

#[test]
fn get_field_reports_missing_keys() {
    let obj = sample();
    assert_eq!(get_field(&obj, "name"), s("fly"));
    assert!(get_field(&obj, "nope").is_undefined());
    assert_eq!(status::code(), StatusCode::TypeError);
    assert_eq!(status::message(), "(getField) Field not found");

    get_field(&n(1.0), "name");
    assert_eq!(status::message(), "(getField) Not an object");
}

#[test]
fn get_field_by_requires_string_key() {
    let obj = sample();
    assert_eq!(get_field_by(&obj, &s("age")), n(3.0));
    assert!(get_field_by(&obj, &n(0.0)).is_undefined());
    assert_eq!(status::message(), "(getField) Field name must be a string");
}

#[test]
fn optional_chaining_stays_ok() {
    assert!(get_field_safe(&Value::null(), "x").is_undefined());
    assert!(status::is_ok());
}

#[test]
fn extension_objects_expose_virtual_fields() {
    let buffer = Value::buffer(vec![1, 2, 3]);
    assert_eq!(get_field(&buffer, "size"), n(3.0));
    assert_eq!(get_field(&buffer, "type"), s("Buffer"));
    assert_eq!(has_field(&buffer, "size"), Value::bool(true));
    assert_eq!(has_field(&buffer, "path"), Value::bool(false));
}

#[test]
fn set_field_undefined_removes() {
    let obj = sample();
    set_field(&obj, "extra", Value::bool(true));
    assert_eq!(has_field(&obj, "extra"), Value::bool(true));
    set_field(&obj, "extra", Value::undefined());
    assert_eq!(has_field(&obj, "extra"), Value::bool(false));
    assert_eq!(obj.len(), 2);

    set_field(&Value::array(vec![]), "x", n(1.0));
    assert_eq!(status::message(), "(setField) Not an object");
}

#[test]
fn delete_field_reports_presence() {
    let obj = sample();
    assert_eq!(delete_field(&obj, "age"), Value::bool(true));
    assert_eq!(delete_field(&obj, "age"), Value::bool(false));
    assert_eq!(keys(&obj), Value::array(vec![s("name")]));
}

#[test]
fn enumeration_follows_insertion_order() {
    let obj = sample();
    assert_eq!(keys(&obj), Value::array(vec![s("name"), s("age")]));
    assert_eq!(values(&obj), Value::array(vec![s("fly"), n(3.0)]));
    assert_eq!(
        entries(&obj),
        Value::array(vec![
            Value::array(vec![s("name"), s("fly")]),
            Value::array(vec![s("age"), n(3.0)]),
        ])
    );
}

#[test]
fn keys_requires_object() {
    let result = keys(&n(1.0));
    assert!(result.is_null());
    assert_eq!(result.declared_kind(), Kind::Object);
    assert_eq!(status::message(), "(keys) requires object");
}

#[test]
fn merge_right_wins_and_skips_null() {
    let left = Value::object_from([("a", n(1.0)), ("b", n(2.0))]);
    let right = Value::object_from([("b", n(3.0)), ("c", n(4.0))]);
    let merged = merge(&left, &right);
    assert_eq!(keys(&merged), Value::array(vec![s("a"), s("b"), s("c")]));
    assert_eq!(get_field(&merged, "b"), n(3.0));

    let only_left = merge(&left, &Value::null());
    assert_eq!(only_left, left);
    assert!(!Value::ptr_eq(&only_left, &left));

    merge(&left, &n(1.0));
    assert_eq!(status::message(), "(merge) requires object");
}

#[test]
fn get_method_binds_the_receiver() {
    fn receiver_name(args: &[Value]) -> Value {
        get_field(&args[0], "name")
    }
    let obj = sample();
    let method = Value::method(
        EntryPoint::Native(receiver_name),
        0,
        vec![],
        CaptureMode::ByValue,
    );
    set_field(&obj, "whoami", method);
    let bound = get_method(&obj, "whoami");
    assert_eq!(closure::call(&bound, &[]), s("fly"));
}

#[test]
fn spread_object_falls_back_to_a_copy() {
    let left = Value::object_from([("a", n(1.0)), ("b", n(2.0))]);
    let right = Value::object_from([("b", n(3.0)), ("c", n(4.0))]);
    let spread = spread_object(&left, &right);
    assert_eq!(keys(&spread), Value::array(vec![s("a"), s("b"), s("c")]));
    assert_eq!(get_field(&spread, "b"), n(3.0));

    status::set(StatusCode::TypeError, "stale");
    let copy = spread_object(&left, &n(1.0));
    assert_eq!(copy, left);
    assert!(!Value::ptr_eq(&copy, &left));
    assert!(status::is_ok());

    let from_right = spread_object(&Value::null(), &right);
    assert_eq!(from_right, right);
    assert!(!Value::ptr_eq(&from_right, &right));
    assert_eq!(get_field(&left, "b"), n(2.0));
}

#[test]
fn get_method_by_index_binds_computed_reads() {
    fn receiver_name(args: &[Value]) -> Value {
        get_field(&args[0], "name")
    }
    let method = Value::method(
        EntryPoint::Native(receiver_name),
        0,
        vec![],
        CaptureMode::ByValue,
    );
    let obj = sample();
    set_field(&obj, "whoami", method.clone());
    let bound = get_method_by_index(&obj, &s("whoami"));
    assert_eq!(closure::call(&bound, &[]), s("fly"));
    assert_eq!(get_method_by_index(&obj, &s("age")), n(3.0));

    let list = Value::array(vec![method]);
    let from_array = get_method_by_index(&list, &n(0.0));
    assert!(from_array.is_function());
    assert!(get_method_by_index(&list, &n(5.0)).is_null());
    assert_eq!(status::code(), StatusCode::OutOfBounds);
}

#[test]
fn shallow_clone_shares_elements() {
    let inner = Value::array(vec![n(1.0)]);
    let obj = Value::object_from([("inner", inner.clone())]);
    let copy = shallow_clone(&obj);
    assert!(!Value::ptr_eq(&copy, &obj));
    assert!(Value::ptr_eq(&get_field(&copy, "inner"), &inner));
}

#[test]
fn deep_clone_copies_nested_structure() {
    let inner = Value::array(vec![n(1.0)]);
    let obj = Value::object_from([("a", inner.clone()), ("b", inner.clone())]);
    let copy = deep_clone(&obj);
    assert_eq!(copy, obj);
    let a = get_field(&copy, "a");
    let b = get_field(&copy, "b");
    assert!(!Value::ptr_eq(&a, &inner));
    assert!(Value::ptr_eq(&a, &b));
}

#[test]
fn deep_clone_preserves_cycles() {
    let arr = Value::array(vec![n(1.0)]);
    arr.as_array_mut().unwrap().push(arr.clone());
    let copy = deep_clone(&arr);
    let back = copy.as_array().unwrap()[1].clone();
    assert!(Value::ptr_eq(&back, &copy));

    // Break both cycles so the cells are freed.
    arr.as_array_mut().unwrap().clear();
    copy.as_array_mut().unwrap().clear();
    drop(back);
}
