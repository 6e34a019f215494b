use crate::runtime::{
    coerce::{display_string, is_truthy, to_bl, to_int, to_num, to_number_lossy, to_str, type_of},
    ext::{Buffer, Extension},
    kind::Kind,
    status::{self, StatusCode},
    value::Value,
};

#[test]
fn truthiness_table() {
    assert!(!is_truthy(&Value::number(0.0)));
    assert!(!is_truthy(&Value::number(f64::NAN)));
    assert!(!is_truthy(&Value::string("")));
    assert!(!is_truthy(&Value::null()));
    assert!(!is_truthy(&Value::undefined()));
    assert!(!is_truthy(&Value::bool(false)));
    assert!(is_truthy(&Value::number(-1.0)));
    assert!(is_truthy(&Value::string("0")));
    assert!(is_truthy(&Value::array(vec![])));
    assert!(is_truthy(&Value::empty_object()));
}

#[test]
fn lossy_numbers() {
    assert_eq!(to_number_lossy(&Value::string("12abc")), 12.0);
    assert_eq!(to_number_lossy(&Value::string("abc")), 0.0);
    assert_eq!(to_number_lossy(&Value::bool(true)), 1.0);
    assert_eq!(to_number_lossy(&Value::undefined()), 0.0);
    assert_eq!(to_number_lossy(&Value::array(vec![])), 0.0);
}

#[test]
fn to_num_parses_whole_text() {
    assert_eq!(to_num(&Value::string("3.5")), Value::number(3.5));
    assert!(status::is_ok());

    let bad = to_num(&Value::string("3.5x"));
    assert!(bad.is_null());
    assert_eq!(bad.declared_kind(), Kind::Number);
    assert_eq!(status::code(), StatusCode::TypeError);
    assert_eq!(status::message(), "(toNum) Invalid number format");

    to_num(&Value::string(""));
    assert_eq!(
        status::message(),
        "(toNum) Empty string cannot be converted to number"
    );
    status::clear();
}

#[test]
fn to_num_of_null_and_collections() {
    let n = to_num(&Value::null());
    assert!(n.is_null());
    assert_eq!(n.declared_kind(), Kind::Number);
    assert!(status::is_ok());

    to_num(&Value::array(vec![]));
    assert_eq!(
        status::message(),
        "(toNum) Cannot convert array/object to number"
    );
    assert_eq!(to_num(&Value::undefined()), Value::number(0.0));
    assert!(status::is_ok());
}

#[test]
fn to_str_renders_each_kind() {
    assert_eq!(to_str(&Value::number(42.0)), Value::string("42"));
    assert_eq!(to_str(&Value::number(0.5)), Value::string("0.5"));
    assert_eq!(to_str(&Value::bool(true)), Value::string("true"));
    assert_eq!(to_str(&Value::null()), Value::string("null"));
    assert_eq!(to_str(&Value::undefined()), Value::string("undef"));
    assert_eq!(to_str(&Value::array(vec![])), Value::string("[...]"));
    assert_eq!(display_string(&Value::empty_object()), "{...}");
}

#[test]
fn to_int_floors() {
    assert_eq!(to_int(&Value::string("7.9")), Value::number(7.0));
    assert_eq!(to_int(&Value::number(-1.5)), Value::number(-2.0));
    assert!(to_int(&Value::string("x")).is_null());
    status::clear();
}

#[test]
fn to_bl_is_truthiness() {
    assert_eq!(to_bl(&Value::string("")), Value::bool(false));
    assert_eq!(to_bl(&Value::number(2.0)), Value::bool(true));
}

#[test]
fn type_of_uses_declared_kind() {
    assert_eq!(type_of(&Value::number(1.0)), Value::string("num"));
    assert_eq!(type_of(&Value::array(vec![])), Value::string("obj"));
    assert_eq!(type_of(&Value::null()), Value::string("null"));
    assert_eq!(type_of(&Value::null_typed(Kind::String)), Value::string("str"));
    assert_eq!(type_of(&Value::undefined()), Value::string("undef"));
    let buffer = Value::buffer(vec![1, 2]);
    assert_eq!(type_of(&buffer), Value::string("obj:Buffer"));
    assert!(matches!(
        &*buffer.as_ext().unwrap(),
        Extension::Buffer(Buffer { bytes }) if bytes.len() == 2
    ));
}
