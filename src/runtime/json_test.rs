use crate::{
    config::{self, RuntimeConfig},
    runtime::{
        json::{CIRCULAR_MARKER, DEPTH_MARKER, decode, encode, to_json_string},
        kind::Kind,
        object_ops::keys,
        status::{self, StatusCode},
        value::Value,
    },
};

fn n(x: f64) -> Value {
    Value::number(x)
}

fn s(text: &str) -> Value {
    Value::string(text)
}

#[test]
fn encodes_scalars() {
    assert_eq!(to_json_string(&n(1.5)), "1.5");
    assert_eq!(to_json_string(&n(3.0)), "3");
    assert_eq!(to_json_string(&n(f64::NAN)), "null");
    assert_eq!(to_json_string(&Value::bool(true)), "true");
    assert_eq!(to_json_string(&Value::undefined()), "null");
    assert_eq!(to_json_string(&s("a\"b\n")), r#""a\"b\n""#);
    assert_eq!(to_json_string(&s("\u{1}")), r#""\u0001""#);
}

#[test]
fn encodes_containers_in_insertion_order() {
    let obj = Value::object_from([
        ("z", n(1.0)),
        ("a", Value::array(vec![Value::null(), s("x")])),
    ]);
    assert_eq!(encode(&obj), s(r#"{"z":1,"a":[null,"x"]}"#));
    assert!(status::is_ok());
}

#[test]
fn extension_objects_encode_as_type_name() {
    assert_eq!(to_json_string(&Value::buffer(vec![1])), r#""Buffer""#);
}

#[test]
fn cycles_become_markers() {
    let arr = Value::array(vec![n(1.0)]);
    arr.as_array_mut().unwrap().push(arr.clone());
    assert_eq!(to_json_string(&arr), format!("[1,\"{}\"]", CIRCULAR_MARKER));
    arr.as_array_mut().unwrap().clear();
}

#[test]
fn shared_but_acyclic_nodes_repeat() {
    let inner = Value::array(vec![n(1.0)]);
    let outer = Value::array(vec![inner.clone(), inner]);
    assert_eq!(to_json_string(&outer), "[[1],[1]]");
}

#[test]
fn depth_limit_cuts_off_nesting() {
    config::install(RuntimeConfig {
        json_max_depth: 2,
        ..RuntimeConfig::default()
    });
    let nested = Value::array(vec![Value::array(vec![Value::array(vec![])])]);
    let encoded = to_json_string(&nested);
    config::install(RuntimeConfig::default());
    assert_eq!(encoded, format!("[[\"{}\"]]", DEPTH_MARKER));
}

#[test]
fn decodes_with_key_order() {
    let value = decode(&s(r#"{"b": [1, 2.5, "x"], "a": {"t": true, "n": null}}"#));
    assert!(status::is_ok());
    assert_eq!(keys(&value), Value::array(vec![s("b"), s("a")]));
    assert_eq!(
        to_json_string(&value),
        r#"{"b":[1,2.5,"x"],"a":{"t":true,"n":null}}"#
    );
}

#[test]
fn malformed_input_is_type_error() {
    let result = decode(&s("{\"a\": "));
    assert!(result.is_null());
    assert_eq!(result.declared_kind(), Kind::Object);
    assert_eq!(status::code(), StatusCode::TypeError);
    assert_eq!(status::message(), "(parseJSON) invalid JSON format");

    decode(&n(1.0));
    assert_eq!(status::message(), "(parseJSON) argument must be a string");
}

fn nested_arrays(depth: usize) -> Value {
    let mut value = Value::array(Vec::new());
    for _ in 1..depth {
        value = Value::array(vec![value]);
    }
    value
}

#[test]
fn deep_graphs_round_trip_up_to_the_depth_limit() {
    for depth in [129, 200, 256] {
        let value = nested_arrays(depth);
        let text = encode(&value);
        assert!(!text.as_str().unwrap().contains(DEPTH_MARKER));
        assert_eq!(decode(&text), value);
        assert!(status::is_ok());
    }
}

#[test]
fn decode_rejects_nesting_past_the_limit() {
    let text = format!("{}{}", "[".repeat(257), "]".repeat(257));
    let result = decode(&s(&text));
    assert!(result.is_null());
    assert_eq!(result.declared_kind(), Kind::Object);
    assert_eq!(status::code(), StatusCode::TypeError);
    assert_eq!(status::message(), "(parseJSON) nesting too deep");

    let quoted = format!("\"{}\"", "[".repeat(300));
    assert_eq!(decode(&s(&quoted)), s(&"[".repeat(300)));
}
