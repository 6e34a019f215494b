use crate::runtime::value::Value;

use super::helpers::{arg, rest};

#[test]
fn missing_argument_reads_as_undefined() {
    let args = vec![Value::number(1.0)];
    assert_eq!(arg(&args, 0), Value::number(1.0));
    assert!(arg(&args, 1).is_undefined());
}

#[test]
fn rest_past_the_end_is_empty() {
    let args = vec![Value::number(1.0), Value::number(2.0), Value::number(3.0)];
    assert_eq!(rest(&args, 1).len(), 2);
    assert!(rest(&args, 5).is_empty());
}
