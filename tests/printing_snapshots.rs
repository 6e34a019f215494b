use flyux::config::{self, ColorMode, RuntimeConfig};
use flyux::runtime::{
    json::decode,
    print::{format, render},
    value::Value,
};
use insta::assert_snapshot;

fn parsed(text: &str) -> Value {
    decode(&Value::string(text))
}

#[test]
fn snapshot_nested_document() {
    let doc = parsed(r#"{"user": {"name": "Ada", "langs": ["en", "fr"]}, "ok": true, "n": null}"#);
    assert_snapshot!(
        render(&doc, false),
        @r#"{ user: { name: "Ada", langs: ["en", "fr"] }, ok: true, n: null }"#
    );
}

#[test]
fn snapshot_numbers() {
    let doc = Value::array(vec![
        Value::number(0.1 + 0.2),
        Value::number(1.0 / 3.0),
        Value::number(1e21),
        Value::number(-0.5),
    ]);
    assert_snapshot!(render(&doc, false), @"[0.3, 0.333333333333333, 1e+21, -0.5]");
}

#[test]
fn snapshot_printf_table() {
    let rows = [("apple", 3.0, 0.5), ("kiwi", 12.0, 0.25)];
    let out = rows
        .iter()
        .map(|&(name, qty, price)| {
            format(
                "%-6s|%4d|%.2f",
                &[Value::string(name), Value::number(qty), Value::number(price)],
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    assert_snapshot!(out, @r"
    apple |   3|0.50
    kiwi  |  12|0.25
    ");
}

#[test]
fn config_json_controls_print_depth() {
    let mut runtime_config = RuntimeConfig::from_json(r#"{"print_max_depth": 1}"#).unwrap();
    runtime_config.color = ColorMode::Never;
    config::install(runtime_config);
    let doc = parsed(r#"{"a": {"b": 1}}"#);
    let rendered = render(&doc, false);
    config::install(RuntimeConfig::default());
    assert_eq!(rendered, "{ a: [...] }");
}
