use crate::runtime::value::Value;

/// Positional argument; a missing one reads as `undefined`.
pub(super) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_else(Value::undefined)
}

/// Arguments from `index` on, for variadic builtins.
pub(super) fn rest(args: &[Value], index: usize) -> &[Value] {
    args.get(index..).unwrap_or(&[])
}
