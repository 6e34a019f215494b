use std::fmt;

use crate::runtime::{BuiltinFn, value::Value};

/// Named entry in the builtin table.
#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: &'static str,
    /// Declared parameter count, reported when the builtin is wrapped as a
    /// function value.
    pub arity: usize,
    pub func: BuiltinFn,
}

impl BuiltinFunction {
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
