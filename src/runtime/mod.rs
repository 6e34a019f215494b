//! Value system and support library for compiled FLYUX programs.
//!
//! # Memory model
//! Every runtime value is a [`Value`] handle: a reference-counted pointer to
//! a heap cell that records the declared kind, a lifetime tag and the
//! payload. Cloning a handle retains the cell and dropping it releases; the
//! cell is freed when the last handle goes away.
//!
//! Booleans, `null`, `undefined` and small integers are immortal singletons
//! (see [`lifecycle`]). A closure that captures itself holds that slot
//! weakly, so recursive functions are freed normally. Cycles built by
//! program code (an array stored inside itself) are not collected.
//!
//! All runtime state is thread-local. Values must not cross threads.
use crate::runtime::value::Value;

pub mod arith;
pub mod array_ops;
pub mod builtin_function;
pub mod builtins;
pub mod closure;
pub mod coerce;
pub mod ext;
pub(crate) mod helpers;
pub mod json;
pub mod kind;
pub mod leak_detector;
pub mod lifecycle;
pub mod number_format;
pub mod object_map;
pub mod object_ops;
pub mod print;
pub mod status;
pub mod text;
pub mod value;

pub type BuiltinFn = fn(&[Value]) -> Value;

#[cfg(test)]
mod coerce_test;
#[cfg(test)]
mod json_test;
#[cfg(test)]
mod object_ops_test;
