use std::{cell::RefCell, fmt};

use smallvec::SmallVec;

use crate::{
    config,
    runtime::{
        status::{self, StatusCode},
        value::{Value, ValueCell, WeakValue},
    },
};

/// Rust-side function body. Receives `[receiver?] ++ args ++ captured`.
pub type NativeFn = fn(&[Value]) -> Value;

/// Body emitted by the code generator. Arguments are borrowed; the returned
/// handle is owned by the caller. A null return reads as `undefined`.
pub type ExternFn =
    unsafe extern "C" fn(args: *const *const ValueCell, count: usize) -> *const ValueCell;

#[derive(Clone, Copy)]
pub enum EntryPoint {
    Native(NativeFn),
    Extern(ExternFn),
}

impl EntryPoint {
    pub fn address(&self) -> usize {
        match self {
            EntryPoint::Native(f) => *f as usize,
            EntryPoint::Extern(f) => *f as usize,
        }
    }

    fn invoke(&self, args: &[Value]) -> Value {
        match self {
            EntryPoint::Native(f) => f(args),
            EntryPoint::Extern(f) => {
                let raw: SmallVec<[*const ValueCell; 8]> = args.iter().map(Value::as_ptr).collect();
                // SAFETY: every pointer in `raw` is kept alive by `args` for the
                // duration of the call, and the callee returns an owned handle.
                let result = unsafe { f(raw.as_ptr(), raw.len()) };
                if result.is_null() {
                    Value::undefined()
                } else {
                    unsafe { Value::from_raw(result) }
                }
            }
        }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Native(_) => write!(f, "Native({:#x})", self.address()),
            EntryPoint::Extern(_) => write!(f, "Extern({:#x})", self.address()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Each capture is an independent retained copy.
    ByValue,
    /// Each capture is a cell shared with the defining scope.
    ByReference,
}

#[derive(Debug, Clone)]
pub enum Capture {
    Strong(Value),
    /// The closure itself, held without ownership.
    SelfRef(WeakValue),
}

impl Capture {
    fn load(&self) -> Value {
        match self {
            Capture::Strong(value) => value.clone(),
            Capture::SelfRef(weak) => weak.upgrade().unwrap_or_else(|| {
                log::warn!("self capture outlived its closure");
                Value::undefined()
            }),
        }
    }
}

#[derive(Debug)]
pub struct Closure {
    entry: EntryPoint,
    param_count: usize,
    needs_receiver: bool,
    mode: CaptureMode,
    captured: RefCell<Vec<Capture>>,
    receiver: Option<Value>,
}

impl Closure {
    pub fn new(
        entry: EntryPoint,
        param_count: usize,
        captured: Vec<Value>,
        mode: CaptureMode,
    ) -> Self {
        let captured = captured
            .into_iter()
            .map(|value| match mode {
                CaptureMode::ByReference if !value.is_cell() => Capture::Strong(Value::cell(value)),
                _ => Capture::Strong(value),
            })
            .collect();
        Self {
            entry,
            param_count,
            needs_receiver: false,
            mode,
            captured: RefCell::new(captured),
            receiver: None,
        }
    }

    /// Closure whose body expects the bound receiver as its first argument.
    pub fn method(
        entry: EntryPoint,
        param_count: usize,
        captured: Vec<Value>,
        mode: CaptureMode,
    ) -> Self {
        Self {
            needs_receiver: true,
            ..Self::new(entry, param_count, captured, mode)
        }
    }

    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn needs_receiver(&self) -> bool {
        self.needs_receiver
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    pub fn captured_count(&self) -> usize {
        self.captured.borrow().len()
    }

    /// Current value of a capture slot; a dropped self slot reads as `None`.
    pub fn capture(&self, slot: usize) -> Option<Value> {
        match self.captured.borrow().get(slot)? {
            Capture::Strong(value) => Some(value.clone()),
            Capture::SelfRef(weak) => weak.upgrade(),
        }
    }

    pub fn is_self_slot(&self, slot: usize) -> bool {
        matches!(self.captured.borrow().get(slot), Some(Capture::SelfRef(_)))
    }
}

impl Value {
    pub fn closure(
        entry: EntryPoint,
        param_count: usize,
        captured: Vec<Value>,
        mode: CaptureMode,
    ) -> Value {
        Value::function(Closure::new(entry, param_count, captured, mode))
    }

    pub fn native_fn(entry: NativeFn, param_count: usize, captured: Vec<Value>) -> Value {
        Value::closure(
            EntryPoint::Native(entry),
            param_count,
            captured,
            CaptureMode::ByValue,
        )
    }

    pub fn method(
        entry: EntryPoint,
        param_count: usize,
        captured: Vec<Value>,
        mode: CaptureMode,
    ) -> Value {
        Value::function(Closure::method(entry, param_count, captured, mode))
    }
}

/// Returns `function` bound to `receiver`. A function that already carries a
/// receiver keeps it: the original handle is returned unchanged. Non-functions
/// pass through.
pub fn bind_receiver(function: &Value, receiver: &Value) -> Value {
    let Some(closure) = function.as_closure() else {
        return function.clone();
    };
    if closure.receiver.is_some() {
        return function.clone();
    }
    // The copy is a different cell, so it may own the source closure without
    // forming a cycle.
    let captured = closure
        .captured
        .borrow()
        .iter()
        .map(|capture| match capture {
            Capture::SelfRef(weak) if weak.points_to(function) => {
                Capture::Strong(function.clone())
            }
            other => other.clone(),
        })
        .collect();
    Value::function(Closure {
        entry: closure.entry,
        param_count: closure.param_count,
        needs_receiver: closure.needs_receiver,
        mode: closure.mode,
        captured: RefCell::new(captured),
        receiver: Some(receiver.clone()),
    })
}

/// Points capture `slot` of `function` back at `function` without retaining
/// it, so a recursive closure does not keep itself alive. The slot holds the
/// function directly even under capture-by-reference.
pub fn bind_self_capture(function: &Value, slot: usize) -> bool {
    let Some(closure) = function.as_closure() else {
        return false;
    };
    let mut captured = closure.captured.borrow_mut();
    let Some(entry) = captured.get_mut(slot) else {
        return false;
    };
    let previous = std::mem::replace(entry, Capture::SelfRef(function.downgrade()));
    drop(captured);
    drop(previous);
    true
}

/// Invokes `function` with `[receiver?] ++ args ++ captured`.
///
/// The receiver is passed only when the closure has one and was built as a
/// method. Exceeding the configured argument limit is fatal.
pub fn call(function: &Value, args: &[Value]) -> Value {
    let Some(closure) = function.as_closure() else {
        status::set(StatusCode::TypeError, "(call) value is not a function");
        return Value::undefined();
    };
    let receiver = closure.receiver.as_ref().filter(|_| closure.needs_receiver);
    let full: SmallVec<[Value; 8]> = {
        let captured = closure.captured.borrow();
        let total = usize::from(receiver.is_some()) + args.len() + captured.len();
        let limit = config::with(|c| c.max_call_args);
        if total > limit {
            status::fatal(&format!(
                "call does not support {} arguments (max {})",
                total, limit
            ));
        }
        receiver
            .cloned()
            .into_iter()
            .chain(args.iter().cloned())
            .chain(captured.iter().map(Capture::load))
            .collect()
    };
    closure.entry.invoke(&full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{arith, leak_detector};

    fn factorial(args: &[Value]) -> Value {
        let n = args[0].as_number().unwrap_or(0.0);
        if n <= 1.0 {
            return Value::number(1.0);
        }
        let rest = call(&args[1], &[Value::number(n - 1.0)]);
        arith::mul(&args[0], &rest)
    }

    fn recursive_factorial() -> Value {
        let f = Value::native_fn(factorial, 1, vec![Value::undefined()]);
        assert!(bind_self_capture(&f, 0));
        f
    }

    #[test]
    fn self_referential_closure_computes_factorial() {
        let f = recursive_factorial();
        assert_eq!(call(&f, &[Value::number(5.0)]), Value::number(120.0));
        assert_eq!(call(&f, &[Value::number(10.0)]), Value::number(3628800.0));
    }

    #[test]
    fn self_slot_does_not_leak() {
        let _warm = recursive_factorial();
        drop(_warm);
        let before = leak_detector::snapshot();
        for _ in 0..200 {
            let f = recursive_factorial();
            assert_eq!(call(&f, &[Value::number(5.0)]), Value::number(120.0));
        }
        let after = leak_detector::snapshot();
        let delta = after.since(&before);
        assert_eq!(delta.allocated, delta.freed);
        assert_eq!(delta.closures_allocated, 200);
        assert_eq!(delta.closures_freed, 200);
    }

    #[test]
    fn self_slot_is_weak() {
        let f = recursive_factorial();
        assert_eq!(f.strong_count(), 1);
        let closure = f.as_closure().unwrap();
        assert!(closure.is_self_slot(0));
        assert!(Value::ptr_eq(&closure.capture(0).unwrap(), &f));
    }

    fn echo_all(args: &[Value]) -> Value {
        Value::array(args.to_vec())
    }

    #[test]
    fn arguments_then_captures() {
        let f = Value::native_fn(echo_all, 2, vec![Value::string("cap")]);
        let out = call(&f, &[Value::number(1.0), Value::number(2.0)]);
        assert_eq!(
            out,
            Value::array(vec![
                Value::number(1.0),
                Value::number(2.0),
                Value::string("cap")
            ])
        );
    }

    #[test]
    fn receiver_only_passed_to_methods() {
        let obj = Value::empty_object();
        let plain = bind_receiver(&Value::native_fn(echo_all, 0, vec![]), &obj);
        assert_eq!(call(&plain, &[]).len(), 0);

        let method = Value::method(EntryPoint::Native(echo_all), 0, vec![], CaptureMode::ByValue);
        let bound = bind_receiver(&method, &obj);
        let out = call(&bound, &[Value::number(7.0)]);
        let items = out.as_array().unwrap();
        assert!(Value::ptr_eq(&items[0], &obj));
        assert_eq!(items[1], Value::number(7.0));
    }

    #[test]
    fn rebinding_keeps_first_receiver() {
        let first = Value::empty_object();
        let second = Value::empty_object();
        let method = Value::method(EntryPoint::Native(echo_all), 0, vec![], CaptureMode::ByValue);
        let bound = bind_receiver(&method, &first);
        let rebound = bind_receiver(&bound, &second);
        assert!(Value::ptr_eq(&bound, &rebound));
        let receiver = rebound.as_closure().unwrap().receiver().unwrap().clone();
        assert!(Value::ptr_eq(&receiver, &first));
    }

    #[test]
    fn bound_copy_owns_recursive_source() {
        let f = recursive_factorial();
        let bound = bind_receiver(&f, &Value::empty_object());
        drop(f);
        assert_eq!(call(&bound, &[Value::number(4.0)]), Value::number(24.0));
    }

    fn bump_counter(args: &[Value]) -> Value {
        let cell = &args[0];
        let next = arith::add(&cell.cell_get(), &Value::number(1.0));
        cell.cell_set(next.clone());
        next
    }

    #[test]
    fn by_reference_captures_share_the_cell() {
        let shared = Value::cell(Value::number(0.0));
        let f = Value::closure(
            EntryPoint::Native(bump_counter),
            0,
            vec![shared.clone()],
            CaptureMode::ByReference,
        );
        call(&f, &[]);
        call(&f, &[]);
        assert_eq!(shared.cell_get(), Value::number(2.0));
    }

    #[test]
    fn by_reference_wraps_plain_values() {
        let f = Value::closure(
            EntryPoint::Native(bump_counter),
            0,
            vec![Value::number(10.0)],
            CaptureMode::ByReference,
        );
        assert_eq!(call(&f, &[]), Value::number(11.0));
        assert_eq!(call(&f, &[]), Value::number(12.0));
    }

    #[test]
    fn calling_a_non_function_sets_type_error() {
        let out = call(&Value::number(1.0), &[]);
        assert!(out.is_undefined());
        assert_eq!(status::code(), StatusCode::TypeError);
        status::clear();
    }
}
