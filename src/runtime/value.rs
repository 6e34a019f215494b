use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::{Rc, Weak},
};

use crate::runtime::{
    closure::Closure,
    ext::Extension,
    kind::{Kind, SubKind},
    leak_detector, lifecycle,
    object_map::ObjectMap,
    print,
    text::Text,
};

/// How long a cell lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Freed when the last handle drops.
    None,
    /// Wraps static text; the cell is still refcounted, the text is not owned.
    StaticConstant,
    /// Singleton or interned number, never freed.
    Immortal,
}

/// Heap cell behind every [`Value`] handle.
pub struct ValueCell {
    declared: Kind,
    lifetime: Lifetime,
    payload: Payload,
}

pub(crate) enum Payload {
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
    Text(Text),
    Array(RefCell<Vec<Value>>),
    Object(RefCell<ObjectMap>),
    Ext(RefCell<Extension>),
    Function(Closure),
    /// Boxed mutable slot used for capture-by-reference.
    Cell(RefCell<Value>),
}

impl Payload {
    fn kind(&self) -> Kind {
        match self {
            Payload::Number(_) => Kind::Number,
            Payload::Bool(_) => Kind::Bool,
            Payload::Null => Kind::Null,
            Payload::Undefined => Kind::Undefined,
            Payload::Text(_) => Kind::String,
            Payload::Array(_) => Kind::Array,
            Payload::Object(_) | Payload::Ext(_) => Kind::Object,
            Payload::Function(_) => Kind::Function,
            Payload::Cell(inner) => inner.borrow().kind(),
        }
    }
}

impl Drop for ValueCell {
    fn drop(&mut self) {
        if self.lifetime != Lifetime::Immortal {
            leak_detector::record_free(matches!(self.payload, Payload::Function(_)));
        }
    }
}

/// Runtime value handle.
///
/// ## Memory model
///
/// A `Value` is an `Rc` to a [`ValueCell`]. Cloning a handle is `retain`,
/// dropping one is `release`; the cell and everything it owns (text, element
/// vector, object entries, captures, extension payload) is freed when the
/// last handle goes.
///
/// Arrays and objects mutate in place through `RefCell`, so the language can
/// build cyclic graphs (`a[0] := a`). Such cycles are not collected. The one
/// cycle the runtime creates on its own, a closure that captures itself, is
/// stored through a [`WeakValue`] instead of a strong handle.
///
/// Numbers in `[-128, 256]`, both booleans, `null` and `undefined` are
/// immortal per-thread singletons (see `lifecycle`).
#[derive(Clone)]
pub struct Value(Rc<ValueCell>);

/// Non-owning handle. Cannot keep a cell alive on its own.
#[derive(Clone)]
pub struct WeakValue(Weak<ValueCell>);

impl WeakValue {
    pub fn upgrade(&self) -> Option<Value> {
        self.0.upgrade().map(Value)
    }

    pub fn points_to(&self, value: &Value) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&value.0))
    }
}

impl fmt::Debug for WeakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(_) => write!(f, "WeakValue({:p})", self.0.as_ptr()),
            None => write!(f, "WeakValue(<dropped>)"),
        }
    }
}

impl Value {
    fn alloc(payload: Payload, declared: Kind, lifetime: Lifetime) -> Value {
        leak_detector::record_alloc(matches!(payload, Payload::Function(_)));
        Value(Rc::new(ValueCell {
            declared,
            lifetime,
            payload,
        }))
    }

    /// Builds a cell that is never counted or freed; only the lifecycle cache
    /// calls this.
    pub(crate) fn immortal(payload: Payload, declared: Kind) -> Value {
        Value(Rc::new(ValueCell {
            declared,
            lifetime: Lifetime::Immortal,
            payload,
        }))
    }

    pub(crate) fn payload(&self) -> &Payload {
        &self.0.payload
    }

    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    pub fn number(n: f64) -> Value {
        lifecycle::interned_number(n)
            .unwrap_or_else(|| Value::alloc(Payload::Number(n), Kind::Number, Lifetime::None))
    }

    pub fn bool(b: bool) -> Value {
        lifecycle::boolean(b)
    }

    pub fn null() -> Value {
        lifecycle::null()
    }

    pub fn undefined() -> Value {
        lifecycle::undefined()
    }

    /// Null that remembers the type its variable was declared with.
    pub fn null_typed(declared: Kind) -> Value {
        match declared {
            Kind::Null => Value::null(),
            _ => Value::alloc(Payload::Null, declared, Lifetime::None),
        }
    }

    /// Null carrying the declared kind of `previous`.
    pub fn null_like(previous: &Value) -> Value {
        Value::null_typed(previous.declared_kind())
    }

    /// Text that outlives the program, such as a literal constant.
    pub fn static_str(s: &'static str) -> Value {
        Value::alloc(
            Payload::Text(Text::Static(s)),
            Kind::String,
            Lifetime::StaticConstant,
        )
    }

    /// Owned text, freed with the cell.
    pub fn string(s: impl Into<Box<str>>) -> Value {
        Value::alloc(
            Payload::Text(Text::Owned(s.into())),
            Kind::String,
            Lifetime::None,
        )
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::alloc(
            Payload::Array(RefCell::new(items)),
            Kind::Array,
            Lifetime::None,
        )
    }

    pub fn object(map: ObjectMap) -> Value {
        Value::alloc(
            Payload::Object(RefCell::new(map)),
            Kind::Object,
            Lifetime::None,
        )
    }

    pub fn empty_object() -> Value {
        Value::object(ObjectMap::new())
    }

    /// Object from `(key, value)` pairs; later duplicates overwrite earlier ones.
    pub fn object_from<K, I>(entries: I) -> Value
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut map = ObjectMap::new();
        for (key, value) in entries {
            map.insert(key.as_ref(), value);
        }
        Value::object(map)
    }

    pub(crate) fn extension(ext: Extension) -> Value {
        Value::alloc(
            Payload::Ext(RefCell::new(ext)),
            Kind::Object,
            Lifetime::None,
        )
    }

    pub fn function(closure: Closure) -> Value {
        Value::alloc(Payload::Function(closure), Kind::Function, Lifetime::None)
    }

    /// Boxed mutable slot shared between a scope and the closures that capture
    /// it by reference.
    pub fn cell(initial: Value) -> Value {
        let declared = initial.declared_kind();
        Value::alloc(
            Payload::Cell(RefCell::new(initial)),
            declared,
            Lifetime::None,
        )
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn kind(&self) -> Kind {
        self.0.payload.kind()
    }

    pub fn declared_kind(&self) -> Kind {
        self.0.declared
    }

    pub fn sub_kind(&self) -> SubKind {
        match &self.0.payload {
            Payload::Ext(ext) => ext.borrow().sub_kind(),
            _ => SubKind::Plain,
        }
    }

    pub fn lifetime(&self) -> Lifetime {
        self.0.lifetime
    }

    pub fn is_immortal(&self) -> bool {
        self.0.lifetime == Lifetime::Immortal
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0.payload, Payload::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.0.payload, Payload::Undefined)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.0.payload, Payload::Function(_))
    }

    pub fn is_cell(&self) -> bool {
        matches!(self.0.payload, Payload::Cell(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.0.payload {
            Payload::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.0.payload {
            Payload::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.0.payload {
            Payload::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match &self.0.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Ref<'_, Vec<Value>>> {
        match &self.0.payload {
            Payload::Array(items) => Some(items.borrow()),
            _ => None,
        }
    }

    pub fn as_array_mut(&self) -> Option<RefMut<'_, Vec<Value>>> {
        match &self.0.payload {
            Payload::Array(items) => Some(items.borrow_mut()),
            _ => None,
        }
    }

    /// Entry storage of a plain object. Extension objects return `None`.
    pub fn as_object(&self) -> Option<Ref<'_, ObjectMap>> {
        match &self.0.payload {
            Payload::Object(map) => Some(map.borrow()),
            _ => None,
        }
    }

    pub fn as_object_mut(&self) -> Option<RefMut<'_, ObjectMap>> {
        match &self.0.payload {
            Payload::Object(map) => Some(map.borrow_mut()),
            _ => None,
        }
    }

    pub fn as_ext(&self) -> Option<Ref<'_, Extension>> {
        match &self.0.payload {
            Payload::Ext(ext) => Some(ext.borrow()),
            _ => None,
        }
    }

    pub fn as_ext_mut(&self) -> Option<RefMut<'_, Extension>> {
        match &self.0.payload {
            Payload::Ext(ext) => Some(ext.borrow_mut()),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match &self.0.payload {
            Payload::Function(closure) => Some(closure),
            _ => None,
        }
    }

    /// Reads through a capture cell. Non-cells read as themselves.
    pub fn cell_get(&self) -> Value {
        match &self.0.payload {
            Payload::Cell(slot) => slot.borrow().clone(),
            _ => self.clone(),
        }
    }

    /// Writes through a capture cell. Returns false for non-cells.
    pub fn cell_set(&self, value: Value) -> bool {
        match &self.0.payload {
            Payload::Cell(slot) => {
                let previous = slot.replace(value);
                drop(previous);
                true
            }
            _ => false,
        }
    }

    /// Element count for arrays, entry count for objects, character count
    /// for text, zero otherwise.
    pub fn len(&self) -> usize {
        match &self.0.payload {
            Payload::Text(text) => text.char_len(),
            Payload::Array(items) => items.borrow().len(),
            Payload::Object(map) => map.borrow().len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---------------------------------------------------------------------
    // Identity and raw handles
    // ---------------------------------------------------------------------

    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn as_ptr(&self) -> *const ValueCell {
        Rc::as_ptr(&self.0)
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn downgrade(&self) -> WeakValue {
        WeakValue(Rc::downgrade(&self.0))
    }

    /// Hands ownership of this handle to foreign code.
    pub fn into_raw(self) -> *const ValueCell {
        Rc::into_raw(self.0)
    }

    /// Takes back a handle produced by [`Value::into_raw`].
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and must not be used again by the
    /// caller afterwards.
    pub unsafe fn from_raw(ptr: *const ValueCell) -> Value {
        Value(unsafe { Rc::from_raw(ptr) })
    }

    /// New handle to a cell borrowed from foreign code, leaving the caller's
    /// reference intact.
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and still be alive.
    pub unsafe fn clone_from_raw(ptr: *const ValueCell) -> Value {
        unsafe {
            Rc::increment_strong_count(ptr);
            Value(Rc::from_raw(ptr))
        }
    }
}

// -------------------------------------------------------------------------
// Conversions and formatting
// -------------------------------------------------------------------------

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print::render(self, false))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print::render_nested(self, false))
    }
}

const STRUCTURAL_EQ_DEPTH: usize = 256;

/// Structural comparison used by `==` in Rust code and tests. Kinds must
/// match exactly; functions compare by identity. Language-level equality with
/// coercion lives in `arith::equals`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, 0)
    }
}

fn structural_eq(a: &Value, b: &Value, depth: usize) -> bool {
    if Value::ptr_eq(a, b) {
        return true;
    }
    if depth > STRUCTURAL_EQ_DEPTH {
        return false;
    }
    match (a.payload(), b.payload()) {
        (Payload::Number(x), Payload::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Payload::Bool(x), Payload::Bool(y)) => x == y,
        (Payload::Null, Payload::Null) | (Payload::Undefined, Payload::Undefined) => true,
        (Payload::Text(x), Payload::Text(y)) => x.as_str() == y.as_str(),
        (Payload::Array(x), Payload::Array(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y.iter())
                    .all(|(l, r)| structural_eq(l, r, depth + 1))
        }
        (Payload::Object(x), Payload::Object(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(key, l)| match y.get(key) {
                    Some(r) => structural_eq(l, r, depth + 1),
                    None => false,
                })
        }
        (Payload::Ext(x), Payload::Ext(y)) => *x.borrow() == *y.borrow(),
        (Payload::Cell(x), Payload::Cell(y)) => structural_eq(&x.borrow(), &y.borrow(), depth + 1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_cell() {
        let a = Value::array(vec![Value::number(1.0)]);
        let b = a.clone();
        assert!(Value::ptr_eq(&a, &b));
        assert_eq!(a.strong_count(), 2);
        drop(b);
        assert_eq!(a.strong_count(), 1);
    }

    #[test]
    fn typed_null_keeps_declared_kind() {
        let v = Value::null_typed(Kind::Number);
        assert_eq!(v.kind(), Kind::Null);
        assert_eq!(v.declared_kind(), Kind::Number);
        assert!(!v.is_immortal());
        assert!(Value::null_typed(Kind::Null).is_immortal());
    }

    #[test]
    fn static_and_owned_text() {
        let s = Value::static_str("lit\0eral");
        assert_eq!(s.lifetime(), Lifetime::StaticConstant);
        assert_eq!(s.as_text().map(Text::byte_len), Some(8));
        let o = Value::string(String::from("héllo"));
        assert_eq!(o.lifetime(), Lifetime::None);
        assert_eq!(o.len(), 5);
    }

    #[test]
    fn cell_reads_and_writes_through() {
        let cell = Value::cell(Value::number(1.0));
        assert_eq!(cell.kind(), Kind::Number);
        assert!(cell.cell_set(Value::string("x")));
        assert_eq!(cell.cell_get(), Value::string("x"));
        assert_eq!(cell.kind(), Kind::String);
        assert!(!Value::number(3.0).cell_set(Value::null()));
    }

    #[test]
    fn structural_equality_ignores_identity() {
        let a = Value::array(vec![Value::number(1.5), Value::string("a")]);
        let b = Value::array(vec![Value::number(1.5), Value::string("a")]);
        assert!(!Value::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, Value::array(vec![Value::number(1.5)]));
        assert_ne!(Value::number(0.0), Value::bool(false));
    }

    #[test]
    fn raw_round_trip_keeps_count() {
        let v = Value::string("raw");
        let keep = v.clone();
        let ptr = v.into_raw();
        assert_eq!(keep.strong_count(), 2);
        let borrowed = unsafe { Value::clone_from_raw(ptr) };
        assert_eq!(keep.strong_count(), 3);
        drop(borrowed);
        drop(unsafe { Value::from_raw(ptr) });
        assert_eq!(keep.strong_count(), 1);
    }
}
