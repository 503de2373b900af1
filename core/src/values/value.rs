use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use quill_types::{Ident, Scalar, Ty, TyKind};

use crate::tree::{Expr, Param, ParamId};

/// A runtime value.
///
/// Scalars are stored inline. Lists and objects have reference semantics:
/// clones share the same storage, so member-init and list-init mutate the
/// instance every holder sees.
#[derive(Clone)]
pub enum Value {
    /// Absence of a reference (default of reference types).
    Null,
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(ListRef),
    Object(ObjectRef),
    Closure(Closure),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// The value a variable of type `ty` holds before assignment.
    pub fn default_for(ty: &Ty) -> Self {
        match ty.kind() {
            TyKind::Scalar(Scalar::Unit) => Value::Unit,
            TyKind::Scalar(Scalar::Bool) => Value::Bool(false),
            TyKind::Scalar(Scalar::Int) => Value::Int(0),
            TyKind::Scalar(Scalar::Float) => Value::Float(0.0),
            _ if ty.is_value_type() => Value::Object(ObjectRef::new(ty.clone())),
            _ => Value::Null,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type test used by `is` and `as` expressions.
    pub fn is_instance_of(&self, ty: &Ty) -> bool {
        match self {
            Value::Null | Value::Closure(_) => false,
            Value::Unit => matches!(ty.kind(), TyKind::Scalar(Scalar::Unit)),
            Value::Bool(_) => matches!(ty.kind(), TyKind::Scalar(Scalar::Bool)),
            Value::Int(_) => matches!(ty.kind(), TyKind::Scalar(Scalar::Int)),
            Value::Float(_) => matches!(ty.kind(), TyKind::Scalar(Scalar::Float)),
            Value::Str(_) => matches!(ty.kind(), TyKind::Scalar(Scalar::Str)),
            Value::List(list) => list.ty().is_subtype_of(ty),
            Value::Object(obj) => obj.ty().is_subtype_of(ty),
        }
    }

    /// Short name of the value's variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Closure(_) => "closure",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(&a.items, &b.items),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::Closure(a), Value::Closure(b)) => Expr::ptr_eq(&a.body, &b.body),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(list) => {
                let addr = Arc::as_ptr(&list.items) as *const () as usize;
                guard_cycle(f, addr, |f| {
                    write!(f, "[")?;
                    for (i, item) in list.to_vec().iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", item)?;
                    }
                    write!(f, "]")
                })
            }
            Value::Object(obj) => {
                let addr = Arc::as_ptr(&obj.0) as *const () as usize;
                guard_cycle(f, addr, |f| {
                    // Sorted so output is stable regardless of assignment order.
                    let mut fields: Vec<(Ident, Value)> = obj
                        .0
                        .fields
                        .lock()
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect();
                    fields.sort_by(|a, b| a.0.cmp(&b.0));
                    write!(f, "{} {{", obj.ty())?;
                    for (i, (name, value)) in fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, " {}: {}", name, value)?;
                    }
                    write!(f, " }}")
                })
            }
            Value::Closure(closure) => write!(f, "<closure/{}>", closure.params.len()),
        }
    }
}

thread_local! {
    /// Lists and objects currently being formatted on this thread.
    static FORMATTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Formats a shared container, printing `...` when it contains itself.
///
/// Locks are released before nested values are formatted.
fn guard_cycle(
    f: &mut fmt::Formatter<'_>,
    addr: usize,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let entered = FORMATTING.with(|active| {
        let mut active = active.borrow_mut();
        if active.contains(&addr) {
            false
        } else {
            active.push(addr);
            true
        }
    });
    if !entered {
        return write!(f, "...");
    }
    let result = body(f);
    FORMATTING.with(|active| {
        active.borrow_mut().pop();
    });
    result
}

/// Shared, growable sequence (arrays and list collections).
#[derive(Clone)]
pub struct ListRef {
    ty: Ty,
    items: Arc<Mutex<Vec<Value>>>,
}

impl ListRef {
    pub fn new(ty: Ty, items: Vec<Value>) -> Self {
        Self {
            ty,
            items: Arc::new(Mutex::new(items)),
        }
    }

    /// The collection type (e.g. `int[]` or `List<int>`).
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.lock().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.lock().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.items.lock().push(value);
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.lock().clone()
    }
}

/// Shared instance of a class or struct, with named fields.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

struct ObjectData {
    ty: Ty,
    fields: Mutex<HashMap<Ident, Value>>,
}

impl ObjectRef {
    pub fn new(ty: Ty) -> Self {
        Self(Arc::new(ObjectData {
            ty,
            fields: Mutex::new(HashMap::new()),
        }))
    }

    pub fn ty(&self) -> &Ty {
        &self.0.ty
    }

    pub fn get(&self, field: &Ident) -> Option<Value> {
        self.0.fields.lock().get(field).cloned()
    }

    pub fn set(&self, field: Ident, value: Value) {
        self.0.fields.lock().insert(field, value);
    }
}

/// A lambda value together with the parameter values it captured.
#[derive(Clone)]
pub struct Closure {
    pub(crate) params: Arc<[Param]>,
    pub(crate) body: Expr,
    pub(crate) captured: Arc<[(ParamId, Value)]>,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
