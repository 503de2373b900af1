//! Native functions referenced from expression trees.
//!
//! Front-ends resolve method calls, operator overloads, constructors and
//! computed members to host functions. The tree carries them as [`NativeFn`]
//! handles so the evaluator can call back into the host.

use std::fmt;
use std::sync::Arc;

use super::Value;
use crate::evaluator::ExecutionError;

type NativeFnPtr = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, ExecutionError> + Send + Sync;

/// A host function callable from an expression.
///
/// The first argument is the receiver (`None` for static functions and
/// constructors), followed by the evaluated arguments.
///
/// # Example
///
/// ```
/// use quill_core::values::{NativeFn, Value};
///
/// let twice = NativeFn::new("twice", |_, args| match args {
///     [Value::Int(n)] => Ok(Value::Int(n * 2)),
///     _ => unreachable!(),
/// });
/// assert_eq!(twice.call(None, &[Value::Int(21)]).unwrap(), Value::Int(42));
/// ```
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    func: Arc<NativeFnPtr>,
}

impl NativeFn {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, ExecutionError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn call(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, ExecutionError> {
        (self.func)(receiver, args)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}
