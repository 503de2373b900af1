//! Runtime values and the storage artifacts are evaluated against.

mod activation;
mod function;
mod value;

pub use activation::Activation;
pub use function::NativeFn;
pub use value::{Closure, ListRef, ObjectRef, Value};

#[cfg(test)]
mod value_test;
