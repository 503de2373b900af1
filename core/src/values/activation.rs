use hashbrown::HashMap;

use super::Value;
use crate::environment::{Binding, BindingId};

/// Runtime storage for the variables of one environment instance.
///
/// A [`CompiledExpression`](crate::api::CompiledExpression) resolves its bound
/// variables by [`BindingId`], so the same artifact can run against any
/// activation created for the environment it was compiled with.
#[derive(Debug, Default, Clone)]
pub struct Activation {
    values: HashMap<BindingId, Value>,
}

impl Activation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent variant of [`set`](Self::set).
    pub fn with(mut self, binding: &Binding, value: Value) -> Self {
        self.set(binding, value);
        self
    }

    pub fn set(&mut self, binding: &Binding, value: Value) {
        self.values.insert(binding.id(), value);
    }

    pub fn get(&self, id: BindingId) -> Option<&Value> {
        self.values.get(&id)
    }

    pub(crate) fn store(&mut self, id: BindingId, value: Value) {
        self.values.insert(id, value);
    }
}
