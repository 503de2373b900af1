//! Compiled expressions.

use std::fmt;
use std::sync::Arc;

use quill_types::Ty;

use super::{Error, ReferenceSet, RunOptions, RunOptionsOverride};
use crate::cache::TypeClosureCache;
use crate::evaluator::{Evaluator, EvaluatorOptions, ExecutionError};
use crate::tree::Expr;
use crate::values::{Activation, Value};

/// How a [`CompiledExpression`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOrigin {
    /// The text was blank; the expression yields the default value.
    Empty,
    /// A cached raw tree was rebound to the environment.
    Shortcut,
    /// The front-end compiled the text.
    Fresh,
}

/// An expression bound to an environment, ready to run against any
/// [`Activation`] of that environment.
///
/// Compiled expressions own their tree and can be run any number of times,
/// from any thread.
#[derive(Clone)]
pub struct CompiledExpression {
    text: Arc<str>,
    result_ty: Option<Ty>,
    tree: Option<Expr>,
    origin: CompileOrigin,
    location: bool,
    default_run_options: RunOptions,
}

impl CompiledExpression {
    pub(crate) fn new(
        text: &str,
        result_ty: Option<Ty>,
        tree: Expr,
        origin: CompileOrigin,
        default_run_options: RunOptions,
    ) -> Self {
        Self {
            text: Arc::from(text),
            result_ty,
            tree: Some(tree),
            origin,
            location: false,
            default_run_options,
        }
    }

    /// An expression that always evaluates to the default of `result_ty`.
    pub(crate) fn empty(
        text: &str,
        result_ty: Option<Ty>,
        default_run_options: RunOptions,
    ) -> Self {
        Self {
            text: Arc::from(text),
            result_ty,
            tree: None,
            origin: CompileOrigin::Empty,
            location: false,
            default_run_options,
        }
    }

    /// Marks the expression as an assignable location.
    pub(crate) fn into_location(mut self) -> Self {
        self.location = true;
        self
    }

    /// Runs the expression with the default run options.
    pub fn evaluate(&self, activation: &mut Activation) -> Result<Value, Error> {
        self.run(RunOptionsOverride::default(), activation)
    }

    /// Runs the expression against `activation`.
    ///
    /// Assignments to environment variables are written back to the
    /// activation.
    pub fn run(
        &self,
        options_override: RunOptionsOverride,
        activation: &mut Activation,
    ) -> Result<Value, Error> {
        let Some(tree) = &self.tree else {
            return Ok(self.result_ty.as_ref().map_or(Value::Unit, Value::default_for));
        };

        let mut run_options = self.default_run_options.clone();
        run_options.override_with(&options_override);
        let evaluator_opts = EvaluatorOptions {
            max_depth: run_options.max_depth,
        };

        let mut evaluator = Evaluator::new(evaluator_opts, activation);
        evaluator.eval(tree).map_err(Error::from)
    }

    /// Writes `value` to the location the expression denotes.
    ///
    /// Only expressions compiled with
    /// [`CompileOptions::location`](super::CompileOptions::location) are
    /// assignable; others fail with [`ExecutionError::InvalidAssignment`].
    pub fn assign(&self, activation: &mut Activation, value: Value) -> Result<(), Error> {
        let (true, Some(tree)) = (self.location, &self.tree) else {
            return Err(Error::Runtime(ExecutionError::InvalidAssignment));
        };
        let evaluator_opts = EvaluatorOptions {
            max_depth: self.default_run_options.max_depth,
        };
        Evaluator::new(evaluator_opts, activation)
            .assign(tree, value)
            .map_err(Error::from)
    }

    /// Whether the expression was compiled as an assignable location.
    pub fn is_location(&self) -> bool {
        self.location
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bound tree; `None` for blank text.
    pub fn tree(&self) -> Option<&Expr> {
        self.tree.as_ref()
    }

    /// The requested type, or the tree's own type for untyped compiles.
    pub fn result_type(&self) -> Option<&Ty> {
        self.result_ty
            .as_ref()
            .or_else(|| self.tree.as_ref().map(Expr::ty))
    }

    pub fn origin(&self) -> CompileOrigin {
        self.origin
    }

    /// Types and libraries the expression depends on.
    pub fn references(&self, closures: &TypeClosureCache) -> ReferenceSet {
        match &self.tree {
            Some(tree) => ReferenceSet::collect(tree, closures),
            None => ReferenceSet::default(),
        }
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("text", &self.text)
            .field("result_ty", &self.result_type())
            .field("origin", &self.origin)
            .field("location", &self.location)
            .field("tree", &self.tree)
            .finish()
    }
}
