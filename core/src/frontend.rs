//! Contract with the external front-end compiler.
//!
//! The front-end owns the grammar and type checking. It receives the text, a
//! [`CompilerContext`] describing what the text may reference, and an optional
//! expected type; it returns a raw tree whose free identifiers are still
//! [`ExprKind::Param`](crate::tree::ExprKind::Param) nodes, plus diagnostics.

use std::cell::RefCell;

use quill_types::{ImportSet, LibrarySet, Ty};
use thiserror::Error;

use crate::api::Diagnostic;
use crate::environment::{Resolution, Scope, resolve};
use crate::tree::Expr;

/// Failure of the front-end service itself, as opposed to diagnostics about
/// the compiled text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FrontEndError {
    pub message: String,
}

impl FrontEndError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a front-end produced for one text.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// `None` when compilation failed or the text produced no expression.
    pub tree: Option<Expr>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Ambiguous name recorded during variable lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ambiguity {
    pub name: String,
}

/// Compilation context handed to the front-end for one compile.
pub struct CompilerContext<'a> {
    environment: &'a Scope,
    imports: &'a ImportSet,
    libraries: &'a LibrarySet,
    ambiguity: RefCell<Option<Ambiguity>>,
}

impl<'a> CompilerContext<'a> {
    pub(crate) fn new(
        environment: &'a Scope,
        imports: &'a ImportSet,
        libraries: &'a LibrarySet,
    ) -> Self {
        Self {
            environment,
            imports,
            libraries,
            ambiguity: RefCell::new(None),
        }
    }

    /// Type of the environment variable `name`, if exactly one is visible.
    ///
    /// An ambiguous name yields `None` and is remembered; the compile then
    /// fails with an ambiguity error whatever the front-end reports.
    pub fn find_variable(&self, name: &str) -> Option<Ty> {
        match resolve(self.environment, name) {
            Resolution::Found(binding) => Some(binding.ty().clone()),
            Resolution::Ambiguous(..) => {
                let mut slot = self.ambiguity.borrow_mut();
                if slot.is_none() {
                    *slot = Some(Ambiguity {
                        name: name.to_string(),
                    });
                }
                None
            }
            Resolution::NotFound => None,
        }
    }

    pub fn imports(&self) -> &ImportSet {
        self.imports
    }

    pub fn libraries(&self) -> &LibrarySet {
        self.libraries
    }

    pub(crate) fn take_ambiguity(&self) -> Option<Ambiguity> {
        self.ambiguity.borrow_mut().take()
    }
}

/// A stateful front-end instance bound to one library set.
///
/// Instances are pooled and reused; the pool guarantees that at most one
/// thread calls into an instance at a time and that [`dispose`] is called
/// exactly once.
///
/// [`dispose`]: ExpressionCompiler::dispose
pub trait ExpressionCompiler: Send {
    fn compile_expression(
        &mut self,
        text: &str,
        context: &CompilerContext<'_>,
        expected: Option<&Ty>,
    ) -> Result<CompileOutput, FrontEndError>;

    /// Releases resources held by the instance.
    fn dispose(&mut self) -> Result<(), FrontEndError> {
        Ok(())
    }
}

/// Creates front-end instances for a library set.
pub trait CompilerFactory: Send + Sync {
    fn create(&self, libraries: &LibrarySet) -> Result<Box<dyn ExpressionCompiler>, FrontEndError>;
}
