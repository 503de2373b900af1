//! Public API for compiling and running Quill expressions.
//!
//! An [`Engine`] turns expression text into a [`CompiledExpression`] bound to
//! a host [`Scope`](crate::environment::Scope) chain. The grammar itself is
//! supplied by the host through a
//! [`CompilerFactory`](crate::frontend::CompilerFactory).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quill_core::api::{Engine, EngineOptions};
//! use quill_core::environment::Scope;
//! use quill_core::frontend::{
//!     CompileOutput, CompilerContext, CompilerFactory, ExpressionCompiler, FrontEndError,
//! };
//! use quill_core::tree::{Expr, Param};
//! use quill_core::values::{Activation, Value};
//! use quill_types::{LibrarySet, Ty, TypeManager};
//!
//! /// Understands a single variable name.
//! struct NameOnly;
//!
//! impl ExpressionCompiler for NameOnly {
//!     fn compile_expression(
//!         &mut self,
//!         text: &str,
//!         context: &CompilerContext<'_>,
//!         _expected: Option<&Ty>,
//!     ) -> Result<CompileOutput, FrontEndError> {
//!         let ty = context
//!             .find_variable(text.trim())
//!             .ok_or_else(|| FrontEndError::new("unknown name"))?;
//!         Ok(CompileOutput {
//!             tree: Some(Expr::param(&Param::new(text.trim(), ty))),
//!             diagnostics: vec![],
//!         })
//!     }
//! }
//!
//! struct NameOnlyFactory;
//!
//! impl CompilerFactory for NameOnlyFactory {
//!     fn create(&self, _: &LibrarySet) -> Result<Box<dyn ExpressionCompiler>, FrontEndError> {
//!         Ok(Box::new(NameOnly))
//!     }
//! }
//!
//! let types = TypeManager::new();
//! let engine = Engine::new(EngineOptions::default(), Arc::new(NameOnlyFactory));
//! let env = Scope::root().bind("answer", types.int()).build();
//!
//! let expr = engine
//!     .compile(
//!         Default::default(),
//!         "answer",
//!         &types.int(),
//!         &env,
//!         &Default::default(),
//!         &Default::default(),
//!     )
//!     .unwrap();
//!
//! let mut activation = Activation::new().with(&env.bindings()[0], Value::Int(42));
//! assert_eq!(expr.evaluate(&mut activation).unwrap(), Value::Int(42));
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod options;
pub mod references;

pub use engine::Engine;
pub use error::{Diagnostic, Error, Severity};
pub use expression::{CompileOrigin, CompiledExpression};
pub use options::{
    CompileOptions, CompileOptionsOverride, EngineOptions, RunOptions, RunOptionsOverride,
};
pub use references::ReferenceSet;
