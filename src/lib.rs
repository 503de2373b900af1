//! Quill - compile host-language expressions against live environments
//!
//! # Overview
//!
//! Quill turns short expression strings embedded in a host application into
//! executable trees bound to the application's variables. Common use cases
//! include:
//!
//! - Data-binding and calculated fields in forms
//! - Conditions in workflow designers
//! - Report formulas
//!
//! The grammar is supplied by the host through a [`CompilerFactory`]. Quill
//! pools the front-end instances, caches the raw trees they produce and
//! rebinds a cached tree to a new environment without calling the front-end
//! again whenever the variable names and types line up.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use quill::{
//!     Activation, CompileOrigin, CompileOutput, CompilerContext, CompilerFactory, Engine,
//!     EngineOptions, Expr, ExpressionCompiler, FrontEndError, LibrarySet, Param, Scope, Ty,
//!     TypeManager, Value,
//! };
//!
//! struct NameOnly;
//!
//! impl ExpressionCompiler for NameOnly {
//!     fn compile_expression(
//!         &mut self,
//!         text: &str,
//!         context: &CompilerContext<'_>,
//!         _expected: Option<&Ty>,
//!     ) -> Result<CompileOutput, FrontEndError> {
//!         let name = text.trim();
//!         let ty = context
//!             .find_variable(name)
//!             .ok_or_else(|| FrontEndError::new("unknown name"))?;
//!         Ok(CompileOutput {
//!             tree: Some(Expr::param(&Param::new(name, ty))),
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
//!
//! // Two instances of the same form share one front-end compile.
//! for total in [10, 20] {
//!     let form = Scope::root().bind("order_total", types.int()).build();
//!     let expr = engine
//!         .compile(
//!             Default::default(),
//!             "order_total",
//!             &types.int(),
//!             &form,
//!             &Default::default(),
//!             &Default::default(),
//!         )
//!         .unwrap();
//!     let mut activation = Activation::new().with(&form.bindings()[0], Value::Int(total));
//!     assert_eq!(expr.evaluate(&mut activation).unwrap(), Value::Int(total));
//!     if total == 20 {
//!         assert_eq!(expr.origin(), CompileOrigin::Shortcut);
//!     }
//! }
//! ```

pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

pub use quill_core::api::{
    CompileOptions, CompileOptionsOverride, CompileOrigin, CompiledExpression, Diagnostic, Engine,
    EngineOptions, Error, ReferenceSet, RunOptions, RunOptionsOverride, Severity,
};
pub use quill_core::cache::EngineCaches;
pub use quill_core::environment::{Binding, Scope, ScopeBuilder};
pub use quill_core::evaluator::ExecutionError;
pub use quill_core::frontend::{
    CompileOutput, CompilerContext, CompilerFactory, ExpressionCompiler, FrontEndError,
};
pub use quill_core::tree::{self, Expr, Param};
pub use quill_core::values::{self, Activation, NativeFn, Value};
pub use quill_types::{ImportSet, LibraryId, LibrarySet, Ty, TypeManager};
