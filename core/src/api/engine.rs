//! The Quill compilation engine.

use std::fmt;
use std::sync::Arc;

use quill_types::{ImportSet, LibrarySet, Ty};
use tracing::{debug, trace};

use super::expression::CompileOrigin;
use super::{
    CompileOptionsOverride, CompiledExpression, Diagnostic, EngineOptions, Error, ReferenceSet,
    Severity,
};
use crate::cache::{CompilerPool, EngineCaches, RawTreeKey};
use crate::environment::Scope;
use crate::frontend::{CompilerContext, CompilerFactory};
use crate::rewriter::{RewriteError, RewriteMode, rewrite};
use crate::tree::Expr;

/// Compiles expression text against host environments.
///
/// The engine owns a pool of front-end instances and shares its raw-tree and
/// type-closure caches through [`EngineCaches`]. Compiling the same text again
/// for an environment with the same variable names and types reuses the
/// cached raw tree instead of calling the front-end.
pub struct Engine {
    options: EngineOptions,
    pool: CompilerPool,
    caches: Arc<EngineCaches>,
}

impl Engine {
    /// Creates an engine backed by the process-wide caches of `factory`.
    ///
    /// Engines created over the same factory with the same cache capacities
    /// share raw trees and type closures.
    pub fn new(options: EngineOptions, factory: Arc<dyn CompilerFactory>) -> Self {
        let caches = EngineCaches::shared(&factory, &options);
        Self::with_caches(options, factory, caches)
    }

    /// Creates an engine backed by the given caches.
    pub fn with_caches(
        options: EngineOptions,
        factory: Arc<dyn CompilerFactory>,
        caches: Arc<EngineCaches>,
    ) -> Self {
        let pool = CompilerPool::new(factory, options.compiler_pool_capacity);
        Self {
            options,
            pool,
            caches,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn pool(&self) -> &CompilerPool {
        &self.pool
    }

    pub fn caches(&self) -> &EngineCaches {
        &self.caches
    }

    /// Compiles `text` to an expression of type `result_ty`.
    ///
    /// Free identifiers are bound to the variables of `environment`. Blank
    /// text yields an expression returning the default value of `result_ty`.
    pub fn compile(
        &self,
        options_override: CompileOptionsOverride,
        text: &str,
        result_ty: &Ty,
        environment: &Scope,
        imports: &ImportSet,
        references: &LibrarySet,
    ) -> Result<CompiledExpression, Error> {
        self.compile_impl(
            options_override,
            text,
            Some(result_ty),
            environment,
            imports,
            references,
        )
    }

    /// Compiles `text` without an expected type; the expression has whatever
    /// type the front-end infers.
    pub fn compile_untyped(
        &self,
        options_override: CompileOptionsOverride,
        text: &str,
        environment: &Scope,
        imports: &ImportSet,
        references: &LibrarySet,
    ) -> Result<CompiledExpression, Error> {
        self.compile_impl(options_override, text, None, environment, imports, references)
    }

    /// Types and libraries `expr` depends on.
    pub fn references(&self, expr: &CompiledExpression) -> ReferenceSet {
        expr.references(&self.caches.type_closures)
    }

    fn compile_impl(
        &self,
        options_override: CompileOptionsOverride,
        text: &str,
        result_ty: Option<&Ty>,
        environment: &Scope,
        imports: &ImportSet,
        references: &LibrarySet,
    ) -> Result<CompiledExpression, Error> {
        let mut options = self.options.default_compile_options.clone();
        options.override_with(&options_override);
        let run_options = self.options.default_run_options.clone();

        if text.trim().is_empty() {
            return Ok(CompiledExpression::empty(text, result_ty.cloned(), run_options));
        }

        let libraries = references.union(&self.options.default_libraries);
        let imports: ImportSet = imports
            .union(&self.options.default_imports)
            .iter()
            .filter(|name| !name.is_empty())
            .cloned()
            .collect();
        let key = RawTreeKey {
            text: Arc::from(text),
            result_ty: result_ty.cloned(),
            libraries: libraries.clone(),
            imports: imports.clone(),
        };

        let cached = if options.shortcut {
            self.caches.raw_trees.get(&key)
        } else {
            None
        };
        if let Some(slot) = &cached {
            match rewrite(&slot.load(), environment, RewriteMode::Speculative) {
                Ok(tree) if type_mismatch(&tree, result_ty).is_some() => debug!(
                    text,
                    tree_ty = %tree.ty(),
                    "Cached tree has the wrong type, compiling from scratch"
                ),
                Ok(tree) => {
                    debug!(text, "Reusing cached raw tree");
                    let expr = CompiledExpression::new(
                        text,
                        result_ty.cloned(),
                        tree,
                        CompileOrigin::Shortcut,
                        run_options,
                    );
                    return finish(expr, options.location);
                }
                Err(err) => debug!(text, error = %err, "Shortcut failed, compiling from scratch"),
            }
        } else {
            debug!(text, "Raw tree cache miss");
        }

        // The front-end must see the libraries defining the result type and
        // everything it depends on.
        let libraries = match result_ty {
            Some(ty) => libraries.union(&self.caches.type_closures.libraries_of(ty)),
            None => libraries,
        };

        let context = CompilerContext::new(environment, &imports, &libraries);
        let output = {
            let compiler = self
                .pool
                .acquire(&libraries)
                .map_err(|err| Error::PoolConstruction {
                    libraries: libraries.clone(),
                    reason: err.message,
                })?;
            compiler
                .compile(text, &context, result_ty)
                .map_err(|err| Error::FrontEnd {
                    text: text.to_string(),
                    reason: err.message,
                })?
        };

        if let Some(ambiguity) = context.take_ambiguity() {
            return Err(Error::AmbiguousBinding {
                text: text.to_string(),
                name: ambiguity.name,
            });
        }
        if output
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
        {
            return Err(Error::Compilation {
                text: text.to_string(),
                diagnostics: output.diagnostics,
            });
        }
        for diagnostic in &output.diagnostics {
            debug!(text, severity = %diagnostic.severity, message = %diagnostic.message, "Front-end diagnostic");
        }

        let Some(raw) = output.tree else {
            return Ok(CompiledExpression::empty(text, result_ty.cloned(), run_options));
        };
        trace!(text, tree = %raw, "Compiled raw tree");

        let tree = rewrite(&raw, environment, RewriteMode::Strict).map_err(|err| match err {
            RewriteError::Ambiguous { name } => Error::AmbiguousBinding {
                text: text.to_string(),
                name,
            },
            RewriteError::Abort(reason) => Error::Compilation {
                text: text.to_string(),
                diagnostics: vec![Diagnostic::error(reason.to_string())],
            },
        })?;
        if let Some(diagnostic) = type_mismatch(&tree, result_ty) {
            return Err(Error::Compilation {
                text: text.to_string(),
                diagnostics: vec![diagnostic],
            });
        }

        // Only trees that produced an artifact are offered to the shortcut.
        self.caches
            .raw_trees
            .store(key, cached.as_deref(), raw);

        let expr = CompiledExpression::new(
            text,
            result_ty.cloned(),
            tree,
            CompileOrigin::Fresh,
            run_options,
        );
        finish(expr, options.location)
    }
}

/// A diagnostic when `tree` does not have the requested type.
fn type_mismatch(tree: &Expr, expected: Option<&Ty>) -> Option<Diagnostic> {
    let expected = expected?;
    if tree.ty() == expected {
        return None;
    }
    Some(Diagnostic::error(format!(
        "expression has type {} but {} was expected",
        tree.ty(),
        expected
    )))
}

/// Applies location mode to a bound expression.
fn finish(expr: CompiledExpression, location: bool) -> Result<CompiledExpression, Error> {
    if !location {
        return Ok(expr);
    }
    if expr.tree().is_some_and(Expr::is_location) {
        return Ok(expr.into_location());
    }
    Err(Error::Compilation {
        text: expr.text().to_string(),
        diagnostics: vec![Diagnostic::error(
            "expression is not assignable: expected a variable, field or element",
        )],
    })
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Engine: Send, Sync);
