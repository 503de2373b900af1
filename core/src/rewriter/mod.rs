//! Binding of free identifiers to a host environment.
//!
//! The front-end leaves every identifier it resolved through
//! [`CompilerContext::find_variable`](crate::frontend::CompilerContext::find_variable)
//! as a [`Param`] node. Rewriting replaces those nodes with
//! [`ExprKind::Binding`] nodes for a concrete [`Scope`] chain, producing a new
//! tree that shares every subtree it did not have to change.
//!
//! Two modes exist:
//!
//! - **Strict** runs on fresh front-end output. Names the environment does not
//!   know are compiler temporaries and stay as they are; an ambiguous name is
//!   an error.
//! - **Speculative** runs on a cached tree compiled against another
//!   environment. Any name that is missing, ambiguous or typed differently
//!   aborts the whole rewrite, and the caller falls back to a fresh compile.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

use crate::environment::{Resolution, Scope, resolve};
use crate::tree::{ElementInit, Expr, ExprKind, MemberBinding, Param, ParamId};

#[cfg(test)]
mod rewriter_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RewriteMode {
    Strict,
    Speculative,
}

/// Why a speculative rewrite gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AbortReason {
    Unresolved(String),
    Ambiguous(String),
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Unresolved(name) => write!(f, "`{}` is not in the environment", name),
            AbortReason::Ambiguous(name) => write!(f, "`{}` is ambiguous", name),
            AbortReason::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "`{}` has type {} but the tree expects {}", name, found, expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum RewriteError {
    #[error("speculative rewrite aborted: {0}")]
    Abort(AbortReason),

    #[error("`{name}` is ambiguous in the environment")]
    Ambiguous { name: String },
}

type Rewritten<T> = Result<Option<T>, RewriteError>;

/// Rewrites `tree` against `environment`.
///
/// Returns the input handle itself when nothing needed binding.
pub(crate) fn rewrite(
    tree: &Expr,
    environment: &Scope,
    mode: RewriteMode,
) -> Result<Expr, RewriteError> {
    let mut rewriter = Rewriter {
        environment,
        mode,
        bound: SmallVec::new(),
    };
    Ok(rewriter.visit(tree)?.unwrap_or_else(|| tree.clone()))
}

struct Rewriter<'a> {
    environment: &'a Scope,
    mode: RewriteMode,
    /// Parameters and locals of the enclosing lambdas and blocks.
    bound: SmallVec<[ParamId; 8]>,
}

impl Rewriter<'_> {
    /// `Ok(None)` means the node is unchanged.
    fn visit(&mut self, expr: &Expr) -> Rewritten<Expr> {
        let kind = match expr.kind() {
            ExprKind::Constant(_) | ExprKind::Binding(_) => return Ok(None),

            ExprKind::Param(param) => return self.bind(param),

            ExprKind::Binary {
                op,
                checked,
                left,
                right,
                method,
                conversion,
            } => {
                let new_left = self.visit(left)?;
                let new_right = self.visit(right)?;
                let new_conversion = self.visit_opt(conversion.as_ref())?;
                if new_left.is_none() && new_right.is_none() && new_conversion.is_none() {
                    return Ok(None);
                }
                ExprKind::Binary {
                    op: *op,
                    checked: *checked,
                    left: keep(new_left, left),
                    right: keep(new_right, right),
                    method: method.clone(),
                    conversion: new_conversion.or_else(|| conversion.clone()),
                }
            }

            ExprKind::Unary {
                op,
                checked,
                operand,
                method,
            } => {
                let Some(operand) = self.visit(operand)? else {
                    return Ok(None);
                };
                ExprKind::Unary {
                    op: *op,
                    checked: *checked,
                    operand,
                    method: method.clone(),
                }
            }

            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let new_test = self.visit(test)?;
                let new_true = self.visit(if_true)?;
                let new_false = self.visit(if_false)?;
                if new_test.is_none() && new_true.is_none() && new_false.is_none() {
                    return Ok(None);
                }
                ExprKind::Conditional {
                    test: keep(new_test, test),
                    if_true: keep(new_true, if_true),
                    if_false: keep(new_false, if_false),
                }
            }

            ExprKind::Invoke { callee, args } => {
                let new_callee = self.visit(callee)?;
                let new_args = self.visit_all(args)?;
                if new_callee.is_none() && new_args.is_none() {
                    return Ok(None);
                }
                ExprKind::Invoke {
                    callee: keep(new_callee, callee),
                    args: new_args.unwrap_or_else(|| args.clone()),
                }
            }

            ExprKind::Lambda { params, body } => {
                let Some(body) = self.with_bound(params, |this| this.visit(body))? else {
                    return Ok(None);
                };
                ExprKind::Lambda {
                    params: params.clone(),
                    body,
                }
            }

            ExprKind::ListInit { new, initializers } => {
                let new_new = self.visit(new)?;
                let new_inits = self.visit_inits(initializers)?;
                if new_new.is_none() && new_inits.is_none() {
                    return Ok(None);
                }
                ExprKind::ListInit {
                    new: keep(new_new, new),
                    initializers: new_inits.unwrap_or_else(|| initializers.clone()),
                }
            }

            ExprKind::Member { target, member } => {
                let Some(target) = self.visit_opt(target.as_ref())? else {
                    return Ok(None);
                };
                ExprKind::Member {
                    target: Some(target),
                    member: member.clone(),
                }
            }

            ExprKind::MemberInit { new, bindings } => {
                let new_new = self.visit(new)?;
                let new_bindings = self.visit_bindings(bindings)?;
                if new_new.is_none() && new_bindings.is_none() {
                    return Ok(None);
                }
                ExprKind::MemberInit {
                    new: keep(new_new, new),
                    bindings: new_bindings.unwrap_or_else(|| bindings.clone()),
                }
            }

            ExprKind::Index { target, indices } => {
                let new_target = self.visit(target)?;
                let new_indices = self.visit_all(indices)?;
                if new_target.is_none() && new_indices.is_none() {
                    return Ok(None);
                }
                ExprKind::Index {
                    target: keep(new_target, target),
                    indices: new_indices.unwrap_or_else(|| indices.clone()),
                }
            }

            ExprKind::Call {
                target,
                method,
                args,
            } => {
                let new_target = self.visit_opt(target.as_ref())?;
                let new_args = self.visit_all(args)?;
                if new_target.is_none() && new_args.is_none() {
                    return Ok(None);
                }
                ExprKind::Call {
                    target: new_target.or_else(|| target.clone()),
                    method: method.clone(),
                    args: new_args.unwrap_or_else(|| args.clone()),
                }
            }

            ExprKind::NewArrayInit { elements } => match self.visit_all(elements)? {
                Some(elements) => ExprKind::NewArrayInit { elements },
                None => return Ok(None),
            },

            ExprKind::NewArrayBounds { bounds } => match self.visit_all(bounds)? {
                Some(bounds) => ExprKind::NewArrayBounds { bounds },
                None => return Ok(None),
            },

            ExprKind::New { ctor, args } => match self.visit_all(args)? {
                Some(args) => ExprKind::New {
                    ctor: ctor.clone(),
                    args,
                },
                None => return Ok(None),
            },

            ExprKind::TypeIs { operand, test_ty } => {
                let Some(operand) = self.visit(operand)? else {
                    return Ok(None);
                };
                ExprKind::TypeIs {
                    operand,
                    test_ty: test_ty.clone(),
                }
            }

            ExprKind::Block { locals, body } => {
                let Some(body) = self.with_bound(locals, |this| this.visit_all(body))? else {
                    return Ok(None);
                };
                ExprKind::Block {
                    locals: locals.clone(),
                    body,
                }
            }

            ExprKind::Assign { target, value } => {
                let new_target = self.visit(target)?;
                let new_value = self.visit(value)?;
                if new_target.is_none() && new_value.is_none() {
                    return Ok(None);
                }
                ExprKind::Assign {
                    target: keep(new_target, target),
                    value: keep(new_value, value),
                }
            }
        };
        Ok(Some(Expr::new(expr.ty().clone(), kind)))
    }

    fn visit_opt(&mut self, expr: Option<&Expr>) -> Rewritten<Expr> {
        match expr {
            Some(expr) => self.visit(expr),
            None => Ok(None),
        }
    }

    fn visit_all(&mut self, exprs: &[Expr]) -> Rewritten<Vec<Expr>> {
        rewrite_each(exprs, |expr| self.visit(expr))
    }

    fn visit_inits(&mut self, inits: &[ElementInit]) -> Rewritten<Vec<ElementInit>> {
        rewrite_each(inits, |init| {
            Ok(self.visit_all(&init.args)?.map(|args| ElementInit {
                add: init.add.clone(),
                args,
            }))
        })
    }

    fn visit_bindings(&mut self, bindings: &[MemberBinding]) -> Rewritten<Vec<MemberBinding>> {
        rewrite_each(bindings, |binding| {
            Ok(match binding {
                MemberBinding::Assign { member, value } => {
                    self.visit(value)?.map(|value| MemberBinding::Assign {
                        member: member.clone(),
                        value,
                    })
                }
                MemberBinding::List {
                    member,
                    initializers,
                } => self
                    .visit_inits(initializers)?
                    .map(|initializers| MemberBinding::List {
                        member: member.clone(),
                        initializers,
                    }),
                MemberBinding::Member { member, bindings } => {
                    self.visit_bindings(bindings)?
                        .map(|bindings| MemberBinding::Member {
                            member: member.clone(),
                            bindings,
                        })
                }
            })
        })
    }

    /// Runs `f` with `params` in scope, so they are not looked up in the
    /// environment.
    fn with_bound<T>(
        &mut self,
        params: &[Param],
        f: impl FnOnce(&mut Self) -> Rewritten<T>,
    ) -> Rewritten<T> {
        let depth = self.bound.len();
        self.bound.extend(params.iter().map(Param::id));
        let result = f(self);
        self.bound.truncate(depth);
        result
    }

    fn bind(&self, param: &Param) -> Rewritten<Expr> {
        if self.bound.contains(&param.id()) {
            return Ok(None);
        }

        let name = param.name().as_str();
        match (resolve(self.environment, name), self.mode) {
            (Resolution::Found(binding), RewriteMode::Speculative)
                if binding.ty() != param.ty() =>
            {
                Err(RewriteError::Abort(AbortReason::TypeMismatch {
                    name: name.to_string(),
                    expected: param.ty().to_string(),
                    found: binding.ty().to_string(),
                }))
            }
            (Resolution::Found(binding), _) => {
                trace!(name, binding = ?binding.id(), "Bound identifier");
                Ok(Some(Expr::binding(binding)))
            }
            (Resolution::Ambiguous(..), RewriteMode::Strict) => Err(RewriteError::Ambiguous {
                name: name.to_string(),
            }),
            (Resolution::Ambiguous(..), RewriteMode::Speculative) => Err(RewriteError::Abort(
                AbortReason::Ambiguous(name.to_string()),
            )),
            // A temporary introduced by the front-end.
            (Resolution::NotFound, RewriteMode::Strict) => Ok(None),
            (Resolution::NotFound, RewriteMode::Speculative) => Err(RewriteError::Abort(
                AbortReason::Unresolved(name.to_string()),
            )),
        }
    }
}

fn keep(changed: Option<Expr>, original: &Expr) -> Expr {
    changed.unwrap_or_else(|| original.clone())
}

/// Applies `f` to each item, allocating a new list only once some item
/// changes.
fn rewrite_each<T: Clone>(
    items: &[T],
    mut f: impl FnMut(&T) -> Rewritten<T>,
) -> Rewritten<Vec<T>> {
    let mut out: Option<Vec<T>> = None;
    for (i, item) in items.iter().enumerate() {
        let changed = f(item)?;
        if let Some(list) = out.as_mut() {
            list.push(changed.unwrap_or_else(|| item.clone()));
        } else if let Some(new) = changed {
            let mut list = Vec::with_capacity(items.len());
            list.extend_from_slice(&items[..i]);
            list.push(new);
            out = Some(list);
        }
    }
    Ok(out)
}
