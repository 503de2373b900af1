//! S-expression rendering of trees, used in logs and test snapshots.
//!
//! Free identifiers and parameters print as `?name`, environment bindings as
//! `$name`.

use std::fmt::{self, Display, Formatter};

use super::{ElementInit, Expr, ExprKind, MemberBinding, UnaryOp};

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Constant(value) => write!(f, "{}", value),
            ExprKind::Param(param) => write!(f, "?{}", param.name()),
            ExprKind::Binding(binding) => write!(f, "${}", binding.name()),
            ExprKind::Binary {
                op,
                checked,
                left,
                right,
                method,
                conversion,
            } => {
                write!(f, "({}{}", op.symbol(), if *checked { "!" } else { "" })?;
                if let Some(method) = method {
                    write!(f, "[{}]", method.name)?;
                }
                write!(f, " {} {}", left, right)?;
                if let Some(conversion) = conversion {
                    write!(f, " {}", conversion)?;
                }
                write!(f, ")")
            }
            ExprKind::Unary {
                op,
                checked,
                operand,
                method,
            } => {
                write!(f, "({}{}", op.name(), if *checked { "!" } else { "" })?;
                if let Some(method) = method {
                    write!(f, "[{}]", method.name)?;
                }
                write!(f, " {}", operand)?;
                if matches!(op, UnaryOp::Convert | UnaryOp::TypeAs) {
                    write!(f, " {}", self.ty())?;
                }
                write!(f, ")")
            }
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "(if {} {} {})", test, if_true, if_false),
            ExprKind::Invoke { callee, args } => {
                write!(f, "(invoke {}", callee)?;
                write_all(f, args)?;
                write!(f, ")")
            }
            ExprKind::Lambda { params, body } => {
                write!(f, "(lambda (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", param.name())?;
                }
                write!(f, ") {})", body)
            }
            ExprKind::ListInit { new, initializers } => {
                write!(f, "(list-init {}", new)?;
                write_inits(f, initializers)?;
                write!(f, ")")
            }
            ExprKind::Member { target, member } => match target {
                Some(target) => write!(f, "(. {} {})", target, member.name),
                None => write!(f, "(. {} {})", member.declaring, member.name),
            },
            ExprKind::MemberInit { new, bindings } => {
                write!(f, "(member-init {}", new)?;
                write_bindings(f, bindings)?;
                write!(f, ")")
            }
            ExprKind::Index { target, indices } => {
                write!(f, "(index {}", target)?;
                write_all(f, indices)?;
                write!(f, ")")
            }
            ExprKind::Call {
                target,
                method,
                args,
            } => {
                match target {
                    Some(target) => write!(f, "(call {} {}", target, method.name)?,
                    None => write!(f, "(call {} {}", method.declaring, method.name)?,
                }
                write_all(f, args)?;
                write!(f, ")")
            }
            ExprKind::NewArrayInit { elements } => {
                write!(f, "(array")?;
                write_all(f, elements)?;
                write!(f, ")")
            }
            ExprKind::NewArrayBounds { bounds } => {
                write!(f, "(array-bounds {}", self.ty())?;
                write_all(f, bounds)?;
                write!(f, ")")
            }
            ExprKind::New { args, .. } => {
                write!(f, "(new {}", self.ty())?;
                write_all(f, args)?;
                write!(f, ")")
            }
            ExprKind::TypeIs { operand, test_ty } => write!(f, "(is {} {})", operand, test_ty),
            ExprKind::Block { locals, body } => {
                write!(f, "(block (")?;
                for (i, local) in locals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", local.name())?;
                }
                write!(f, ")")?;
                write_all(f, body)?;
                write!(f, ")")
            }
            ExprKind::Assign { target, value } => write!(f, "(:= {} {})", target, value),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self, self.ty())
    }
}

fn write_all(f: &mut Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for expr in exprs {
        write!(f, " {}", expr)?;
    }
    Ok(())
}

fn write_inits(f: &mut Formatter<'_>, inits: &[ElementInit]) -> fmt::Result {
    for init in inits {
        write!(f, " ({}", init.add.name)?;
        write_all(f, &init.args)?;
        write!(f, ")")?;
    }
    Ok(())
}

fn write_bindings(f: &mut Formatter<'_>, bindings: &[MemberBinding]) -> fmt::Result {
    for binding in bindings {
        match binding {
            MemberBinding::Assign { member, value } => write!(f, " (= {} {})", member.name, value)?,
            MemberBinding::List {
                member,
                initializers,
            } => {
                write!(f, " (= {} {{", member.name)?;
                write_inits(f, initializers)?;
                write!(f, " }})")?;
            }
            MemberBinding::Member { member, bindings } => {
                write!(f, " (= {} {{", member.name)?;
                write_bindings(f, bindings)?;
                write!(f, " }})")?;
            }
        }
    }
    Ok(())
}
