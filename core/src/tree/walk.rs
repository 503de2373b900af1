use super::{ElementInit, Expr, ExprKind, MemberBinding};

/// Calls `f` on every direct sub-expression of `expr`, in evaluation order.
pub fn for_each_child(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    match expr.kind() {
        ExprKind::Constant(_) | ExprKind::Param(_) | ExprKind::Binding(_) => {}
        ExprKind::Binary {
            left,
            right,
            conversion,
            ..
        } => {
            f(left);
            f(right);
            if let Some(conversion) = conversion {
                f(conversion);
            }
        }
        ExprKind::Unary { operand, .. } => f(operand),
        ExprKind::Conditional {
            test,
            if_true,
            if_false,
        } => {
            f(test);
            f(if_true);
            f(if_false);
        }
        ExprKind::Invoke { callee, args } => {
            f(callee);
            args.iter().for_each(f);
        }
        ExprKind::Lambda { body, .. } => f(body),
        ExprKind::ListInit { new, initializers } => {
            f(new);
            inits(initializers, f);
        }
        ExprKind::Member { target, .. } => {
            if let Some(target) = target {
                f(target);
            }
        }
        ExprKind::MemberInit { new, bindings } => {
            f(new);
            member_bindings(bindings, f);
        }
        ExprKind::Index { target, indices } => {
            f(target);
            indices.iter().for_each(f);
        }
        ExprKind::Call { target, args, .. } => {
            if let Some(target) = target {
                f(target);
            }
            args.iter().for_each(f);
        }
        ExprKind::NewArrayInit { elements: exprs }
        | ExprKind::NewArrayBounds { bounds: exprs }
        | ExprKind::New { args: exprs, .. }
        | ExprKind::Block { body: exprs, .. } => exprs.iter().for_each(f),
        ExprKind::TypeIs { operand, .. } => f(operand),
        ExprKind::Assign { target, value } => {
            f(target);
            f(value);
        }
    }
}

/// Pre-order walk over `expr` and all of its descendants.
pub fn for_each_node(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    for_each_child(expr, &mut |child| for_each_node(child, &mut *f));
}

fn inits(initializers: &[ElementInit], f: &mut impl FnMut(&Expr)) {
    for init in initializers {
        init.args.iter().for_each(&mut *f);
    }
}

fn member_bindings(bindings: &[MemberBinding], f: &mut impl FnMut(&Expr)) {
    for binding in bindings {
        match binding {
            MemberBinding::Assign { value, .. } => f(value),
            MemberBinding::List { initializers, .. } => inits(initializers, &mut *f),
            MemberBinding::Member { bindings, .. } => member_bindings(bindings, &mut *f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BinaryOp, Param};
    use crate::values::Value;
    use indoc::indoc;
    use quill_types::TypeManager;

    #[test]
    fn test_preorder_visits_every_node() {
        let types = TypeManager::new();
        let int = types.int();
        let a = Param::new("a", int.clone());
        let sum = Expr::binary(
            int.clone(),
            BinaryOp::Add,
            Expr::param(&a),
            Expr::constant(int.clone(), Value::Int(1)),
        );
        let block = Expr::block(vec![], vec![sum.clone(), Expr::param(&a)], int);

        let mut seen = Vec::new();
        for_each_node(&block, &mut |e| seen.push(format!("{:?}", e)));
        assert_eq!(
            seen.join("\n"),
            indoc! {"
                (block () (+ ?a 1) ?a): int
                (+ ?a 1): int
                ?a: int
                1: int
                ?a: int"}
        );
    }
}
