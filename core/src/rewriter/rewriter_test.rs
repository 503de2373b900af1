use expect_test::expect;
use pretty_assertions::assert_eq;
use quill_types::{Ident, LibraryId, Ty, TypeManager};

use super::{AbortReason, RewriteError, RewriteMode, rewrite};
use crate::environment::{Scope, resolve};
use crate::tree::{
    BinaryOp, ElementInit, Expr, ExprKind, MemberBinding, MemberRef, MethodRef, Param,
};
use crate::values::{NativeFn, Value};

fn add(ty: &Ty, left: Expr, right: Expr) -> Expr {
    Expr::binary(ty.clone(), BinaryOp::Add, left, right)
}

fn free(name: &str, ty: &Ty) -> Expr {
    Expr::param(&Param::new(name, ty.clone()))
}

fn int(types: &TypeManager, n: i64) -> Expr {
    Expr::constant(types.int(), Value::Int(n))
}

fn bound_ids(expr: &Expr) -> Vec<String> {
    let mut names = Vec::new();
    crate::tree::for_each_node(expr, &mut |e| {
        if let ExprKind::Binding(b) = e.kind() {
            names.push(format!("{}:{}", b.name(), b.ty()));
        }
    });
    names
}

#[test]
fn test_strict_binds_free_identifiers() {
    let types = TypeManager::new();
    let ty = types.int();
    let env = Scope::root().bind("a", ty.clone()).bind("B", ty.clone()).build();
    let tree = add(&ty, free("a", &ty), free("b", &ty));

    let out = rewrite(&tree, &env, RewriteMode::Strict).unwrap();
    expect![[r#"(+ $a $B)"#]].assert_eq(&out.to_string());
    expect![[r#"(+ ?a ?b)"#]].assert_eq(&tree.to_string());
}

#[test]
fn test_strict_keeps_compiler_temporaries() {
    let types = TypeManager::new();
    let ty = types.int();
    let env = Scope::root().bind("a", ty.clone()).build();
    let tree = add(&ty, free("a", &ty), free("$tmp0", &ty));

    let out = rewrite(&tree, &env, RewriteMode::Strict).unwrap();
    expect![[r#"(+ $a ?$tmp0)"#]].assert_eq(&out.to_string());
}

#[test]
fn test_unchanged_tree_is_shared() {
    let types = TypeManager::new();
    let ty = types.int();
    let env = Scope::root().bind("a", ty.clone()).build();
    let constant = add(&ty, int(&types, 1), int(&types, 2));
    let tree = add(&ty, constant.clone(), free("a", &ty));

    let untouched = rewrite(&constant, &env, RewriteMode::Speculative).unwrap();
    assert!(Expr::ptr_eq(&untouched, &constant));

    let out = rewrite(&tree, &env, RewriteMode::Speculative).unwrap();
    match out.kind() {
        ExprKind::Binary { left, .. } => assert!(Expr::ptr_eq(left, &constant)),
        _ => panic!("expected a binary node"),
    }
}

#[test]
fn test_lambda_params_and_block_locals_are_not_resolved() {
    let types = TypeManager::new();
    let ty = types.int();
    // The environment has variables with the same names as the bound slots.
    let env = Scope::root()
        .bind("x", types.str())
        .bind("tmp", types.str())
        .bind("n", ty.clone())
        .build();

    let x = Param::new("x", ty.clone());
    let tmp = Param::new("tmp", ty.clone());
    let body = Expr::block(
        vec![tmp.clone()],
        vec![
            Expr::assign(Expr::param(&tmp), add(&ty, Expr::param(&x), free("n", &ty))),
            Expr::param(&tmp),
        ],
        ty.clone(),
    );
    let tree = Expr::lambda(ty.clone(), vec![x], body);

    for mode in [RewriteMode::Strict, RewriteMode::Speculative] {
        let out = rewrite(&tree, &env, mode).unwrap();
        expect![[r#"(lambda (x) (block (tmp) (:= ?tmp (+ ?x $n)) ?tmp))"#]]
            .assert_eq(&out.to_string());
    }
}

#[test]
fn test_parameters_go_out_of_scope_after_lambda() {
    let types = TypeManager::new();
    let ty = types.int();
    let env = Scope::root().bind("x", ty.clone()).build();

    let x = Param::new("x", ty.clone());
    let lambda = Expr::lambda(ty.clone(), vec![x.clone()], Expr::param(&x));
    // The same parameter object outside its lambda is a free identifier.
    let tree = Expr::new(
        ty.clone(),
        ExprKind::Invoke {
            callee: lambda,
            args: vec![Expr::param(&x)],
        },
    );

    let out = rewrite(&tree, &env, RewriteMode::Strict).unwrap();
    expect![[r#"(invoke (lambda (x) ?x) $x)"#]].assert_eq(&out.to_string());
}

#[test]
fn test_speculative_aborts() {
    let types = TypeManager::new();
    let ty = types.int();
    let tree = add(&ty, free("a", &ty), free("b", &ty));

    let missing = Scope::root().bind("a", ty.clone()).build();
    assert_eq!(
        rewrite(&tree, &missing, RewriteMode::Speculative).unwrap_err(),
        RewriteError::Abort(AbortReason::Unresolved("b".into()))
    );

    let mistyped = Scope::root()
        .bind("a", ty.clone())
        .bind("b", types.str())
        .build();
    assert_eq!(
        rewrite(&tree, &mistyped, RewriteMode::Speculative).unwrap_err(),
        RewriteError::Abort(AbortReason::TypeMismatch {
            name: "b".into(),
            expected: "int".into(),
            found: "str".into(),
        })
    );

    let ambiguous = Scope::root()
        .bind("a", ty.clone())
        .bind("A", ty.clone())
        .bind("b", ty.clone())
        .build();
    assert_eq!(
        rewrite(&tree, &ambiguous, RewriteMode::Speculative).unwrap_err(),
        RewriteError::Abort(AbortReason::Ambiguous("a".into()))
    );
}

#[test]
fn test_strict_ambiguity_is_an_error() {
    let types = TypeManager::new();
    let ty = types.int();
    let env = Scope::root()
        .bind("x", ty.clone())
        .bind("X", types.str())
        .build();
    let tree = free("x", &ty);

    assert_eq!(
        rewrite(&tree, &env, RewriteMode::Strict).unwrap_err(),
        RewriteError::Ambiguous { name: "x".into() }
    );
}

#[test]
fn test_inner_scope_wins() {
    let types = TypeManager::new();
    let outer = Scope::root().bind("x", types.str()).build();
    let inner = Scope::child(&outer).bind("x", types.int()).build();
    let tree = free("x", &types.int());

    let out = rewrite(&tree, &inner, RewriteMode::Speculative).unwrap();
    assert_eq!(bound_ids(&out), ["x:int"]);

    let Some(binding) = inner.get("x") else {
        panic!("inner binding missing");
    };
    match (out.kind(), resolve(&inner, "X")) {
        (ExprKind::Binding(b), crate::environment::Resolution::Found(found)) => {
            assert_eq!(b.id(), binding.id());
            assert_eq!(found.id(), binding.id());
        }
        _ => panic!("expected the inner binding"),
    }
}

#[test]
fn test_rewrites_inside_initializers() {
    let types = TypeManager::new();
    let app = LibraryId::new("app");
    let ty = types.int();
    let list = types.declare_generic_class("List", &app, 1);
    let list_of_int = types.instantiate(&list, &[ty.clone()]).unwrap();
    let order = types.declare_class("Order", &app);

    let add_method = MethodRef {
        name: Ident::new("Add"),
        declaring: list_of_int.clone(),
        ret: types.unit(),
        func: NativeFn::new("Add", |_, _| Ok(Value::Unit)),
    };
    let member = |name: &str, ty: &Ty| MemberRef {
        name: Ident::new(name),
        declaring: order.clone(),
        ty: ty.clone(),
        getter: None,
    };
    let new_order = Expr::new(order.clone(), ExprKind::New { ctor: None, args: vec![] });
    let tree = Expr::new(
        order.clone(),
        ExprKind::MemberInit {
            new: new_order,
            bindings: vec![
                MemberBinding::Assign {
                    member: member("Total", &ty),
                    value: int(&types, 0),
                },
                MemberBinding::List {
                    member: member("Lines", &list_of_int),
                    initializers: vec![
                        ElementInit {
                            add: add_method.clone(),
                            args: vec![int(&types, 1)],
                        },
                        ElementInit {
                            add: add_method,
                            args: vec![free("qty", &ty)],
                        },
                    ],
                },
            ],
        },
    );

    let env = Scope::root().bind("qty", ty.clone()).build();
    let out = rewrite(&tree, &env, RewriteMode::Strict).unwrap();
    expect![[r#"(member-init (new Order) (= Total 0) (= Lines { (Add 1) (Add $qty) }))"#]]
        .assert_eq(&out.to_string());

    // The unchanged binding is reused as is.
    match (tree.kind(), out.kind()) {
        (
            ExprKind::MemberInit { bindings: before, .. },
            ExprKind::MemberInit { bindings: after, .. },
        ) => match (&before[0], &after[0]) {
            (
                MemberBinding::Assign { value: v1, .. },
                MemberBinding::Assign { value: v2, .. },
            ) => assert!(Expr::ptr_eq(v1, v2)),
            _ => panic!("expected assignments"),
        },
        _ => panic!("expected member-init nodes"),
    }
}

#[test]
fn test_cached_tree_is_reusable_across_environments() {
    let types = TypeManager::new();
    let ty = types.int();
    let tree = add(&ty, free("a", &ty), free("b", &ty));

    let first = Scope::root().bind("a", ty.clone()).bind("b", ty.clone()).build();
    let second = Scope::root().bind("b", ty.clone()).bind("a", ty.clone()).build();

    let one = rewrite(&tree, &first, RewriteMode::Speculative).unwrap();
    let two = rewrite(&tree, &second, RewriteMode::Speculative).unwrap();
    assert_eq!(one.to_string(), two.to_string());
    assert!(!Expr::ptr_eq(&one, &two));
}
