//! Typed expression trees.
//!
//! Front-end compilers produce an [`Expr`]; the rewriter binds its free
//! identifiers to an environment and the evaluator executes the result. Trees
//! are immutable and reference counted, so a cached tree can be shared by any
//! number of rewritten trees that differ from it only in a few nodes.

mod display;
mod walk;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quill_types::{Ident, Ty};

use crate::environment::Binding;
use crate::values::{NativeFn, Value};

pub use walk::{for_each_child, for_each_node};

/// A typed expression node. Cloning is cheap and shares the node.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

struct ExprNode {
    ty: Ty,
    kind: ExprKind,
}

impl Expr {
    pub fn new(ty: Ty, kind: ExprKind) -> Self {
        Self(Arc::new(ExprNode { ty, kind }))
    }

    /// Static result type of the node.
    #[inline]
    pub fn ty(&self) -> &Ty {
        &self.0.ty
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(a: &Expr, b: &Expr) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn constant(ty: Ty, value: Value) -> Self {
        Self::new(ty, ExprKind::Constant(value))
    }

    /// Reference to a parameter or free identifier.
    pub fn param(param: &Param) -> Self {
        Self::new(param.ty.clone(), ExprKind::Param(param.clone()))
    }

    /// Reference to a resolved environment variable.
    pub fn binding(binding: &Binding) -> Self {
        Self::new(binding.ty().clone(), ExprKind::Binding(binding.clone()))
    }

    pub fn binary(ty: Ty, op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(
            ty,
            ExprKind::Binary {
                op,
                checked: false,
                left,
                right,
                method: None,
                conversion: None,
            },
        )
    }

    pub fn unary(ty: Ty, op: UnaryOp, operand: Expr) -> Self {
        Self::new(
            ty,
            ExprKind::Unary {
                op,
                checked: false,
                operand,
                method: None,
            },
        )
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        let ty = if_true.ty().clone();
        Self::new(
            ty,
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            },
        )
    }

    pub fn lambda(ty: Ty, params: Vec<Param>, body: Expr) -> Self {
        Self::new(ty, ExprKind::Lambda { params, body })
    }

    pub fn block(locals: Vec<Param>, body: Vec<Expr>, ty: Ty) -> Self {
        Self::new(ty, ExprKind::Block { locals, body })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        let ty = target.ty().clone();
        Self::new(ty, ExprKind::Assign { target, value })
    }

    /// Whether the node can be written to: an environment variable, a field
    /// without a getter, or an element of an indexed value, where every
    /// target along the way is itself a variable, member or element.
    pub fn is_location(&self) -> bool {
        match self.kind() {
            ExprKind::Binding(_) => true,
            ExprKind::Member {
                target: Some(target),
                member,
            } => member.getter.is_none() && target.is_location_path(),
            ExprKind::Index { target, .. } => target.is_location_path(),
            _ => false,
        }
    }

    // Intermediate steps may go through getters.
    fn is_location_path(&self) -> bool {
        match self.kind() {
            ExprKind::Binding(_) => true,
            ExprKind::Member {
                target: Some(target),
                ..
            }
            | ExprKind::Index { target, .. } => target.is_location_path(),
            _ => false,
        }
    }
}

/// Node payloads, one variant per construct the front-end can emit.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Arithmetic, logical, comparison and coalescing operators. `method`
    /// is a user-defined operator; `conversion` is the lambda applied to the
    /// left operand of a coalesce.
    Binary {
        op: BinaryOp,
        checked: bool,
        left: Expr,
        right: Expr,
        method: Option<MethodRef>,
        conversion: Option<Expr>,
    },
    Unary {
        op: UnaryOp,
        checked: bool,
        operand: Expr,
        method: Option<MethodRef>,
    },
    Conditional {
        test: Expr,
        if_true: Expr,
        if_false: Expr,
    },
    /// Calls a closure-valued expression.
    Invoke { callee: Expr, args: Vec<Expr> },
    Lambda { params: Vec<Param>, body: Expr },
    /// `new` followed by a collection initializer.
    ListInit {
        new: Expr,
        initializers: Vec<ElementInit>,
    },
    /// Field or property read; `target` is `None` for static members.
    Member {
        target: Option<Expr>,
        member: MemberRef,
    },
    /// `new` followed by an object initializer.
    MemberInit {
        new: Expr,
        bindings: Vec<MemberBinding>,
    },
    Index { target: Expr, indices: Vec<Expr> },
    /// Native method call; `target` is `None` for static methods.
    Call {
        target: Option<Expr>,
        method: MethodRef,
        args: Vec<Expr>,
    },
    /// Array built from its elements. The node type is the array type.
    NewArrayInit { elements: Vec<Expr> },
    /// Array of default elements with the given lengths. Each bound after
    /// the first adds a level of nesting, so the node type of `new T[2, 3]`
    /// is `T[][]`.
    NewArrayBounds { bounds: Vec<Expr> },
    /// Object construction. Without a constructor the node type's default
    /// value is produced.
    New {
        ctor: Option<CtorRef>,
        args: Vec<Expr>,
    },
    TypeIs { operand: Expr, test_ty: Ty },
    /// Local declarations and a statement sequence; yields the last value.
    Block { locals: Vec<Param>, body: Vec<Expr> },
    Assign { target: Expr, value: Expr },
    Constant(Value),
    /// Parameter, block local, or a free identifier left unresolved by the
    /// front-end.
    Param(Param),
    /// Variable resolved against a host environment.
    Binding(Binding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    ExclusiveOr,
    AndAlso,
    OrElse,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "mod",
            BinaryOp::Power => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::ExclusiveOr => "xor",
            BinaryOp::AndAlso => "andalso",
            BinaryOp::OrElse => "orelse",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Coalesce => "??",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    /// Conversion to the node type.
    Convert,
    /// Checked cast to the node type, yielding null on failure.
    TypeAs,
    ArrayLength,
    UnaryPlus,
    /// Yields the operand lambda itself rather than calling it.
    Quote,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "neg",
            UnaryOp::Not => "not",
            UnaryOp::Convert => "convert",
            UnaryOp::TypeAs => "as",
            UnaryOp::ArrayLength => "len",
            UnaryOp::UnaryPlus => "plus",
            UnaryOp::Quote => "quote",
        }
    }
}

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

/// A named slot introduced by a lambda or block, or a free identifier.
///
/// Identity is the [`ParamId`]: two parameters with the same name are
/// distinct unless one is a clone of the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    id: ParamId,
    name: Ident,
    ty: Ty,
}

impl Param {
    pub fn new(name: &str, ty: Ty) -> Self {
        Self {
            id: ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed)),
            name: Ident::new(name),
            ty,
        }
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }
}

/// A resolved method: operator overload, instance or static method, or the
/// `Add` method used by collection initializers.
#[derive(Debug, Clone)]
pub struct MethodRef {
    pub name: Ident,
    pub declaring: Ty,
    pub ret: Ty,
    pub func: NativeFn,
}

/// A resolved field or property. Members with a getter are computed by the
/// host; others are stored in the object's fields.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub name: Ident,
    pub declaring: Ty,
    pub ty: Ty,
    pub getter: Option<NativeFn>,
}

#[derive(Debug, Clone)]
pub struct CtorRef {
    pub declaring: Ty,
    pub func: NativeFn,
}

/// One `Add(args)` call of a collection initializer.
#[derive(Debug, Clone)]
pub struct ElementInit {
    pub add: MethodRef,
    pub args: Vec<Expr>,
}

/// One clause of an object initializer.
#[derive(Debug, Clone)]
pub enum MemberBinding {
    /// `member = value`
    Assign { member: MemberRef, value: Expr },
    /// `member = { a, b }`: adds to the collection already held by the member.
    List {
        member: MemberRef,
        initializers: Vec<ElementInit>,
    },
    /// `member = { field = value }`: initializes the object held by the member.
    Member {
        member: MemberRef,
        bindings: Vec<MemberBinding>,
    },
}

impl MemberBinding {
    pub fn member(&self) -> &MemberRef {
        match self {
            MemberBinding::Assign { member, .. }
            | MemberBinding::List { member, .. }
            | MemberBinding::Member { member, .. } => member,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use quill_types::TypeManager;

    #[test]
    fn test_render_nested_tree() {
        let types = TypeManager::new();
        let int = types.int();
        let x = Param::new("x", int.clone());
        let n = Param::new("n", int.clone());
        let body = Expr::binary(
            int.clone(),
            BinaryOp::Multiply,
            Expr::param(&x),
            Expr::param(&n),
        );
        let lambda = Expr::lambda(int.clone(), vec![x], body);
        let cond = Expr::conditional(
            Expr::binary(
                types.bool(),
                BinaryOp::GreaterThan,
                Expr::param(&n),
                Expr::constant(int.clone(), Value::Int(0)),
            ),
            lambda,
            Expr::constant(int, Value::Null),
        );

        expect![[r#"(if (> ?n 0) (lambda (x) (* ?x ?n)) null)"#]].assert_eq(&cond.to_string());
    }

    #[test]
    fn test_locations() {
        use crate::environment::Scope;
        use quill_types::LibraryId;

        let types = TypeManager::new();
        let order = types.declare_class("Order", &LibraryId::new("app"));
        let lines = types.array(&types.int());
        let env = Scope::root().bind("order", order.clone()).build();
        let var = Expr::binding(&env.bindings()[0]);
        let member = |target: Expr, name: &str, ty: Ty, getter: Option<NativeFn>| {
            Expr::new(
                ty.clone(),
                ExprKind::Member {
                    target: Some(target),
                    member: MemberRef {
                        name: Ident::new(name),
                        declaring: order.clone(),
                        ty,
                        getter,
                    },
                },
            )
        };
        let element = |target: Expr| {
            Expr::new(
                types.int(),
                ExprKind::Index {
                    target,
                    indices: vec![Expr::constant(types.int(), Value::Int(0))],
                },
            )
        };
        let computed = NativeFn::new("Lines", |_, _| Ok(Value::Null));

        assert!(var.is_location());
        assert!(member(var.clone(), "total", types.int(), None).is_location());
        assert!(element(member(var.clone(), "lines", lines.clone(), None)).is_location());
        // Reading through a getter is fine; writing to one is not.
        assert!(
            element(member(var.clone(), "lines", lines.clone(), Some(computed.clone())))
                .is_location()
        );
        assert!(!member(var.clone(), "lines", lines, Some(computed)).is_location());

        let sum = Expr::binary(types.int(), BinaryOp::Add, var.clone(), var);
        assert!(!sum.is_location());
        assert!(!element(sum).is_location());
        assert!(!Expr::constant(types.int(), Value::Int(1)).is_location());
        assert!(!Expr::param(&Param::new("x", types.int())).is_location());
    }

    #[test]
    fn test_param_identity() {
        let types = TypeManager::new();
        let a = Param::new("a", types.int());
        let b = Param::new("a", types.int());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
