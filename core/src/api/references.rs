//! Types and libraries a compiled expression depends on.

use quill_types::{LibrarySet, Ty, TySet};

use crate::cache::TypeClosureCache;
use crate::tree::{ElementInit, Expr, ExprKind, MemberBinding, for_each_node};

/// What must accompany a compiled expression for it to be hosted elsewhere:
/// every type it mentions together with their closures, and the libraries
/// defining them.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    types: TySet,
    libraries: LibrarySet,
}

impl ReferenceSet {
    pub fn types(&self) -> &TySet {
        &self.types
    }

    pub fn libraries(&self) -> &LibrarySet {
        &self.libraries
    }

    pub fn contains_type(&self, ty: &Ty) -> bool {
        self.types.contains(ty)
    }

    pub(crate) fn collect(tree: &Expr, closures: &TypeClosureCache) -> Self {
        let mut direct = TySet::new();
        for_each_node(tree, &mut |expr| mentioned_types(expr, &mut direct));

        let mut types = TySet::new();
        for ty in &direct {
            types.extend(closures.closure_of(ty).iter().cloned());
        }
        let libraries = types.iter().map(|ty| ty.library().clone()).collect();
        Self { types, libraries }
    }
}

fn mentioned_types(expr: &Expr, out: &mut TySet) {
    out.insert(expr.ty().clone());
    match expr.kind() {
        ExprKind::Binary {
            method: Some(method),
            ..
        }
        | ExprKind::Unary {
            method: Some(method),
            ..
        }
        | ExprKind::Call { method, .. } => {
            out.insert(method.declaring.clone());
            out.insert(method.ret.clone());
        }
        ExprKind::Member { member, .. } => {
            out.insert(member.declaring.clone());
        }
        ExprKind::ListInit { initializers, .. } => inits(initializers, out),
        ExprKind::MemberInit { bindings, .. } => member_bindings(bindings, out),
        ExprKind::New {
            ctor: Some(ctor), ..
        } => {
            out.insert(ctor.declaring.clone());
        }
        ExprKind::TypeIs { test_ty, .. } => {
            out.insert(test_ty.clone());
        }
        ExprKind::Lambda { params, .. } | ExprKind::Block { locals: params, .. } => {
            out.extend(params.iter().map(|p| p.ty().clone()));
        }
        _ => {}
    }
}

fn inits(initializers: &[ElementInit], out: &mut TySet) {
    for init in initializers {
        out.insert(init.add.declaring.clone());
    }
}

fn member_bindings(bindings: &[MemberBinding], out: &mut TySet) {
    for binding in bindings {
        let member = binding.member();
        out.insert(member.declaring.clone());
        out.insert(member.ty.clone());
        match binding {
            MemberBinding::Assign { .. } => {}
            MemberBinding::List { initializers, .. } => inits(initializers, out),
            MemberBinding::Member { bindings, .. } => member_bindings(bindings, out),
        }
    }
}
