use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quill_types::{Ident, Ty};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a binding, unique for the life of the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    fn fresh() -> Self {
        Self(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingId({})", self.0)
    }
}

/// A named, typed variable declared in a scope.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    id: BindingId,
    name: Ident,
    ty: Ty,
}

impl Binding {
    pub fn new(name: &str, ty: Ty) -> Self {
        Self {
            id: BindingId::fresh(),
            name: Ident::new(name),
            ty,
        }
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({:?})", self.name, self.ty, self.id)
    }
}

/// One level of a scope chain.
#[derive(Debug)]
pub struct Scope {
    bindings: Vec<Binding>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// Starts a scope without a parent.
    pub fn root() -> ScopeBuilder {
        ScopeBuilder {
            bindings: Vec::new(),
            parent: None,
        }
    }

    /// Starts a scope nested inside `parent`.
    pub fn child(parent: &Arc<Scope>) -> ScopeBuilder {
        ScopeBuilder {
            bindings: Vec::new(),
            parent: Some(Arc::clone(parent)),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// First binding in this scope (not its parents) whose name matches.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name.matches(name))
    }

    /// This scope followed by its ancestors, innermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.parent.as_deref())
    }
}

/// Fluent builder for [`Scope`].
///
/// Duplicate names are accepted here; they are reported as ambiguous when an
/// expression refers to them.
///
/// # Example
///
/// ```
/// use quill_core::environment::Scope;
/// use quill_types::TypeManager;
///
/// let types = TypeManager::new();
/// let outer = Scope::root().bind("total", types.int()).build();
/// let inner = Scope::child(&outer).bind("item", types.str()).build();
///
/// assert_eq!(inner.chain().count(), 2);
/// assert!(inner.get("TOTAL").is_none());
/// assert!(outer.get("TOTAL").is_some());
/// ```
#[derive(Debug)]
pub struct ScopeBuilder {
    bindings: Vec<Binding>,
    parent: Option<Arc<Scope>>,
}

impl ScopeBuilder {
    pub fn bind(mut self, name: &str, ty: Ty) -> Self {
        self.bindings.push(Binding::new(name, ty));
        self
    }

    pub fn build(self) -> Arc<Scope> {
        Arc::new(Scope {
            bindings: self.bindings,
            parent: self.parent,
        })
    }
}
