use std::fmt;
use std::hash;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;
use string_cache::DefaultAtom;

use super::flags::TyFlags;
use super::kind::TyKind;
use super::library::LibraryId;

/// Set of types, e.g. the closure of a type over its edges.
pub type TySet = hashbrown::HashSet<Ty>;

/// Handle to an interned type.
///
/// Equality and hashing are by identity: two handles are equal iff they
/// point at the same node. The [`TypeManager`](crate::TypeManager) makes sure
/// structurally identical arrays and generic instantiations share a node.
#[derive(Clone)]
pub struct Ty(Arc<TyNode>);

impl Ty {
    pub(crate) fn new(node: TyNode) -> Self {
        Self(Arc::new(node))
    }

    pub fn node(&self) -> &TyNode {
        &self.0
    }

    pub fn kind(&self) -> &TyKind {
        &self.0.kind
    }

    pub fn flags(&self) -> TyFlags {
        self.0.flags
    }

    pub fn name(&self) -> &str {
        self.0.name.as_str()
    }

    pub fn library(&self) -> &LibraryId {
        &self.0.library
    }

    pub fn is_value_type(&self) -> bool {
        self.flags().contains(TyFlags::VALUE_TYPE)
    }

    pub fn is_interface(&self) -> bool {
        self.flags().contains(TyFlags::INTERFACE)
    }

    /// Base class, if supertypes were defined and the type has one.
    pub fn base(&self) -> Option<&Ty> {
        self.0.supertypes.get().and_then(|s| s.base.as_ref())
    }

    /// Directly implemented interfaces.
    pub fn interfaces(&self) -> &[Ty] {
        self.0
            .supertypes
            .get()
            .map(|s| s.interfaces.as_slice())
            .unwrap_or(&[])
    }

    /// Element type for arrays.
    pub fn element(&self) -> Option<&Ty> {
        match self.kind() {
            TyKind::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Type arguments for generic instantiations.
    pub fn generic_args(&self) -> &[Ty] {
        match self.kind() {
            TyKind::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// Returns true if `self` is `other` or derives from / implements it.
    pub fn is_subtype_of(&self, other: &Ty) -> bool {
        let mut pending: SmallVec<[&Ty; 8]> = SmallVec::new();
        let mut seen = TySet::new();
        pending.push(self);
        while let Some(ty) = pending.pop() {
            if ty == other {
                return true;
            }
            if !seen.insert(ty.clone()) {
                continue;
            }
            pending.extend(ty.base());
            pending.extend(ty.interfaces());
        }
        false
    }

    fn addr(&self) -> *const TyNode {
        Arc::as_ptr(&self.0)
    }
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Ty {}

impl hash::Hash for Ty {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TyKind::Array(elem) => write!(f, "{}[]", elem),
            TyKind::Generic { definition, args } => {
                write!(f, "{}<", definition.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({})", self)
    }
}

/// The data behind a [`Ty`] handle.
pub struct TyNode {
    name: Ident,
    library: LibraryId,
    kind: TyKind,
    flags: TyFlags,
    supertypes: OnceLock<Supertypes>,
}

impl TyNode {
    pub(crate) fn new(name: Ident, library: LibraryId, kind: TyKind) -> Self {
        let flags = kind.compute_flags();
        Self {
            name,
            library,
            kind,
            flags,
            supertypes: OnceLock::new(),
        }
    }

    pub(crate) fn with_flags(mut self, extra: TyFlags) -> Self {
        self.flags |= extra;
        self
    }

    /// Attaches supertypes. Returns false if they were already attached.
    pub(crate) fn set_supertypes(&self, supertypes: Supertypes) -> bool {
        self.supertypes.set(supertypes).is_ok()
    }
}

/// Base class and interfaces of a nominal type.
///
/// Attached after declaration so that a type may mention itself, as in
/// `Node : IComparable<Node>`.
#[derive(Debug, Clone, Default)]
pub struct Supertypes {
    pub base: Option<Ty>,
    pub interfaces: SmallVec<[Ty; 2]>,
}

/// Interned identifier used for type, member and variable names.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ident(DefaultAtom);

impl Ident {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(DefaultAtom::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Case-insensitive comparison used for variable lookup.
    pub fn matches(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
