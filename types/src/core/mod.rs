//! Core type system components.
//!
//! - [`Ty`] and [`TyNode`]: interned type handles and their nodes
//! - [`TyKind`]: the different kinds of types (scalars, arrays, classes, generics)
//! - [`TyFlags`]: cached type properties
//! - [`LibraryId`]: the library a type is defined in
//! - [`CanonicalSet`]: order-independent sets used as cache keys
//!
//! See the [`traversal`] submodule for walking the edges between types.

mod flags;
mod kind;
mod library;
mod set;
pub mod traversal;
mod ty;

pub use flags::TyFlags;
pub use kind::{Scalar, TyKind};
pub use library::LibraryId;
pub use set::{CanonicalSet, ImportSet, LibrarySet};
pub use ty::{Ident, Supertypes, Ty, TyNode, TySet};
