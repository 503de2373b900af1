//! Quill type model.
//!
//! Types are interned handles with pointer identity. They are created through a
//! [`TypeManager`], which owns the scalar types and interns arrays and generic
//! instantiations so that structurally identical requests yield the same handle.
//!
//! # Example
//!
//! ```
//! use quill_types::{LibraryId, TypeManager};
//!
//! let types = TypeManager::new();
//! let collections = LibraryId::new("collections");
//!
//! let list = types.declare_generic_class("List", &collections, 1);
//! let list_of_int = types.instantiate(&list, &[types.int()]).unwrap();
//! assert_eq!(list_of_int.to_string(), "List<int>");
//! assert_eq!(list_of_int, types.instantiate(&list, &[types.int()]).unwrap());
//! ```

pub mod core;
mod manager;

pub use self::core::traversal::{Edge, for_each_edge, walk_reachable};
pub use self::core::{
    CanonicalSet, Ident, ImportSet, LibraryId, LibrarySet, Scalar, Supertypes, Ty, TyFlags,
    TyKind, TyNode, TySet,
};
pub use manager::{TypeError, TypeManager};
