//! Traversal over the edges between types.
//!
//! A type depends on its interfaces, its base-class chain, its generic
//! arguments and its element type. [`for_each_edge`] enumerates the direct
//! edges and [`walk_reachable`] computes the transitive closure.

mod visit;

pub use visit::{Edge, for_each_edge, walk_reachable};
