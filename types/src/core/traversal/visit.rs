use crate::core::flags::TyFlags;
use crate::core::ty::{Ty, TySet};

/// The kinds of edges followed when computing what a type depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Interface,
    Base,
    GenericArg,
    Element,
}

/// Calls `f` for every direct edge of `ty`.
///
/// The base edge is reported once per ancestor in the base-class chain, stopping
/// before the root type.
pub fn for_each_edge(ty: &Ty, mut f: impl FnMut(Edge, &Ty)) {
    for iface in ty.interfaces() {
        f(Edge::Interface, iface);
    }

    let mut base = ty.base();
    while let Some(b) = base {
        if b.flags().contains(TyFlags::ROOT) {
            break;
        }
        f(Edge::Base, b);
        base = b.base();
    }

    for arg in ty.generic_args() {
        f(Edge::GenericArg, arg);
    }

    if let Some(elem) = ty.element() {
        f(Edge::Element, elem);
    }
}

/// Adds `ty` and everything reachable from it to `visited`.
///
/// Types already in `visited` are not walked again, which makes the walk
/// terminate on self-referential shapes such as `Node : IEquatable<Node>`.
pub fn walk_reachable(ty: &Ty, visited: &mut TySet) {
    if !visited.insert(ty.clone()) {
        return;
    }
    for_each_edge(ty, |_, next| walk_reachable(next, visited));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LibraryId, TypeManager};

    #[test]
    fn test_edges_of_array_of_generic() {
        let types = TypeManager::new();
        let lib = LibraryId::new("collections");
        let list = types.declare_generic_class("List", &lib, 1);
        let list_of_str = types.instantiate(&list, &[types.str()]).unwrap();
        let arr = types.array(&list_of_str);

        let mut edges = Vec::new();
        for_each_edge(&arr, |edge, ty| edges.push((edge, ty.to_string())));
        assert_eq!(edges, vec![(Edge::Element, "List<str>".to_string())]);

        let mut edges = Vec::new();
        for_each_edge(&list_of_str, |edge, ty| edges.push((edge, ty.to_string())));
        assert_eq!(edges, vec![(Edge::GenericArg, "str".to_string())]);
    }

    #[test]
    fn test_base_chain_stops_at_root() {
        let types = TypeManager::new();
        let lib = LibraryId::new("app");
        let animal = types.declare_class("Animal", &lib);
        let dog = types.declare_class("Dog", &lib);
        types
            .set_supertypes(&animal, Some(types.object()), [])
            .unwrap();
        types.set_supertypes(&dog, Some(animal.clone()), []).unwrap();

        let mut bases = Vec::new();
        for_each_edge(&dog, |edge, ty| {
            assert_eq!(edge, Edge::Base);
            bases.push(ty.clone());
        });
        assert_eq!(bases, vec![animal]);
    }

    #[test]
    fn test_walk_self_referential() {
        let types = TypeManager::new();
        let lib = LibraryId::new("app");
        let equatable = types.declare_generic_interface("IEquatable", &lib, 1);
        let node = types.declare_class("Node", &lib);
        let equatable_node = types.instantiate(&equatable, &[node.clone()]).unwrap();
        types
            .set_supertypes(&node, None, [equatable_node.clone()])
            .unwrap();

        let mut visited = TySet::new();
        walk_reachable(&node, &mut visited);

        assert_eq!(visited.len(), 2);
        assert!(visited.contains(&node));
        assert!(visited.contains(&equatable_node));
    }
}
