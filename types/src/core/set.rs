//! Order-independent sets used as parts of cache keys.

use std::fmt;
use std::sync::Arc;

use super::library::LibraryId;

/// An immutable set stored in canonical (sorted, deduplicated) form.
///
/// Equality and hashing only depend on the members, never on the order in
/// which they were supplied, so two sets built from `[a, b]` and `[b, a, a]`
/// are the same key. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CanonicalSet<T>(Arc<[T]>);

/// The libraries a compilation may reference.
pub type LibrarySet = CanonicalSet<LibraryId>;

/// The namespaces imported into a compilation.
pub type ImportSet = CanonicalSet<String>;

impl<T: Ord> CanonicalSet<T> {
    pub fn new() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.binary_search(item).is_ok()
    }
}

impl<T: Ord + Clone> CanonicalSet<T> {
    /// Returns a set containing the members of both sets.
    pub fn union(&self, other: &Self) -> Self {
        if other.is_subset(self) {
            return self.clone();
        }
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|item| other.contains(item))
    }
}

impl<T> CanonicalSet<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: Ord> Default for CanonicalSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for CanonicalSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self(Arc::from(items))
    }
}

impl<'a, T> IntoIterator for &'a CanonicalSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for CanonicalSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasher, BuildHasherDefault};

    fn hash_of<T: std::hash::Hash>(value: &T) -> u64 {
        BuildHasherDefault::<std::collections::hash_map::DefaultHasher>::default().hash_one(value)
    }

    #[test]
    fn test_order_independent_equality() {
        let a: LibrarySet = [LibraryId::new("core"), LibraryId::new("text")]
            .into_iter()
            .collect();
        let b: LibrarySet = [
            LibraryId::new("text"),
            LibraryId::new("core"),
            LibraryId::new("text"),
        ]
        .into_iter()
        .collect();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_union_reuses_superset() {
        let a: ImportSet = ["System".to_string(), "Linq".to_string()]
            .into_iter()
            .collect();
        let b: ImportSet = ["Linq".to_string()].into_iter().collect();

        let union = a.union(&b);
        assert_eq!(union, a);
        assert!(b.is_subset(&union));
        assert!(!union.is_subset(&b));

        let c: ImportSet = ["Text".to_string()].into_iter().collect();
        assert_eq!(a.union(&c).len(), 3);
    }

    #[test]
    fn test_empty() {
        let empty = ImportSet::new();
        assert!(empty.is_empty());
        assert_eq!(empty, ImportSet::default());
        assert!(!empty.contains(&"System".to_string()));
    }
}
