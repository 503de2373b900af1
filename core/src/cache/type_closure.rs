//! Memoized type closures.

use std::sync::Arc;

use parking_lot::Mutex;
use quill_types::{LibrarySet, Ty, TySet, walk_reachable};

use super::bounded::BoundedCache;

/// Caches, per type, the set of types it transitively depends on.
///
/// A closure contains the type itself, its interfaces, every ancestor below
/// the root type, its generic arguments and its element type, recursively.
#[derive(Debug)]
pub struct TypeClosureCache {
    closures: Mutex<BoundedCache<Ty, Arc<TySet>>>,
}

impl TypeClosureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            closures: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    pub fn closure_of(&self, ty: &Ty) -> Arc<TySet> {
        if let Some(closure) = self.closures.lock().get(ty) {
            return closure;
        }

        // Computed without the lock; a racing thread computes the same set.
        let mut reachable = TySet::new();
        walk_reachable(ty, &mut reachable);
        let closure = Arc::new(reachable);
        self.closures.lock().insert(ty.clone(), Arc::clone(&closure));
        closure
    }

    /// Libraries defining the types in `ty`'s closure.
    pub fn libraries_of(&self, ty: &Ty) -> LibrarySet {
        self.closure_of(ty)
            .iter()
            .map(|t| t.library().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.closures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.closures.lock().capacity()
    }
}
