//! Cache of front-end output before free identifiers are bound.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use quill_types::{ImportSet, LibrarySet, Ty};

use super::bounded::BoundedCache;
use crate::tree::Expr;

/// Everything the front-end output depends on apart from the environment.
///
/// The library and import sets are canonical, so keys built from the same
/// names in a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawTreeKey {
    pub text: Arc<str>,
    /// `None` for untyped compiles.
    pub result_ty: Option<Ty>,
    pub libraries: LibrarySet,
    pub imports: ImportSet,
}

/// Replaceable cell holding the latest raw tree compiled for one key.
#[derive(Debug)]
pub struct RawTreeSlot(RwLock<Expr>);

impl RawTreeSlot {
    fn new(tree: Expr) -> Self {
        Self(RwLock::new(tree))
    }

    pub fn load(&self) -> Expr {
        self.0.read().clone()
    }

    pub fn replace(&self, tree: Expr) {
        *self.0.write() = tree;
    }
}

/// Bounded map from [`RawTreeKey`] to [`RawTreeSlot`].
#[derive(Debug)]
pub struct RawTreeCache {
    slots: Mutex<BoundedCache<RawTreeKey, Arc<RawTreeSlot>>>,
}

impl RawTreeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &RawTreeKey) -> Option<Arc<RawTreeSlot>> {
        self.slots.lock().get(key)
    }

    /// Records `tree` as the latest raw tree for `key`.
    ///
    /// When the caller already holds the slot for this key it is overwritten
    /// in place; otherwise the slot currently in the cache is, or a new one is
    /// inserted. Concurrent stores for the same key keep the last write.
    pub fn store(&self, key: RawTreeKey, existing: Option<&RawTreeSlot>, tree: Expr) {
        if let Some(slot) = existing {
            slot.replace(tree);
            return;
        }
        let mut slots = self.slots.lock();
        match slots.get(&key) {
            Some(slot) => slot.replace(tree),
            None => {
                slots.insert(key, Arc::new(RawTreeSlot::new(tree)));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;
    use quill_types::{LibraryId, TypeManager};

    fn key(text: &str, libs: &[&str], imports: &[&str], ty: Option<Ty>) -> RawTreeKey {
        RawTreeKey {
            text: Arc::from(text),
            result_ty: ty,
            libraries: libs.iter().map(LibraryId::new).collect(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_key_ignores_set_order() {
        let types = TypeManager::new();
        let a = key("x", &["core", "io"], &["sys", "text"], Some(types.int()));
        let b = key("x", &["io", "core"], &["text", "sys", "text"], Some(types.int()));
        let c = key("x", &["io", "core"], &["text", "sys"], Some(types.str()));
        let d = key("x", &["io", "core"], &["text", "sys"], None);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(c, d);
    }

    #[test]
    fn test_store_replaces_in_place() {
        let types = TypeManager::new();
        let cache = RawTreeCache::new(4);
        let k = key("1", &["core"], &[], Some(types.int()));
        let one = Expr::constant(types.int(), Value::Int(1));
        let two = Expr::constant(types.int(), Value::Int(2));

        cache.store(k.clone(), None, one);
        let slot = cache.get(&k).unwrap();
        cache.store(k.clone(), None, two.clone());

        assert!(Expr::ptr_eq(&slot.load(), &two));
        assert_eq!(cache.len(), 1);

        let three = Expr::constant(types.int(), Value::Int(3));
        cache.store(k.clone(), Some(&slot), three.clone());
        assert!(Expr::ptr_eq(&cache.get(&k).unwrap().load(), &three));
    }
}
