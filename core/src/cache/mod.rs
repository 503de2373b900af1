//! Caches sitting in front of the compile pipeline.
//!
//! - [`CompilerPool`]: reusable front-end instances per library set
//! - [`RawTreeCache`]: front-end output per text, type and context
//! - [`TypeClosureCache`]: the types a type transitively depends on
//!
//! The raw-tree and type-closure caches are bundled as [`EngineCaches`] so
//! that engines can share them, either explicitly or through the process-wide
//! registry behind [`EngineCaches::shared`]. Raw trees are front-end output,
//! so shared caches are never handed to engines over a different front-end.

mod bounded;
pub mod pool;
pub mod raw_tree;
pub mod type_closure;


use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::api::EngineOptions;
use crate::frontend::CompilerFactory;

pub use pool::{CompilerPool, Lifecycle, PooledCompiler};
pub use raw_tree::{RawTreeCache, RawTreeKey, RawTreeSlot};
pub use type_closure::TypeClosureCache;

/// Shared caches used by [`Engine`](crate::api::Engine).
#[derive(Debug)]
pub struct EngineCaches {
    pub raw_trees: RawTreeCache,
    pub type_closures: TypeClosureCache,
}

/// Caches registered for one front-end and one pair of capacities.
struct SharedEntry {
    factory: Weak<dyn CompilerFactory>,
    raw_tree_capacity: usize,
    type_closure_capacity: usize,
    caches: Arc<EngineCaches>,
}

impl SharedEntry {
    fn matches(&self, factory: &Arc<dyn CompilerFactory>, options: &EngineOptions) -> bool {
        self.raw_tree_capacity == options.raw_tree_capacity
            && self.type_closure_capacity == options.type_closure_capacity
            && self
                .factory
                .upgrade()
                .is_some_and(|live| Arc::ptr_eq(&live, factory))
    }
}

static SHARED: Lazy<Mutex<Vec<SharedEntry>>> = Lazy::new(|| Mutex::new(Vec::new()));

impl EngineCaches {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            raw_trees: RawTreeCache::new(options.raw_tree_capacity),
            type_closures: TypeClosureCache::new(options.type_closure_capacity),
        }
    }

    /// Process-wide caches for engines over `factory`.
    ///
    /// Every call with the same factory and the same cache capacities in
    /// `options` returns the same caches. Entries are dropped once their
    /// factory is.
    pub fn shared(factory: &Arc<dyn CompilerFactory>, options: &EngineOptions) -> Arc<EngineCaches> {
        let mut entries = SHARED.lock();
        entries.retain(|entry| entry.factory.strong_count() > 0);
        if let Some(entry) = entries.iter().find(|entry| entry.matches(factory, options)) {
            return Arc::clone(&entry.caches);
        }

        debug!(
            raw_tree_capacity = options.raw_tree_capacity,
            type_closure_capacity = options.type_closure_capacity,
            "Registering shared caches for a front-end"
        );
        let caches = Arc::new(EngineCaches::new(options));
        entries.push(SharedEntry {
            factory: Arc::downgrade(factory),
            raw_tree_capacity: options.raw_tree_capacity,
            type_closure_capacity: options.type_closure_capacity,
            caches: Arc::clone(&caches),
        });
        caches
    }
}

static_assertions::assert_impl_all!(CompilerPool: Send, Sync);
static_assertions::assert_impl_all!(RawTreeCache: Send, Sync);
static_assertions::assert_impl_all!(TypeClosureCache: Send, Sync);
