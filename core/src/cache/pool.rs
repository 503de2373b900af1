//! Pool of front-end compiler instances keyed by library set.
//!
//! Eviction and disposal are separate steps. An evicted entry that is still
//! reserved by a caller stays alive until its last [`PooledCompiler`] guard is
//! dropped; only then is the instance disposed.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use quill_types::{LibrarySet, Ty};
use tracing::{debug, warn};

use super::bounded::BoundedCache;
use crate::frontend::{
    CompileOutput, CompilerContext, CompilerFactory, ExpressionCompiler, FrontEndError,
};

/// Lifecycle of a pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// In the pool, reserved by `refs` callers.
    Live { refs: usize },
    /// Removed from the pool, still reserved by `refs` callers.
    Evicted { refs: usize },
    Disposed,
}

struct PoolEntry {
    libraries: LibrarySet,
    lifecycle: Mutex<Lifecycle>,
    compiler: Mutex<Option<Box<dyn ExpressionCompiler>>>,
}

impl PoolEntry {
    fn new(libraries: LibrarySet, compiler: Box<dyn ExpressionCompiler>) -> Self {
        Self {
            libraries,
            lifecycle: Mutex::new(Lifecycle::Live { refs: 0 }),
            compiler: Mutex::new(Some(compiler)),
        }
    }

    /// Must be called with the pool lock held so that an entry found in the
    /// pool cannot be evicted and disposed before it is reserved.
    fn reserve(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if let Lifecycle::Live { refs } = &mut *lifecycle {
            *refs += 1;
        }
    }

    fn release(&self) {
        let dispose = {
            let mut lifecycle = self.lifecycle.lock();
            match *lifecycle {
                Lifecycle::Live { refs } => {
                    *lifecycle = Lifecycle::Live {
                        refs: refs.saturating_sub(1),
                    };
                    false
                }
                Lifecycle::Evicted { refs } if refs <= 1 => {
                    *lifecycle = Lifecycle::Disposed;
                    true
                }
                Lifecycle::Evicted { refs } => {
                    *lifecycle = Lifecycle::Evicted { refs: refs - 1 };
                    false
                }
                Lifecycle::Disposed => false,
            }
        };
        if dispose {
            self.dispose();
        }
    }

    fn mark_evicted(&self) {
        let dispose = {
            let mut lifecycle = self.lifecycle.lock();
            match *lifecycle {
                Lifecycle::Live { refs: 0 } => {
                    *lifecycle = Lifecycle::Disposed;
                    true
                }
                Lifecycle::Live { refs } => {
                    debug!(libraries = ?self.libraries, refs, "Deferring disposal of evicted compiler");
                    *lifecycle = Lifecycle::Evicted { refs };
                    false
                }
                Lifecycle::Evicted { .. } | Lifecycle::Disposed => false,
            }
        };
        if dispose {
            self.dispose();
        }
    }

    /// Runs once, after the transition to `Disposed`.
    fn dispose(&self) {
        let Some(mut compiler) = self.compiler.lock().take() else {
            return;
        };
        debug!(libraries = ?self.libraries, "Disposing compiler");
        if let Err(err) = compiler.dispose() {
            warn!(libraries = ?self.libraries, error = %err, "Compiler disposal failed");
        }
    }
}

/// Bounded pool of compiler instances.
///
/// Instances are looked up by the exact library set they were created for.
/// When a new set arrives at capacity, the least recently acquired entry is
/// evicted.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use quill_core::cache::CompilerPool;
/// use quill_core::frontend::{
///     CompileOutput, CompilerContext, CompilerFactory, ExpressionCompiler, FrontEndError,
/// };
/// use quill_types::{LibraryId, LibrarySet, Ty};
///
/// struct Silent;
///
/// impl ExpressionCompiler for Silent {
///     fn compile_expression(
///         &mut self,
///         _text: &str,
///         _context: &CompilerContext<'_>,
///         _expected: Option<&Ty>,
///     ) -> Result<CompileOutput, FrontEndError> {
///         Ok(CompileOutput::default())
///     }
/// }
///
/// struct SilentFactory;
///
/// impl CompilerFactory for SilentFactory {
///     fn create(&self, _: &LibrarySet) -> Result<Box<dyn ExpressionCompiler>, FrontEndError> {
///         Ok(Box::new(Silent))
///     }
/// }
///
/// let pool = CompilerPool::new(Arc::new(SilentFactory), 2);
/// let libs: LibrarySet = [LibraryId::new("core")].into_iter().collect();
/// {
///     let _compiler = pool.acquire(&libs).unwrap();
///     assert!(pool.contains(&libs));
/// }
/// assert_eq!(pool.len(), 1);
/// ```
pub struct CompilerPool {
    factory: Arc<dyn CompilerFactory>,
    entries: Mutex<BoundedCache<LibrarySet, Arc<PoolEntry>>>,
}

impl CompilerPool {
    pub fn new(factory: Arc<dyn CompilerFactory>, capacity: usize) -> Self {
        Self {
            factory,
            entries: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    /// Reserves the instance for `libraries`, creating it if needed.
    ///
    /// The reservation lasts until the returned guard is dropped. A creation
    /// failure leaves the pool unchanged.
    pub fn acquire(&self, libraries: &LibrarySet) -> Result<PooledCompiler, FrontEndError> {
        let (entry, evicted) = {
            let mut entries = self.entries.lock();
            match entries.get(libraries) {
                Some(entry) => {
                    entry.reserve();
                    (entry, None)
                }
                None => {
                    debug!(?libraries, "Creating compiler");
                    let compiler = self.factory.create(libraries)?;
                    let entry = Arc::new(PoolEntry::new(libraries.clone(), compiler));
                    entry.reserve();
                    let evicted = entries.insert(libraries.clone(), Arc::clone(&entry));
                    (entry, evicted)
                }
            }
        };

        if let Some((key, old)) = evicted {
            debug!(libraries = ?key, "Evicting least recently used compiler");
            old.mark_evicted();
        }

        Ok(PooledCompiler { entry })
    }

    pub fn contains(&self, libraries: &LibrarySet) -> bool {
        self.entries.lock().contains_key(libraries)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }
}

impl Drop for CompilerPool {
    fn drop(&mut self) {
        let drained = self.entries.get_mut().drain();
        for entry in drained {
            entry.mark_evicted();
        }
    }
}

impl fmt::Debug for CompilerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerPool")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// A reserved compiler instance. Dropping the guard releases it.
pub struct PooledCompiler {
    entry: Arc<PoolEntry>,
}

impl PooledCompiler {
    /// Compiles `text`, waiting for any other caller using this instance.
    pub fn compile(
        &self,
        text: &str,
        context: &CompilerContext<'_>,
        expected: Option<&Ty>,
    ) -> Result<CompileOutput, FrontEndError> {
        let mut compiler = self.entry.compiler.lock();
        match compiler.as_mut() {
            Some(compiler) => compiler.compile_expression(text, context, expected),
            None => Err(FrontEndError::new("compiler instance has been disposed")),
        }
    }

    pub fn libraries(&self) -> &LibrarySet {
        &self.entry.libraries
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.entry.lifecycle.lock()
    }
}

impl Drop for PooledCompiler {
    fn drop(&mut self) {
        self.entry.release();
    }
}

impl fmt::Debug for PooledCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledCompiler")
            .field("libraries", &self.entry.libraries)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
