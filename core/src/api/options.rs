//! Engine, compile and run options.
//!
//! Per-call options are given as `*Override` values whose `None` fields keep
//! the engine-wide defaults.

use quill_types::{ImportSet, LibrarySet};

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of front-end instances kept alive, one per library set.
    pub compiler_pool_capacity: usize,
    /// Number of raw trees kept for the shortcut path.
    pub raw_tree_capacity: usize,
    /// Number of type closures memoized.
    pub type_closure_capacity: usize,
    /// Libraries referenced by every compile.
    pub default_libraries: LibrarySet,
    /// Namespaces imported by every compile.
    pub default_imports: ImportSet,
    pub default_compile_options: CompileOptions,
    pub default_run_options: RunOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            compiler_pool_capacity: 10,
            raw_tree_capacity: 128,
            type_closure_capacity: 100,
            default_libraries: LibrarySet::default(),
            default_imports: ImportSet::default(),
            default_compile_options: CompileOptions::default(),
            default_run_options: RunOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Try to reuse a cached raw tree before compiling.
    pub shortcut: bool,
    /// Compile an assignable location rather than a value. The text must
    /// denote an environment variable, a stored field or a list element.
    pub location: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            shortcut: true,
            location: false,
        }
    }
}

impl CompileOptions {
    pub fn override_with(&mut self, other: &CompileOptionsOverride) {
        if let Some(shortcut) = other.shortcut {
            self.shortcut = shortcut;
        }
        if let Some(location) = other.location {
            self.location = location;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptionsOverride {
    pub shortcut: Option<bool>,
    pub location: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum evaluation depth before failing with a resource error.
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

impl RunOptions {
    pub fn override_with(&mut self, other: &RunOptionsOverride) {
        if let Some(max_depth) = other.max_depth {
            self.max_depth = max_depth;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptionsOverride {
    pub max_depth: Option<usize>,
}
