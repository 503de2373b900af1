//! Core of the Quill expression host.
//!
//! Expression text is compiled by a pluggable front-end into a typed
//! [`tree::Expr`], bound to a host [`environment::Scope`] chain by the
//! rewriter, and executed by the evaluator. Front-end instances, raw trees
//! and type closures are cached (see [`cache`]) so that compiling the same
//! text for structurally identical environments skips the front-end.

pub mod api;
pub mod cache;
pub mod environment;
pub mod evaluator;
pub mod frontend;
mod rewriter;
pub mod tree;
pub mod values;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_pool_eviction() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
