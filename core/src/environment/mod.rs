//! Host binding environments.
//!
//! An environment is a chain of nested [`Scope`]s. Each scope holds named,
//! typed [`Binding`]s and has at most one parent. Name lookup is
//! case-insensitive and walks from the innermost scope outwards, stopping at
//! the first scope that contains any match.

mod resolve;
mod scope;

pub use resolve::{Resolution, resolve};
pub use scope::{Binding, BindingId, Scope, ScopeBuilder};
