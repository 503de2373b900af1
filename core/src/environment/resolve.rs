use super::{Binding, Scope};

/// Outcome of looking a name up in a scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Exactly one binding matched in the nearest scope that had any match.
    Found(&'a Binding),
    /// The nearest scope with a match had more than one.
    Ambiguous(&'a Binding, &'a Binding),
    NotFound,
}

/// Looks `name` up from `scope` outwards.
///
/// Every binding of a scope is examined before moving to its parent, so a
/// match in an inner scope shadows any number of matches further out, while
/// two matches within the same scope are ambiguous.
pub fn resolve<'a>(scope: &'a Scope, name: &str) -> Resolution<'a> {
    for current in scope.chain() {
        let mut matches = current.bindings().iter().filter(|b| b.name().matches(name));
        match (matches.next(), matches.next()) {
            (Some(first), Some(second)) => return Resolution::Ambiguous(first, second),
            (Some(found), None) => return Resolution::Found(found),
            (None, _) => {}
        }
    }
    Resolution::NotFound
}
