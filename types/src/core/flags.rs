use bitflags::bitflags;

bitflags! {
    /// Flags indicating various properties of a type.
    ///
    /// These flags are computed once when a type is declared or interned and
    /// cached for efficient queries.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TyFlags: u16 {
        /// Values are copied, and `new` without a constructor yields the default value.
        const VALUE_TYPE = 1;
        const INTERFACE = 1 << 1;
        /// Generic definition (arity > 0) or an instantiation of one.
        const GENERIC = 1 << 2;
        /// The root of the class hierarchy. Never part of a type closure.
        const ROOT = 1 << 3;
    }
}
