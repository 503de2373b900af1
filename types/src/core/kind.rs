use smallvec::SmallVec;

use super::flags::TyFlags;
use super::ty::Ty;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind {
    /// Built-in scalar types (Unit, Bool, Int, Float, Str).
    Scalar(Scalar),

    /// Array type with element type.
    Array(Ty),

    /// Nominal reference type. `arity > 0` marks a generic definition.
    Class { arity: u8 },

    /// Nominal value type.
    Struct { arity: u8 },

    /// Nominal interface.
    Interface { arity: u8 },

    /// Instantiation of a generic definition with concrete arguments.
    Generic {
        definition: Ty,
        args: SmallVec<[Ty; 2]>,
    },
}

impl TyKind {
    pub fn compute_flags(&self) -> TyFlags {
        match self {
            TyKind::Scalar(Scalar::Str | Scalar::Unit) => TyFlags::empty(),
            TyKind::Scalar(_) => TyFlags::VALUE_TYPE,
            TyKind::Array(_) => TyFlags::empty(),
            TyKind::Class { arity } => generic_if(*arity),
            TyKind::Struct { arity } => TyFlags::VALUE_TYPE | generic_if(*arity),
            TyKind::Interface { arity } => TyFlags::INTERFACE | generic_if(*arity),
            TyKind::Generic { definition, .. } => {
                (definition.flags() & (TyFlags::VALUE_TYPE | TyFlags::INTERFACE)) | TyFlags::GENERIC
            }
        }
    }

    /// Number of generic parameters a definition expects.
    pub fn arity(&self) -> u8 {
        match self {
            TyKind::Class { arity } | TyKind::Struct { arity } | TyKind::Interface { arity } => {
                *arity
            }
            _ => 0,
        }
    }
}

fn generic_if(arity: u8) -> TyFlags {
    if arity > 0 {
        TyFlags::GENERIC
    } else {
        TyFlags::empty()
    }
}

/// Scalar type variants
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    /// The type of expressions that produce no value.
    Unit,

    /// Boolean type
    Bool,

    /// Integer type
    Int,

    /// Floating-point type
    Float,

    /// String type
    Str,
}

impl Scalar {
    pub const ALL: [Scalar; 5] = [
        Scalar::Unit,
        Scalar::Bool,
        Scalar::Int,
        Scalar::Float,
        Scalar::Str,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scalar::Unit => "unit",
            Scalar::Bool => "bool",
            Scalar::Int => "int",
            Scalar::Float => "float",
            Scalar::Str => "str",
        }
    }
}
