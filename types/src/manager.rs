//! Type creation and interning.

use std::fmt;

use hashbrown::HashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::core::{Ident, LibraryId, Scalar, Supertypes, Ty, TyFlags, TyKind, TyNode};

/// Errors raised while building types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// `instantiate` was called with the wrong number of arguments.
    ArityMismatch {
        definition: String,
        expected: u8,
        got: usize,
    },
    /// `instantiate` was called on a type that is not a generic definition.
    NotGeneric(String),
    /// Supertypes can only be attached once.
    SupertypesAlreadyDefined(String),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::ArityMismatch {
                definition,
                expected,
                got,
            } => write!(
                f,
                "'{}' expects {} type argument(s), got {}",
                definition, expected, got
            ),
            TypeError::NotGeneric(name) => write!(f, "'{}' is not a generic definition", name),
            TypeError::SupertypesAlreadyDefined(name) => {
                write!(f, "supertypes of '{}' are already defined", name)
            }
        }
    }
}

impl std::error::Error for TypeError {}

#[derive(PartialEq, Eq, Hash)]
enum InternKey {
    Array(Ty),
    Generic(Ty, SmallVec<[Ty; 2]>),
}

/// Creates and interns types.
///
/// Scalars and the root `object` type live in the `core` library. Nominal
/// declarations always produce a fresh type; arrays and generic instantiations
/// are interned so that repeated requests return the same handle.
///
/// `TypeManager` is `Send + Sync`; interning is guarded by a single lock.
pub struct TypeManager {
    core: LibraryId,
    scalars: [Ty; 5],
    object: Ty,
    interned: Mutex<HashMap<InternKey, Ty>>,
}

impl TypeManager {
    pub fn new() -> Self {
        let core = LibraryId::new("core");
        let scalars = Scalar::ALL.map(|scalar| {
            Ty::new(TyNode::new(
                Ident::new(scalar.name()),
                core.clone(),
                TyKind::Scalar(scalar),
            ))
        });
        let object = Ty::new(
            TyNode::new(Ident::new("object"), core.clone(), TyKind::Class { arity: 0 })
                .with_flags(TyFlags::ROOT),
        );
        Self {
            core,
            scalars,
            object,
            interned: Mutex::new(HashMap::new()),
        }
    }

    /// The library holding the built-in types.
    pub fn core_library(&self) -> &LibraryId {
        &self.core
    }

    pub fn scalar(&self, scalar: Scalar) -> Ty {
        self.scalars[scalar as usize].clone()
    }

    pub fn unit(&self) -> Ty {
        self.scalar(Scalar::Unit)
    }

    pub fn bool(&self) -> Ty {
        self.scalar(Scalar::Bool)
    }

    pub fn int(&self) -> Ty {
        self.scalar(Scalar::Int)
    }

    pub fn float(&self) -> Ty {
        self.scalar(Scalar::Float)
    }

    pub fn str(&self) -> Ty {
        self.scalar(Scalar::Str)
    }

    /// Root of the class hierarchy.
    pub fn object(&self) -> Ty {
        self.object.clone()
    }

    pub fn array(&self, element: &Ty) -> Ty {
        let key = InternKey::Array(element.clone());
        let mut interned = self.interned.lock();
        interned
            .entry(key)
            .or_insert_with(|| {
                Ty::new(TyNode::new(
                    Ident::new(format!("{}[]", element)),
                    element.library().clone(),
                    TyKind::Array(element.clone()),
                ))
            })
            .clone()
    }

    pub fn declare_class(&self, name: &str, library: &LibraryId) -> Ty {
        self.declare(name, library, TyKind::Class { arity: 0 })
    }

    pub fn declare_struct(&self, name: &str, library: &LibraryId) -> Ty {
        self.declare(name, library, TyKind::Struct { arity: 0 })
    }

    pub fn declare_interface(&self, name: &str, library: &LibraryId) -> Ty {
        self.declare(name, library, TyKind::Interface { arity: 0 })
    }

    pub fn declare_generic_class(&self, name: &str, library: &LibraryId, arity: u8) -> Ty {
        self.declare(name, library, TyKind::Class { arity })
    }

    pub fn declare_generic_interface(&self, name: &str, library: &LibraryId, arity: u8) -> Ty {
        self.declare(name, library, TyKind::Interface { arity })
    }

    fn declare(&self, name: &str, library: &LibraryId, kind: TyKind) -> Ty {
        Ty::new(TyNode::new(Ident::new(name), library.clone(), kind))
    }

    /// Instantiates a generic definition. The result belongs to the
    /// definition's library.
    pub fn instantiate(&self, definition: &Ty, args: &[Ty]) -> Result<Ty, TypeError> {
        let arity = definition.kind().arity();
        if arity == 0 {
            return Err(TypeError::NotGeneric(definition.to_string()));
        }
        if usize::from(arity) != args.len() {
            return Err(TypeError::ArityMismatch {
                definition: definition.to_string(),
                expected: arity,
                got: args.len(),
            });
        }

        let args: SmallVec<[Ty; 2]> = args.iter().cloned().collect();
        let key = InternKey::Generic(definition.clone(), args.clone());
        let mut interned = self.interned.lock();
        let ty = interned.entry(key).or_insert_with(|| {
            Ty::new(TyNode::new(
                Ident::new(definition.name()),
                definition.library().clone(),
                TyKind::Generic {
                    definition: definition.clone(),
                    args,
                },
            ))
        });
        Ok(ty.clone())
    }

    /// Attaches the base class and interfaces of `ty`.
    pub fn set_supertypes(
        &self,
        ty: &Ty,
        base: Option<Ty>,
        interfaces: impl IntoIterator<Item = Ty>,
    ) -> Result<(), TypeError> {
        let supertypes = Supertypes {
            base,
            interfaces: interfaces.into_iter().collect(),
        };
        if ty.node().set_supertypes(supertypes) {
            Ok(())
        } else {
            Err(TypeError::SupertypesAlreadyDefined(ty.to_string()))
        }
    }
}

impl Default for TypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeManager")
            .field("interned", &self.interned.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalars_are_shared() {
        let types = TypeManager::new();
        assert_eq!(types.int(), types.int());
        assert_ne!(types.int(), types.float());
        assert_eq!(types.int().library(), types.core_library());
        assert!(types.int().is_value_type());
        assert!(!types.str().is_value_type());
    }

    #[test]
    fn test_arrays_are_interned() {
        let types = TypeManager::new();
        let a = types.array(&types.int());
        let b = types.array(&types.int());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "int[]");
        assert_eq!(a.element(), Some(&types.int()));
    }

    #[test]
    fn test_nominal_declarations_are_distinct() {
        let types = TypeManager::new();
        let lib = LibraryId::new("app");
        let a = types.declare_class("Order", &lib);
        let b = types.declare_class("Order", &lib);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_instantiate_checks_arity() {
        let types = TypeManager::new();
        let lib = LibraryId::new("collections");
        let dict = types.declare_generic_class("Dictionary", &lib, 2);

        let err = types.instantiate(&dict, &[types.str()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Dictionary' expects 2 type argument(s), got 1"
        );

        let err = types.instantiate(&types.int(), &[types.str()]).unwrap_err();
        assert_eq!(err, TypeError::NotGeneric("int".to_string()));

        let ok = types
            .instantiate(&dict, &[types.str(), types.int()])
            .unwrap();
        assert_eq!(ok.to_string(), "Dictionary<str, int>");
        assert_eq!(ok.library(), &lib);
        assert!(ok.flags().contains(TyFlags::GENERIC));
    }

    #[test]
    fn test_supertypes_once() {
        let types = TypeManager::new();
        let lib = LibraryId::new("app");
        let shape = types.declare_interface("IShape", &lib);
        let circle = types.declare_struct("Circle", &lib);

        types.set_supertypes(&circle, None, [shape.clone()]).unwrap();
        assert!(circle.is_subtype_of(&shape));
        assert!(!shape.is_subtype_of(&circle));
        assert_eq!(
            types.set_supertypes(&circle, None, []),
            Err(TypeError::SupertypesAlreadyDefined("Circle".to_string()))
        );
    }
}
