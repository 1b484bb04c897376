//! Type references.
//!
//! A [`TypeRef`] names a type by index into the checker's definition arena.
//! Inference variables ([`TypeRef::Var`]) only exist while checking; the
//! typed program handed to later passes has them resolved.

/// Index of a class, union or primitive in [`crate::Definitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(pub u32);

impl TypeDefId {
    pub const I8: TypeDefId = TypeDefId(0);
    pub const I16: TypeDefId = TypeDefId(1);
    pub const I32: TypeDefId = TypeDefId(2);
    pub const I64: TypeDefId = TypeDefId(3);
    pub const U8: TypeDefId = TypeDefId(4);
    pub const U16: TypeDefId = TypeDefId(5);
    pub const U32: TypeDefId = TypeDefId(6);
    pub const U64: TypeDefId = TypeDefId(7);
    pub const BOOL: TypeDefId = TypeDefId(8);
    pub const STRING: TypeDefId = TypeDefId(9);
    pub const UNIT: TypeDefId = TypeDefId(10);
    pub const NEVER: TypeDefId = TypeDefId(11);
    pub const RESULT: TypeDefId = TypeDefId(12);

    pub const INTEGERS: [TypeDefId; 8] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
    ];

    pub fn is_integer(self) -> bool {
        self.0 <= Self::U64.0
    }

    /// Size in bytes and signedness of an integer type.
    pub fn integer_layout(self) -> Option<(u8, bool)> {
        match self {
            Self::I8 => Some((1, true)),
            Self::I16 => Some((2, true)),
            Self::I32 => Some((4, true)),
            Self::I64 => Some((8, true)),
            Self::U8 => Some((1, false)),
            Self::U16 => Some((2, false)),
            Self::U32 => Some((4, false)),
            Self::U64 => Some((8, false)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

/// An inference variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub u32);

/// The declaration a generic parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    Type(TypeDefId),
    Function(FunctionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub owner: GenericOwner,
    pub index: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionParameterType {
    pub ty: TypeRef,
    pub mutable: bool,
}

/// The type of a function value, `Fn(mut A, B): C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<FunctionParameterType>,
    pub return_type: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// An instantiated class, union or primitive
    Named { def: TypeDefId, arguments: Vec<TypeRef> },
    Function(Box<FunctionType>),
    /// A tuple of two or more elements
    Tuple(Vec<TypeRef>),
    /// A generic parameter seen from inside its declaration
    Generic(GenericParam),
    Var(TypeVarId),
    /// Produced after an error has been reported. Compatible with everything.
    Unknown,
}

impl TypeRef {
    pub fn named(def: TypeDefId) -> Self {
        TypeRef::Named {
            def,
            arguments: Vec::new(),
        }
    }

    pub fn unit() -> Self {
        Self::named(TypeDefId::UNIT)
    }

    pub fn bool() -> Self {
        Self::named(TypeDefId::BOOL)
    }

    pub fn string() -> Self {
        Self::named(TypeDefId::STRING)
    }

    pub fn never() -> Self {
        Self::named(TypeDefId::NEVER)
    }

    pub fn i32() -> Self {
        Self::named(TypeDefId::I32)
    }

    pub fn result(value: TypeRef, error: TypeRef) -> Self {
        TypeRef::Named {
            def: TypeDefId::RESULT,
            arguments: vec![value, error],
        }
    }

    pub fn def(&self) -> Option<TypeDefId> {
        match self {
            TypeRef::Named { def, .. } => Some(*def),
            _ => None,
        }
    }

    pub fn is_named(&self, id: TypeDefId) -> bool {
        self.def() == Some(id)
    }

    pub fn is_never(&self) -> bool {
        self.is_named(TypeDefId::NEVER)
    }

    pub fn is_unit(&self) -> bool {
        self.is_named(TypeDefId::UNIT)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeRef::Unknown)
    }

    /// Replaces generic parameters for which `f` returns a type.
    pub fn substitute(&self, f: &impl Fn(&GenericParam) -> Option<TypeRef>) -> TypeRef {
        match self {
            TypeRef::Named { def, arguments } => TypeRef::Named {
                def: *def,
                arguments: arguments.iter().map(|a| a.substitute(f)).collect(),
            },
            TypeRef::Function(function) => TypeRef::Function(Box::new(FunctionType {
                parameters: function
                    .parameters
                    .iter()
                    .map(|p| FunctionParameterType {
                        ty: p.ty.substitute(f),
                        mutable: p.mutable,
                    })
                    .collect(),
                return_type: function.return_type.substitute(f),
            })),
            TypeRef::Tuple(members) => TypeRef::Tuple(members.iter().map(|m| m.substitute(f)).collect()),
            TypeRef::Generic(param) => f(param).unwrap_or_else(|| self.clone()),
            TypeRef::Var(_) | TypeRef::Unknown => self.clone(),
        }
    }

    /// Whether any inference variable appears in this type.
    pub fn has_vars(&self) -> bool {
        match self {
            TypeRef::Named { arguments, .. } => arguments.iter().any(TypeRef::has_vars),
            TypeRef::Function(function) => {
                function.parameters.iter().any(|p| p.ty.has_vars()) || function.return_type.has_vars()
            }
            TypeRef::Tuple(members) => members.iter().any(TypeRef::has_vars),
            TypeRef::Var(_) => true,
            TypeRef::Generic(_) | TypeRef::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_nested_generics() {
        let t = GenericParam {
            owner: GenericOwner::Type(TypeDefId(20)),
            index: 0,
            name: "T".to_owned(),
        };
        let ty = TypeRef::result(TypeRef::Generic(t.clone()), TypeRef::Tuple(vec![TypeRef::Generic(t), TypeRef::bool()]));
        let substituted = ty.substitute(&|p| (p.index == 0).then(TypeRef::i32));
        assert_eq!(
            substituted,
            TypeRef::result(TypeRef::i32(), TypeRef::Tuple(vec![TypeRef::i32(), TypeRef::bool()]))
        );
    }

    #[test]
    fn integer_layouts() {
        assert_eq!(TypeDefId::U16.integer_layout(), Some((2, false)));
        assert_eq!(TypeDefId::I64.integer_layout(), Some((8, true)));
        assert_eq!(TypeDefId::BOOL.integer_layout(), None);
        assert!(TypeDefId::INTEGERS.iter().all(|i| i.is_integer()));
        assert!(!TypeDefId::STRING.is_integer());
    }
}
