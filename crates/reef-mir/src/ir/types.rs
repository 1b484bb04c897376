//! Type and function references as they appear in lowered code.

use std::fmt;

use reef_types::DefId;

/// A fully lowered type. Inference variables and unresolved types never
/// survive lowering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    /// A class, union, primitive or built-in generic type
    Concrete {
        /// The name as written in source, e.g. `MyUnion` or `i32`
        name: String,
        id: DefId,
        type_arguments: Vec<TypeReference>,
    },
    /// A generic parameter of the type or method `owner`
    Generic { owner: DefId, name: String },
    FunctionPointer {
        parameters: Vec<TypeReference>,
        return_type: Box<TypeReference>,
    },
}

impl TypeReference {
    pub fn concrete(name: impl Into<String>, id: DefId, type_arguments: Vec<TypeReference>) -> Self {
        TypeReference::Concrete {
            name: name.into(),
            id,
            type_arguments,
        }
    }

    /// The identity of a concrete type.
    pub fn id(&self) -> Option<&DefId> {
        match self {
            TypeReference::Concrete { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[TypeReference] {
        match self {
            TypeReference::Concrete { type_arguments, .. } => type_arguments,
            _ => &[],
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Concrete {
                name, type_arguments, ..
            } => {
                write!(f, "{name}")?;
                write_type_arguments(f, type_arguments)
            }
            TypeReference::Generic { name, .. } => write!(f, "{name}"),
            TypeReference::FunctionPointer {
                parameters,
                return_type,
            } => {
                write!(f, "fn(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, ") -> {return_type}")
            }
        }
    }
}

/// A method together with the type arguments it is instantiated with.
///
/// For methods declared inside a generic type the owner's arguments come
/// first, followed by the method's own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionReference {
    pub id: DefId,
    pub type_arguments: Vec<TypeReference>,
}

impl fmt::Display for FunctionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id.name())?;
        write_type_arguments(f, &self.type_arguments)
    }
}

fn write_type_arguments(f: &mut fmt::Formatter<'_>, arguments: &[TypeReference]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    write!(f, "::<")?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{argument}")?;
    }
    write!(f, ">")
}
