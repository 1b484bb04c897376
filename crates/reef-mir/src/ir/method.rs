use std::fmt;

use reef_types::DefId;

use super::{BasicBlock, TypeReference};

/// A parameter, local or return slot of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLocal {
    /// `_param0`, `_local3`, `_returnValue`, ...
    pub compiler_name: String,
    /// The name written in source, if the local came from one
    pub user_name: Option<String>,
    pub ty: TypeReference,
}

impl MethodLocal {
    pub fn new(compiler_name: impl Into<String>, user_name: Option<String>, ty: TypeReference) -> Self {
        Self {
            compiler_name: compiler_name.into(),
            user_name,
            ty,
        }
    }
}

impl fmt::Display for MethodLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.compiler_name, self.ty)?;
        if let Some(user_name) = &self.user_name {
            write!(f, " ({user_name})")?;
        }
        Ok(())
    }
}

/// A method with a lowered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredMethod {
    pub id: DefId,
    pub name: String,
    /// The owner's type parameters first, then the method's own
    pub type_parameters: Vec<String>,
    /// `bb0` is the entry block
    pub basic_blocks: Vec<BasicBlock>,
    pub return_value: MethodLocal,
    pub parameters: Vec<MethodLocal>,
    pub locals: Vec<MethodLocal>,
}

impl LoweredMethod {
    pub fn block(&self, index: u32) -> Option<&BasicBlock> {
        self.basic_blocks.get(index as usize)
    }

    /// The local, parameter or return slot with the given compiler name.
    pub fn local(&self, compiler_name: &str) -> Option<&MethodLocal> {
        std::iter::once(&self.return_value)
            .chain(&self.parameters)
            .chain(&self.locals)
            .find(|l| l.compiler_name == compiler_name)
    }
}

/// A method whose body is supplied by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternMethod {
    pub id: DefId,
    pub name: String,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<MethodLocal>,
    pub return_type: TypeReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Lowered(LoweredMethod),
    Extern(ExternMethod),
}

impl Method {
    pub fn id(&self) -> &DefId {
        match self {
            Method::Lowered(method) => &method.id,
            Method::Extern(method) => &method.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Method::Lowered(method) => &method.name,
            Method::Extern(method) => &method.name,
        }
    }

    pub fn as_lowered(&self) -> Option<&LoweredMethod> {
        match self {
            Method::Lowered(method) => Some(method),
            Method::Extern(_) => None,
        }
    }
}

fn write_signature(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    name: &str,
    type_parameters: &[String],
    parameters: &[MethodLocal],
    return_type: &TypeReference,
) -> fmt::Result {
    write!(f, "{keyword} {name}")?;
    if !type_parameters.is_empty() {
        write!(f, "<{}>", type_parameters.join(", "))?;
    }
    write!(f, "(")?;
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{parameter}")?;
    }
    write!(f, ") -> {return_type}")
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Lowered(method) => {
                write_signature(
                    f,
                    "fn",
                    &method.name,
                    &method.type_parameters,
                    &method.parameters,
                    &method.return_value.ty,
                )?;
                writeln!(f, " {{")?;
                for local in &method.locals {
                    writeln!(f, "    let {local}")?;
                }
                for block in &method.basic_blocks {
                    write!(f, "{block}")?;
                }
                writeln!(f, "}}")
            }
            Method::Extern(method) => {
                write_signature(
                    f,
                    "extern fn",
                    &method.name,
                    &method.type_parameters,
                    &method.parameters,
                    &method.return_type,
                )?;
                writeln!(f, ";")
            }
        }
    }
}
