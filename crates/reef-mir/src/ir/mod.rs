//! The lowered program model.
//!
//! A [`LoweredModule`] is a flat list of [`DataType`]s and [`Method`]s. Method
//! bodies are control-flow graphs of [`BasicBlock`]s: each block holds
//! [`Statement`]s that assign [`Rvalue`]s to [`Place`]s and ends in exactly one
//! [`Terminator`]. Names are stable across compilations of the same source,
//! so modules can be compared structurally.

use std::fmt;

pub mod basic_block;
pub mod data_type;
pub mod method;
pub mod place;
pub mod statement;
pub mod terminator;
pub mod types;

pub use basic_block::BasicBlock;
pub use data_type::{DataType, DataTypeField, DataTypeVariant, StaticField};
pub use method::{ExternMethod, LoweredMethod, Method, MethodLocal};
pub use place::Place;
pub use statement::{BinaryOperationKind, Operand, Rvalue, Statement, UnaryOperationKind};
pub use terminator::{BasicBlockId, Terminator};
pub use types::{FunctionReference, TypeReference};

/// Local holding a method's result.
pub const RETURN_VALUE_LOCAL: &str = "_returnValue";
/// Local holding the object that stores the variables captured by local functions.
pub const LOCALS_OBJECT_LOCAL: &str = "_localsObject";
/// Discriminant field present in every union variant.
pub const VARIANT_IDENTIFIER_FIELD: &str = "_variantIdentifier";
/// The only variant of a class.
pub const CLASS_VARIANT: &str = "_classVariant";

pub fn local_name(index: usize) -> String {
    format!("_local{index}")
}

pub fn parameter_name(index: usize) -> String {
    format!("_param{index}")
}

/// Everything a code generator needs for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweredModule {
    pub data_types: Vec<DataType>,
    pub methods: Vec<Method>,
}

impl LoweredModule {
    /// Looks a method up by its name, e.g. `MyClass__MyFn`.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name() == name)
    }

    pub fn lowered_method(&self, name: &str) -> Option<&LoweredMethod> {
        self.method(name).and_then(Method::as_lowered)
    }

    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.data_types.iter().find(|d| d.name == name)
    }
}

impl fmt::Display for LoweredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for data_type in &self.data_types {
            write!(f, "{data_type}")?;
        }
        for method in &self.methods {
            write!(f, "{method}")?;
        }
        Ok(())
    }
}
