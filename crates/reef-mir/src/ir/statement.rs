use std::fmt;

use super::{FunctionReference, Place, TypeReference};

/// A non-branching instruction inside a basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Stores the value of the rvalue into the place
    Assign(Place, Rvalue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rvalue {
    Use(Operand),
    BinaryOperation {
        left: Operand,
        right: Operand,
        kind: BinaryOperationKind,
    },
    UnaryOperation {
        operand: Operand,
        kind: UnaryOperationKind,
    },
    /// Allocates an object of the type with every field unset
    CreateObject(TypeReference),
}

/// A value read by an rvalue or passed to a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Copy(Place),
    StringConstant(String),
    /// A signed integer of `size` bytes
    IntConstant { value: i64, size: u8 },
    /// An unsigned integer of `size` bytes
    UIntConstant { value: u64, size: u8 },
    BoolConstant(bool),
    UnitConstant,
    FunctionPointer(FunctionReference),
}

impl Operand {
    pub fn copy(place: Place) -> Self {
        Operand::Copy(place)
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Operand::Copy(place) => Some(place),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperationKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperationKind {
    Not,
    Negate,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign(place, rvalue) => write!(f, "{place} = {rvalue}"),
        }
    }
}

impl fmt::Display for Rvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rvalue::Use(operand) => write!(f, "{operand}"),
            Rvalue::BinaryOperation { left, right, kind } => write!(f, "{kind:?}({left}, {right})"),
            Rvalue::UnaryOperation { operand, kind } => write!(f, "{kind:?}({operand})"),
            Rvalue::CreateObject(ty) => write!(f, "CreateObject({ty})"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Copy(place) => write!(f, "copy {place}"),
            Operand::StringConstant(value) => write!(f, "{value:?}"),
            Operand::IntConstant { value, size } => write!(f, "{value}_i{}", u32::from(*size) * 8),
            Operand::UIntConstant { value, size } => write!(f, "{value}_u{}", u32::from(*size) * 8),
            Operand::BoolConstant(value) => write!(f, "{value}"),
            Operand::UnitConstant => write!(f, "()"),
            Operand::FunctionPointer(function) => write!(f, "fn {function}"),
        }
    }
}
