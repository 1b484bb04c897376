use std::fmt;

use indexmap::IndexMap;

use super::{FunctionReference, Operand, Place};

/// Identifies a basic block within its method. Displayed as `bbN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicBlockId(pub u32);

impl fmt::Display for BasicBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Ends a basic block and transfers control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    GoTo(BasicBlockId),
    /// Jumps to the block of the matching case, or to `otherwise`
    SwitchInt {
        operand: Operand,
        /// Case value to target, in the order the cases were added
        cases: IndexMap<u64, BasicBlockId>,
        otherwise: BasicBlockId,
    },
    /// Calls a method, stores its result and continues at `goto_after`
    MethodCall {
        function: FunctionReference,
        arguments: Vec<Operand>,
        destination: Place,
        goto_after: BasicBlockId,
    },
    /// Returns `_returnValue` to the caller
    Return,
}

impl Terminator {
    /// The blocks control may continue at.
    pub fn successors(&self) -> Vec<BasicBlockId> {
        match self {
            Terminator::GoTo(target) => vec![*target],
            Terminator::SwitchInt { cases, otherwise, .. } => {
                let mut targets: Vec<_> = cases.values().copied().collect();
                targets.push(*otherwise);
                targets
            }
            Terminator::MethodCall { goto_after, .. } => vec![*goto_after],
            Terminator::Return => Vec::new(),
        }
    }

    /// Rewrites every successor through `f`.
    pub fn map_successors(&mut self, mut f: impl FnMut(BasicBlockId) -> BasicBlockId) {
        match self {
            Terminator::GoTo(target) => *target = f(*target),
            Terminator::SwitchInt { cases, otherwise, .. } => {
                for target in cases.values_mut() {
                    *target = f(*target);
                }
                *otherwise = f(*otherwise);
            }
            Terminator::MethodCall { goto_after, .. } => *goto_after = f(*goto_after),
            Terminator::Return => {}
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::GoTo(target) => write!(f, "goto -> {target}"),
            Terminator::SwitchInt {
                operand,
                cases,
                otherwise,
            } => {
                write!(f, "switchInt({operand}) -> [")?;
                for (value, target) in cases {
                    write!(f, "{value}: {target}, ")?;
                }
                write!(f, "otherwise: {otherwise}]")
            }
            Terminator::MethodCall {
                function,
                arguments,
                destination,
                goto_after,
            } => {
                write!(f, "{destination} = {function}(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ") -> {goto_after}")
            }
            Terminator::Return => write!(f, "return"),
        }
    }
}
