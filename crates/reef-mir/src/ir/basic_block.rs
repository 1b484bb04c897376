use std::fmt;

use super::{BasicBlockId, Statement, Terminator};

/// A straight-line run of statements ended by a single terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BasicBlockId,
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    {}: {{", self.id)?;
        for statement in &self.statements {
            writeln!(f, "        {statement};")?;
        }
        writeln!(f, "        {}", self.terminator)?;
        writeln!(f, "    }}")
    }
}
