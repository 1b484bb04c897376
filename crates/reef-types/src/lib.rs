//! Type checking for Reef programs.
//!
//! Takes the [`LangProgram`] produced by `reef-syntax` and produces a
//! [`TypedProgram`]: every declared type, function and variable gets an entry
//! in [`Definitions`], every expression gets a resolved type, and every
//! semantic problem is reported as a [`TypeCheckerError`].
//!
//! Checking never stops at the first error. A failed rule leaves an
//! `Unknown` type behind so that the rest of the program is still checked.

mod checker;
pub mod def_id;
pub mod definitions;
pub mod error;
pub mod inference;
pub mod typed;
pub mod types;

pub use def_id::DefId;
pub use definitions::{
    Definitions, FieldDef, FunctionDef, FunctionKind, FunctionOwner, ParameterDef, TypeDef, TypeDefKind, Variable,
    VariableKind, VariantDef, VariantKind,
};
pub use error::{TypeCheckerError, TypeCheckerErrorKind};
pub use inference::{InferenceTable, VarKind};
pub use typed::*;
pub use types::*;

use reef_syntax::ast::LangProgram;

/// The outcome of checking one program.
#[derive(Debug)]
pub struct TypeCheckResult {
    pub program: TypedProgram,
    pub errors: Vec<TypeCheckerError>,
}

impl TypeCheckResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The kinds of the reported errors, in the order reported.
    pub fn error_kinds(&self) -> Vec<TypeCheckerErrorKind> {
        self.errors.iter().map(TypeCheckerError::kind).collect()
    }
}

/// Type checks a parsed program.
///
/// Each call owns its own checker state, so separate programs may be checked
/// concurrently.
pub fn type_check(program: &LangProgram) -> TypeCheckResult {
    log::debug!("type checking module '{}'", program.module_id);
    let mut checker = checker::TypeChecker::new(&program.module_id);
    checker.check_program(program);
    checker.finish()
}
