//! # MIR Lowering (`reef-mir::lowering`)
//!
//! Transforms a checked [`TypedProgram`] into a [`LoweredModule`]: data types
//! for every class and union, and a basic-block method for every function.
//!
//! ## Key Concepts & Design
//!
//! *   **Destination passing:** expressions are lowered into a [`Place`] chosen by
//!     their parent. Operand-shaped expressions (literals, variables, field reads)
//!     are read in place; everything else gets a fresh `_localN` temporary.
//! *   **Block arena:** blocks are reserved as labels before they are filled, so
//!     switches can name their targets up front. Labels are numbered `bbN` in the
//!     order they are placed once the method is finished (`blocks` submodule).
//! *   **Pattern compilation:** `match` arms and `matches` patterns are compiled into
//!     nested `SwitchInt` decision trees over the `_variantIdentifier` field. The
//!     scrutinee is evaluated once; sub-patterns are read as nested field places
//!     of it (`pattern` submodule).
//! *   **Closures:** a pre-pass finds every variable a local function captures before
//!     any code is emitted. Captured variables live in a synthesized
//!     `<Function>__Locals` object; local functions receive a `<Function>__Closure`
//!     object holding the locals objects (and `this`) they reach into (`prepass`
//!     submodule).
//!
//! ## Overall Lowering Process ([`lower_program`])
//!
//! 1.  **Capture analysis (`prepass`):** computes, per function, the locals object
//!     layout and the closure object layout.
//! 2.  **Data types (`module`):** unions, then classes, then the synthesized
//!     locals and closure types.
//! 3.  **Methods (`module`):** union functions and tuple-variant constructors,
//!     class functions, `_Main`, then global functions. Local functions are
//!     emitted before the function declaring them.
//! 4.  **Built-in types:** with [`LoweringOptions::emit_builtin_types`], the
//!     `result`, ``Function`N`` and ``Tuple`N`` types the module references are
//!     appended, along with their methods.
//!
//! ## Submodules
//!
//! *   [`context`]: [`FunctionLoweringContext`] for the state of one method body.
//! *   [`blocks`]: the basic-block arena.
//! *   [`expr`]: expressions, calls, object construction and function objects.
//! *   [`control_flow`]: `if`, `while`, short-circuit operators, `return` and fallout.
//! *   [`pattern`]: `match` and `matches`.
//! *   [`module`]: data types, method assembly and the entry points.
//! *   [`prepass`]: closure capture analysis.
//! *   [`types`]: [`TypeRef`](reef_types::TypeRef) to [`TypeReference`] translation.

pub mod blocks;
pub mod context;
pub mod control_flow;
pub mod expr;
pub mod module;
pub mod pattern;
pub mod prepass;
pub mod types;
#[cfg(test)]
mod tests;

pub use module::{lower_program, lower_program_with_options};

use crate::ir::*;
use context::FunctionLoweringContext;
use reef_types::{
    DefId, Definitions, FunctionDef, FunctionId, FunctionKind, FunctionOwner, TypeDefId, TypedExpr, TypedExprKind,
    TypedPattern, TypedPatternKind, TypedProgram, VariableId, VariableKind, VariantDef, VariantKind,
};

/// Faults raised while lowering a program.
///
/// Lowering only runs on programs that checked without errors, so every
/// variant signals a broken invariant rather than a user mistake.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoweringError {
    /// A type was still unresolved when lowering reached it.
    #[error("no concrete type for {context}")]
    #[diagnostic(code(reef_mir::missing_type))]
    MissingType { context: String },

    /// A pattern or initializer named a variant the union does not declare.
    #[error("type '{ty}' has no variant at index {variant}")]
    #[diagnostic(code(reef_mir::unknown_variant))]
    UnknownVariant { ty: String, variant: usize },

    /// Any other inconsistency in the typed program.
    #[error("internal lowering error: {0}")]
    #[diagnostic(code(reef_mir::internal))]
    Internal(String),
}

/// Configures [`lower_program_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Also emit the built-in `result`, ``Function`N`` and ``Tuple`N`` data
    /// types the module references, with their methods.
    pub emit_builtin_types: bool,
}
