//! Reef MIR (Mid-level Intermediate Representation)
//!
//! This crate defines the basic-block IR a Reef module is lowered to, and
//! the lowering pass that produces it from a checked [`reef_types::TypedProgram`].

pub mod ir;
pub mod lowering;

pub use ir::*;
pub use lowering::{lower_program, lower_program_with_options, LoweringError, LoweringOptions};
