//! Tests for the lowering pass.

mod aggregates;
mod basic;
mod closures;
mod errors;
mod helpers;
