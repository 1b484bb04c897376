//! Common helper functions for lowering tests.

use indexmap::IndexMap;
use reef_syntax::parse_source;
use reef_types::{type_check, DefId};

use crate::ir::*;
use crate::lowering::{lower_program_with_options, LoweringError, LoweringOptions};

pub(crate) const MODULE: &str = "Main";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses, checks and lowers `source`, which must be free of errors.
pub(crate) fn lower_with(source: &str, options: LoweringOptions) -> Result<LoweredModule, LoweringError> {
    init_logging();
    let parsed = parse_source(MODULE, source);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    let checked = type_check(&parsed.program);
    assert!(checked.errors.is_empty(), "unexpected type errors: {:#?}", checked.errors);
    lower_program_with_options(&checked.program, options)
}

pub(crate) fn lower(source: &str) -> Result<LoweredModule, LoweringError> {
    lower_with(source, LoweringOptions::default())
}

pub(crate) fn method<'m>(module: &'m LoweredModule, name: &str) -> &'m LoweredMethod {
    module
        .lowered_method(name)
        .unwrap_or_else(|| panic!("no method named '{name}' in:\n{module}"))
}

pub(crate) fn main_method(module: &LoweredModule) -> &LoweredMethod {
    method(module, "_Main")
}

pub(crate) fn data_type<'m>(module: &'m LoweredModule, name: &str) -> &'m DataType {
    module
        .data_type(name)
        .unwrap_or_else(|| panic!("no data type named '{name}' in:\n{module}"))
}

pub(crate) fn local(name: &str) -> Place {
    Place::local(name)
}

pub(crate) fn copy(place: Place) -> Operand {
    Operand::Copy(place)
}

pub(crate) fn assign(place: Place, rvalue: Rvalue) -> Statement {
    Statement::Assign(place, rvalue)
}

pub(crate) fn assign_use(place: Place, operand: Operand) -> Statement {
    Statement::Assign(place, Rvalue::Use(operand))
}

pub(crate) fn i32_const(value: i64) -> Operand {
    Operand::IntConstant { value, size: 4 }
}

pub(crate) fn i64_const(value: i64) -> Operand {
    Operand::IntConstant { value, size: 8 }
}

pub(crate) fn bool_const(value: bool) -> Operand {
    Operand::BoolConstant(value)
}

/// The discriminant value written for the variant at `index`.
pub(crate) fn tag(index: u64) -> Operand {
    Operand::UIntConstant { value: index, size: 2 }
}

pub(crate) fn bb(index: u32) -> BasicBlockId {
    BasicBlockId(index)
}

pub(crate) fn block(index: u32, statements: Vec<Statement>, terminator: Terminator) -> BasicBlock {
    BasicBlock {
        id: bb(index),
        statements,
        terminator,
    }
}

pub(crate) fn goto(index: u32) -> Terminator {
    Terminator::GoTo(bb(index))
}

pub(crate) fn switch(operand: Operand, cases: &[(u64, u32)], otherwise: u32) -> Terminator {
    Terminator::SwitchInt {
        operand,
        cases: cases
            .iter()
            .map(|(value, target)| (*value, bb(*target)))
            .collect::<IndexMap<_, _>>(),
        otherwise: bb(otherwise),
    }
}

/// A type declared in the test module.
pub(crate) fn user_type(name: &str) -> TypeReference {
    TypeReference::concrete(name, DefId::in_module(MODULE, name), Vec::new())
}

/// A type of the core library.
pub(crate) fn core_type(name: &str, type_arguments: Vec<TypeReference>) -> TypeReference {
    TypeReference::concrete(name, DefId::core(name), type_arguments)
}

pub(crate) fn primitive(name: &str) -> TypeReference {
    core_type(name, Vec::new())
}

/// `place._variantIdentifier`, read through the first variant.
pub(crate) fn discriminant(place: Place, first_variant: &str) -> Place {
    place.field(VARIANT_IDENTIFIER_FIELD, first_variant)
}

pub(crate) fn method_local(compiler_name: &str, user_name: Option<&str>, ty: TypeReference) -> MethodLocal {
    MethodLocal::new(compiler_name, user_name.map(str::to_owned), ty)
}

/// The local declared in source as `user_name`.
pub(crate) fn named(method: &LoweredMethod, user_name: &str) -> Place {
    method
        .parameters
        .iter()
        .chain(&method.locals)
        .find(|l| l.user_name.as_deref() == Some(user_name))
        .map(|l| Place::local(l.compiler_name.clone()))
        .unwrap_or_else(|| panic!("no local named '{user_name}' in {}", method.name))
}

/// The compiler temporaries of `method`, in allocation order.
pub(crate) fn temporaries(method: &LoweredMethod) -> Vec<Place> {
    method
        .locals
        .iter()
        .filter(|l| l.user_name.is_none() && l.compiler_name != LOCALS_OBJECT_LOCAL)
        .map(|l| Place::local(l.compiler_name.clone()))
        .collect()
}
