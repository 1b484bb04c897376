use reef_syntax::parse_source;
use reef_types::{type_check, TypeCheckResult, TypeCheckerErrorKind, TypeRef, TypedProgram, Variable};

mod control_flow;
mod declarations;
mod expressions;
mod patterns;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses and checks `source`. The source must be free of syntax errors.
fn check(source: &str) -> TypeCheckResult {
    init_logging();
    let parsed = parse_source("Main", source);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    type_check(&parsed.program)
}

fn check_ok(source: &str) -> TypedProgram {
    let result = check(source);
    assert!(result.errors.is_empty(), "unexpected type errors: {:#?}", result.errors);
    result.program
}

fn error_kinds(source: &str) -> Vec<TypeCheckerErrorKind> {
    check(source).error_kinds()
}

fn error_messages(source: &str) -> Vec<String> {
    check(source).errors.iter().map(|e| e.to_string()).collect()
}

fn variable<'p>(program: &'p TypedProgram, name: &str) -> &'p Variable {
    program
        .definitions
        .variables
        .iter()
        .find(|v| v.name == name)
        .unwrap_or_else(|| panic!("no variable named '{name}'"))
}

fn variable_type(program: &TypedProgram, name: &str) -> String {
    let ty: &TypeRef = &variable(program, name).ty;
    program.definitions.display_type(ty, &program.inference)
}
