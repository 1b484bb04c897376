use expect_test::expect;
use reef_types::TypeCheckerErrorKind;

use crate::{check_ok, error_kinds, error_messages, variable_type};

#[test]
fn integer_literal_defaults_to_i32() {
    let program = check_ok("var a = 1;");
    assert_eq!(variable_type(&program, "a"), "i32");
}

#[test]
fn integer_literal_takes_the_declared_type() {
    let program = check_ok("var a: i64 = 1; var b = a + 2;");
    assert_eq!(variable_type(&program, "a"), "i64");
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn arithmetic_requires_integers() {
    expect![[r#"
        [
            "Mismatched types: expected integer, found string",
        ]
    "#]]
    .assert_debug_eq(&error_messages(r#"var a = "a" + "b";"#));
}

#[test]
fn boolean_operators_require_bool() {
    assert_eq!(
        error_kinds("var a = true && 1;"),
        vec![TypeCheckerErrorKind::MismatchedTypes]
    );
    let program = check_ok("var a = 1 < 2 || false;");
    assert_eq!(variable_type(&program, "a"), "bool");
}

#[test]
fn equality_accepts_integers_and_bools() {
    check_ok("var a = 1 == 2; var b = true != false;");
    assert_eq!(
        error_kinds(r#"var a = "a" == "b";"#),
        vec![TypeCheckerErrorKind::MismatchedTypes]
    );
}

#[test]
fn unknown_symbol_is_reported_once() {
    assert_eq!(error_kinds("var a = b; var c = a;"), vec![TypeCheckerErrorKind::SymbolNotFound]);
}

#[test]
fn immutable_local_cannot_be_reassigned() {
    assert_eq!(
        error_kinds("var a = 1; a = 2;"),
        vec![TypeCheckerErrorKind::NonMutableAssignment]
    );
    check_ok("var mut a = 1; a = 2;");
}

#[test]
fn first_assignment_initializes_a_declared_local() {
    let program = check_ok("var a: i64; a = 1; var b = a;");
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn declared_local_takes_the_type_of_its_first_assignment() {
    let program = check_ok("var a; a = true;");
    assert_eq!(variable_type(&program, "a"), "bool");
}

#[test]
fn local_without_any_type_is_reported() {
    assert_eq!(
        error_kinds("var a;"),
        vec![TypeCheckerErrorKind::UnresolvedInferredVariableType]
    );
}

#[test]
fn reading_before_assignment_is_reported() {
    assert_eq!(
        error_kinds("var a: i64; var b = a;"),
        vec![TypeCheckerErrorKind::AccessUninitializedVariable]
    );
}

#[test]
fn literal_is_not_assignable() {
    assert_eq!(error_kinds("1 = 2;"), vec![TypeCheckerErrorKind::ExpressionNotAssignable]);
}

#[test]
fn call_checks_argument_count() {
    let source = "
        fn Add(a: i64, b: i64): i64 { return a + b; }
        var c = Add(1);
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::IncorrectNumberOfMethodArguments]);
}

#[test]
fn call_result_has_the_return_type() {
    let program = check_ok(
        "
        fn Add(a: i64, b: i64): i64 { return a + b; }
        var c = Add(1, 2);
    ",
    );
    assert_eq!(variable_type(&program, "c"), "i64");
}

#[test]
fn non_function_cannot_be_called() {
    assert_eq!(error_kinds("var a = 1; a();"), vec![TypeCheckerErrorKind::ExpressionNotCallable]);
}

#[test]
fn generic_function_is_instantiated_per_call() {
    let program = check_ok(
        "
        fn Identity<T>(value: T): T { return value; }
        var a = Identity(true);
        var b = Identity::<i64>(1);
    ",
    );
    assert_eq!(variable_type(&program, "a"), "bool");
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn type_arguments_on_a_variable_are_rejected() {
    assert_eq!(
        error_kinds("var a = 1; var b = a::<i64>;"),
        vec![TypeCheckerErrorKind::GenericTypeArgumentsOnNonFunctionValue]
    );
}

#[test]
fn fall_out_unwraps_a_result() {
    let program = check_ok(
        r#"
        fn Parse(a: i64): result::<i64, string> {
            if (a > 0) {
                return ok(a);
            }
            return error("negative");
        }
        fn Double(a: i64): result::<i64, string> {
            var b = Parse(a)?;
            return ok(b + b);
        }
    "#,
    );
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn fall_out_outside_a_result_function() {
    let source = r#"
        fn Parse(a: i64): result::<i64, string> { return ok(a); }
        fn Bad(a: i64): i64 {
            var b = Parse(a)?;
            return b;
        }
    "#;
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::FallOutOperatorOutsideResultFunction]
    );
}

#[test]
fn function_with_a_return_type_must_return() {
    expect![[r#"
        [
            "Mismatched types: expected i64, found Unit",
        ]
    "#]]
    .assert_debug_eq(&error_messages("fn Get(): i64 { var a = 1; }"));
}

#[test]
fn tuple_members_are_accessed_by_position() {
    let program = check_ok("var a = (1, true); var b = a.Item1;");
    assert_eq!(variable_type(&program, "a"), "(i32, bool)");
    assert_eq!(variable_type(&program, "b"), "bool");
    assert_eq!(
        error_kinds("var a = (1, true); var b = a.Item2;"),
        vec![TypeCheckerErrorKind::UnknownTypeMember]
    );
}
