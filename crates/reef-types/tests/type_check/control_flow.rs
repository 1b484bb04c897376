use reef_types::TypeCheckerErrorKind;

use crate::{check_ok, error_kinds, variable_type};

const ASSIGNED_ON_EVERY_BRANCH: &str = "
    var a: i64;
    if (true) {
        a = 1;
    } else if (false) {
        a = 2;
    } else {
        a = 3;
    }
    var b = a;
";

#[test]
fn local_assigned_on_every_branch_is_initialized() {
    let program = check_ok(ASSIGNED_ON_EVERY_BRANCH);
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn local_missing_from_an_else_if_stays_uninitialized() {
    let source = "
        var a: i64;
        if (true) {
            a = 1;
        } else if (false) {
        } else {
            a = 3;
        }
        var b = a;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::AccessUninitializedVariable]);
}

#[test]
fn if_without_else_never_initializes() {
    let source = "
        var a: i64;
        if (true) {
            a = 1;
        }
        var b = a;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::AccessUninitializedVariable]);
}

#[test]
fn each_branch_may_make_the_first_assignment() {
    // `a` is not mutable, yet every branch assigns it once.
    check_ok(ASSIGNED_ON_EVERY_BRANCH);
    let source = "
        var a: i64;
        a = 1;
        a = 2;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::NonMutableAssignment]);
}

#[test]
fn assignments_in_a_loop_do_not_initialize() {
    let source = "
        var a: i64;
        while (true) {
            a = 1;
        }
        var b = a;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::AccessUninitializedVariable]);
}

#[test]
fn break_and_continue_need_a_loop() {
    assert_eq!(
        error_kinds("break; continue;"),
        vec![
            TypeCheckerErrorKind::BreakUsedOutsideOfLoop,
            TypeCheckerErrorKind::ContinueUsedOutsideOfLoop,
        ]
    );
    check_ok("while (true) { if (false) { continue; } break; }");
}

#[test]
fn loop_in_an_outer_function_does_not_count() {
    let source = "
        fn Outer() {
            while (true) {
                fn Inner() {
                    break;
                }
                Inner();
            }
        }
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::BreakUsedOutsideOfLoop]);
}

#[test]
fn if_value_needs_an_else() {
    assert_eq!(
        error_kinds("var a = if (true) { 1 };"),
        vec![TypeCheckerErrorKind::IfExpressionValueUsedWithoutElseBranch]
    );
    let program = check_ok("var a = if (true) { 1 } else if (false) { 2 } else { 3 };");
    assert_eq!(variable_type(&program, "a"), "i32");
}

#[test]
fn if_branches_must_agree() {
    assert_eq!(
        error_kinds(r#"var a = if (true) { 1 } else { "one" };"#),
        vec![TypeCheckerErrorKind::MismatchedTypes]
    );
}

#[test]
fn diverging_branch_takes_the_other_branch_type() {
    let program = check_ok(
        "
        fn Pick(a: bool): i64 {
            var b = if (a) { return 1; } else { 2 };
            return b;
        }
    ",
    );
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn condition_must_be_bool() {
    assert_eq!(error_kinds("if (1) { }"), vec![TypeCheckerErrorKind::MismatchedTypes]);
}

#[test]
fn block_value_is_its_tail() {
    let program = check_ok("var a = { var b = true; b };");
    assert_eq!(variable_type(&program, "a"), "bool");
}

#[test]
fn match_type_comes_from_the_first_arm() {
    let source = "
        union MyUnion { A, B, C }
        var a = MyUnion::A;
        var b = match (a) { MyUnion::A => 1, MyUnion::B => 2, MyUnion::C => 3 };
    ";
    let program = check_ok(source);
    assert_eq!(variable_type(&program, "a"), "MyUnion");
    assert_eq!(variable_type(&program, "b"), "i32");

    let source = r#"
        union MyUnion { A, B }
        var a = MyUnion::A;
        var b = match (a) { MyUnion::A => 1, MyUnion::B => "two" };
    "#;
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::MismatchedTypes]);
}

#[test]
fn match_arms_join_assignments() {
    let source = "
        union MyUnion { A, B }
        var a = MyUnion::A;
        var b: i64;
        match (a) {
            MyUnion::A => { b = 1; },
            MyUnion::B => { b = 2; }
        };
        var c = b;
    ";
    check_ok(source);

    let source = "
        union MyUnion { A, B }
        var a = MyUnion::A;
        var b: i64;
        match (a) {
            MyUnion::A => { b = 1; },
            MyUnion::B => { }
        };
        var c = b;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::AccessUninitializedVariable]);
}

#[test]
fn return_value_must_match_the_function() {
    assert_eq!(
        error_kinds(r#"fn Get(): i64 { return "one"; }"#),
        vec![TypeCheckerErrorKind::MismatchedTypes]
    );
    assert_eq!(
        error_kinds("fn Get(): i64 { return; }"),
        vec![TypeCheckerErrorKind::MismatchedTypes]
    );
    check_ok("fn Get() { return; }");
}

#[test]
fn diverging_arms_do_not_decide_the_match_type() {
    let program = check_ok(
        "
        union MyUnion { A, B }
        var a = MyUnion::A;
        var b = match (a) { MyUnion::A => todo!, MyUnion::B => 1 };
    ",
    );
    assert_eq!(variable_type(&program, "b"), "i32");

    let source = "
        union MyUnion { A, B }
        var a = MyUnion::A;
        var b = match (a) { MyUnion::A => 1, MyUnion::B => true };
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::MismatchedTypes]);
}
