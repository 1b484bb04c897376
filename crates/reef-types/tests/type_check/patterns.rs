use expect_test::expect;
use reef_types::TypeCheckerErrorKind;

use crate::{check_ok, error_kinds, error_messages, variable_type};

#[test]
fn class_variant_patterns_list_every_field_or_discard() {
    let source = "
        union MyUnion { A { field X: i64, field Y: i64 }, B }
        var a = MyUnion::B;
        var b = a matches MyUnion::A { X };
    ";
    expect![[r#"
        [
            "Pattern does not list fields Y; add '_' to ignore them",
        ]
    "#]]
    .assert_debug_eq(&error_messages(source));

    check_ok(
        "
        union MyUnion { A { field X: i64, field Y: i64 }, B }
        var a = MyUnion::B;
        var b = a matches MyUnion::A { X, _ };
        var c = a matches MyUnion::A { X: var x, Y: _ };
    ",
    );
}

#[test]
fn tuple_variant_pattern_arity_must_match() {
    let source = "
        union MyUnion { A(i64, string) }
        var a = MyUnion::A(1, \"one\");
        var b = a matches MyUnion::A(var x);
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::IncorrectNumberOfPatternsInTupleVariantUnionPattern]
    );
}

#[test]
fn variant_pattern_shape_must_match_the_variant() {
    let source = "
        union MyUnion { A(i64), B { field X: i64 } }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A { X };
        var c = a matches MyUnion::B(var x);
    ";
    expect![[r#"
        [
            "Variant 'A' is not a class variant",
            "Variant 'B' is not a tuple variant",
        ]
    "#]]
    .assert_debug_eq(&error_messages(source));
}

#[test]
fn bare_variant_pattern_matches_any_variant_kind() {
    check_ok(
        "
        union MyUnion { A(i64), B { field X: i64 }, C }
        var a = MyUnion::C;
        var b = match (a) {
            MyUnion::A => 1,
            MyUnion::B => 2,
            MyUnion::C => 3
        };
    ",
    );
}

#[test]
fn unknown_variants_and_non_unions_are_reported() {
    let source = "
        union MyUnion { A }
        var a = MyUnion::A;
        var b = a matches MyUnion::D;
        var c = 1;
        var d = c matches i64::A;
    ";
    assert_eq!(
        error_kinds(source),
        vec![
            TypeCheckerErrorKind::UnknownTypeMember,
            TypeCheckerErrorKind::ExpectedUnionType,
        ]
    );
}

#[test]
fn class_pattern_binds_fields_in_the_guarded_branch() {
    let program = check_ok(
        "
        class Point { pub field X: i64, pub field Y: i64 }
        var p = new Point { X = 1, Y = 2 };
        var mut sum = 0;
        if (p matches Point { X, Y: var y }) {
            sum = X + y;
        }
    ",
    );
    assert_eq!(variable_type(&program, "sum"), "i64");
    assert_eq!(variable_type(&program, "y"), "i64");
}

#[test]
fn class_pattern_rejects_hidden_and_static_fields() {
    let source = "
        class Point {
            field Secret: i64,
            pub static field Origin: i64 = 0,

            pub static fn Create(): Point {
                return new Point { Secret = 1 };
            }
        }
        var p = Point::Create();
        var a = p matches Point { Secret, _ };
        var b = p matches Point { Origin, _ };
    ";
    assert_eq!(
        error_kinds(source),
        vec![
            TypeCheckerErrorKind::PrivateFieldReferenced,
            TypeCheckerErrorKind::StaticFieldInClassPattern,
        ]
    );
}

#[test]
fn class_pattern_needs_a_class() {
    assert_eq!(
        error_kinds("var a = 1 matches i64 { X };"),
        vec![TypeCheckerErrorKind::NonClassUsedInClassPattern]
    );
}

#[test]
fn type_pattern_constrains_the_matched_value() {
    let program = check_ok(
        "
        var v = 1;
        var b = match (v) {
            i64 var n => n
        };
    ",
    );
    assert_eq!(variable_type(&program, "v"), "i64");
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn each_arm_has_its_own_bindings() {
    let program = check_ok(
        "
        union MyUnion { A(i64), B(i64) }
        var a = MyUnion::A(1);
        var b = match (a) {
            MyUnion::A(var x) => x,
            MyUnion::B(var x) => x
        };
    ",
    );
    assert_eq!(variable_type(&program, "b"), "i64");
}

#[test]
fn mutable_bindings_need_a_mutable_value() {
    let source = "
        union MyUnion { A(i64) }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A(var mut x);
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::NonMutableAssignment]);

    check_ok(
        "
        union MyUnion { A(i64) }
        var mut a = MyUnion::A(1);
        var b = a matches MyUnion::A(var mut x);
    ",
    );
}

#[test]
fn matches_bindings_are_only_assigned_where_the_match_holds() {
    check_ok(
        "
        union MyUnion { A(i64), B }
        var a = MyUnion::A(1);
        if (a matches MyUnion::A(var x) && x > 0) {
            var y = x;
        }
    ",
    );

    let source = "
        union MyUnion { A(i64), B }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A(var x);
        var c = x;
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::AccessUninitializedVariable]
    );
}

#[test]
fn matches_bindings_are_visible_on_the_right_of_and() {
    check_ok(
        "
        union MyUnion { A(i64), B }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A(var x) && x > 2;
        var c = a matches MyUnion::A(var y) && a matches MyUnion::A(var z) && y == z;
    ",
    );

    let source = "
        union MyUnion { A(i64), B }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A(var x) || x > 2;
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::AccessUninitializedVariable]
    );

    let source = "
        union MyUnion { A(i64), B }
        var a = MyUnion::A(1);
        var b = a matches MyUnion::A(var x) && x > 2;
        var c = x;
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::AccessUninitializedVariable]
    );
}
