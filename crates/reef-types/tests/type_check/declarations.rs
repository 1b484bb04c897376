use expect_test::expect;
use reef_types::{FunctionKind, TypeCheckerErrorKind, TypeDefId, VariantKind};

use crate::{check_ok, error_kinds, error_messages, variable, variable_type};

#[test]
fn initializer_reports_unknown_and_missing_fields_together() {
    let source = "
        class MyClass { pub field A: i64, pub field B: i64 }
        var a = new MyClass { A = 1, C = 2 };
    ";
    expect![[r#"
        [
            "Unknown field 'C' in class MyClass",
            "Fields left unassigned in initializer: B",
        ]
    "#]]
    .assert_debug_eq(&error_messages(source));
}

#[test]
fn initializer_rejects_a_field_set_twice() {
    let source = "
        class MyClass { pub field A: i64 }
        var a = new MyClass { A = 1, A = 2 };
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::ClassFieldSetMultipleTypesInInitializer]
    );
}

#[test]
fn private_fields_are_settable_only_inside_the_class() {
    let source = "
        class MyClass {
            field Secret: i64,

            pub static fn Create(): MyClass {
                return new MyClass { Secret = 1 };
            }
        }
        var a = MyClass::Create();
        var b = a.Secret;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::PrivateFieldReferenced]);

    let source = "
        class MyClass { field Secret: i64 }
        var a = new MyClass { Secret = 1 };
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::PrivateFieldReferenced]);
}

#[test]
fn mutation_needs_a_mutable_field_and_owner() {
    let source = "
        class MyClass { pub mut field Value: i64, pub field Fixed: i64 }
        var mut a = new MyClass { Value = 1, Fixed = 2 };
        a.Value = 2;
    ";
    check_ok(source);

    let source = "
        class MyClass { pub mut field Value: i64, pub field Fixed: i64 }
        var a = new MyClass { Value = 1, Fixed = 2 };
        a.Value = 2;
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::NonMutableMemberOwnerAssignment]
    );

    let source = "
        class MyClass { pub mut field Value: i64, pub field Fixed: i64 }
        var mut a = new MyClass { Value = 1, Fixed = 2 };
        a.Fixed = 2;
    ";
    assert_eq!(error_kinds(source), vec![TypeCheckerErrorKind::NonMutableMemberAssignment]);
}

#[test]
fn static_and_instance_members_are_not_interchangeable() {
    let source = "
        class MyClass {
            pub fn Instance() {}
            pub static fn Static() {}
        }
        var a = new MyClass {};
        a.Static();
        MyClass::Instance();
    ";
    assert_eq!(
        error_kinds(source),
        vec![
            TypeCheckerErrorKind::InstanceMemberAccessOnStaticMember,
            TypeCheckerErrorKind::StaticMemberAccessOnInstanceMember,
        ]
    );
}

#[test]
fn instance_function_needs_mut_to_assign_fields() {
    let source = "
        class Counter {
            mut field Count: i64,

            pub fn Increment() {
                Count = Count + 1;
            }
        }
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::MutatingInstanceInNonMutableFunction]
    );

    check_ok(
        "
        class Counter {
            mut field Count: i64,

            pub mut fn Increment() {
                Count = Count + 1;
            }
        }
    ",
    );
}

#[test]
fn this_is_only_available_in_instance_functions() {
    assert_eq!(
        error_kinds("fn Foo() { var a = this; }"),
        vec![TypeCheckerErrorKind::ThisAccessedOutsideOfInstanceMethod]
    );
    let source = "
        class MyClass {
            field Value: i64,

            static fn Get(): i64 {
                return Value;
            }
        }
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::AccessInstanceMemberInStaticContext]
    );
}

#[test]
fn generic_class_members_are_instantiated() {
    let program = check_ok(
        "
        class Box<T> {
            pub field Value: T,

            pub fn Get(): T {
                return Value;
            }
        }
        var a = new Box::<i64> { Value = 1 };
        var b = a.Get();
        var c = new Box { Value = true };
        var d = c.Value;
    ",
    );
    assert_eq!(variable_type(&program, "a"), "Box::<i64>");
    assert_eq!(variable_type(&program, "b"), "i64");
    assert_eq!(variable_type(&program, "d"), "bool");
}

#[test]
fn type_arguments_are_counted() {
    let source = "
        class Box<T> { pub field Value: T }
        fn Take(a: Box::<i64, i64>) {}
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::IncorrectNumberOfTypeArguments]
    );
}

#[test]
fn conflicting_declarations_are_reported() {
    assert_eq!(
        error_kinds("union A { X } class A {}"),
        vec![TypeCheckerErrorKind::ConflictingTypeName]
    );
    assert_eq!(
        error_kinds("fn F() {} fn F() {}"),
        vec![TypeCheckerErrorKind::ConflictingFunctionName]
    );
    assert_eq!(
        error_kinds("union A { X, X }"),
        vec![TypeCheckerErrorKind::DuplicateVariantName]
    );
    assert_eq!(
        error_kinds("class A<T, T> {}"),
        vec![TypeCheckerErrorKind::DuplicateGenericParameter]
    );
    assert_eq!(
        error_kinds("class A<i64> {}"),
        vec![TypeCheckerErrorKind::TypeParameterConflictsWithType]
    );
    assert_eq!(
        error_kinds("class A<T> { fn F<T>() {} }"),
        vec![TypeCheckerErrorKind::ConflictingTypeParameter]
    );
    assert_eq!(
        error_kinds("fn F(a: i64, a: i64) {}"),
        vec![TypeCheckerErrorKind::DuplicateFunctionParameter]
    );
}

#[test]
fn mut_is_rejected_where_there_is_no_instance() {
    assert_eq!(
        error_kinds("mut fn F() {}"),
        vec![TypeCheckerErrorKind::GlobalFunctionMarkedAsMutable]
    );
    assert_eq!(
        error_kinds("class A { static mut fn F() {} }"),
        vec![TypeCheckerErrorKind::StaticFunctionMarkedAsMutable]
    );
    assert_eq!(
        error_kinds("class A { fn F() { mut fn G() {} } }"),
        vec![TypeCheckerErrorKind::CannotCreateMutableFunctionWithinNonMutableFunction]
    );
}

#[test]
fn static_fields_need_initializers() {
    assert_eq!(
        error_kinds("class A { static field B: i64 }"),
        vec![TypeCheckerErrorKind::StaticFieldWithoutInitializer]
    );
    assert_eq!(
        error_kinds("class A { field B: i64 = 1 }"),
        vec![TypeCheckerErrorKind::InstanceFieldWithInitializer]
    );

    let program = check_ok(
        "
        class A { pub static field B: i64 = 1 }
        var b = A::B;
    ",
    );
    assert_eq!(variable_type(&program, "b"), "i64");
    let initializer = program
        .definitions
        .functions
        .iter()
        .find(|f| f.name == "B__Initializer")
        .expect("static initializer function");
    assert!(matches!(initializer.kind, FunctionKind::StaticInitializer { .. }));
}

#[test]
fn tuple_variants_get_constructor_functions() {
    let program = check_ok(
        "
        union MyUnion { A(i64, string), B }
        var a = MyUnion::A(1, \"one\");
    ",
    );
    assert_eq!(variable_type(&program, "a"), "MyUnion");

    let index = program
        .definitions
        .types
        .iter()
        .position(|t| t.name == "MyUnion")
        .expect("union is defined");
    let union = TypeDefId(index as u32);
    let variants = program.definitions.union_variants(union).unwrap_or_default();
    let VariantKind::Tuple { create_function, .. } = &variants[0].kind else {
        panic!("A is a tuple variant");
    };
    let create = program.definitions.function(*create_function);
    assert_eq!(create.id.full_name, format!("{}__Create__A", program.definitions.ty(union).id.full_name));
    assert_eq!(create.parameters.len(), 2);
}

#[test]
fn class_variant_needs_an_initializer() {
    let source = "
        union MyUnion { A { field X: i64 } }
        var a = MyUnion::A;
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::UnionClassVariantWithoutInitializer]
    );
    check_ok(
        "
        union MyUnion { A { field X: i64 } }
        var a = new MyUnion::A { X = 1 };
    ",
    );
    assert_eq!(
        error_kinds("union MyUnion { A(i64) } var a = new MyUnion::A { Item0 = 1 };"),
        vec![TypeCheckerErrorKind::UnionClassVariantInitializerNotClassVariant]
    );
}

#[test]
fn local_functions_capture_outer_variables() {
    let program = check_ok(
        "
        fn Outer(): i64 {
            var a = 1;
            fn Inner(): i64 {
                return a;
            }
            return Inner();
        }
    ",
    );
    let inner = program
        .definitions
        .functions
        .iter()
        .find(|f| f.name == "Inner")
        .expect("local function");
    assert_eq!(inner.accessed_outer_variables.len(), 1);
    assert!(variable(&program, "a").referenced_in_closure);
    assert_eq!(variable_type(&program, "a"), "i64");
}

#[test]
fn static_local_functions_cannot_capture() {
    let source = "
        fn Outer() {
            var a = 1;
            static fn Inner(): i32 {
                return a;
            }
        }
    ";
    assert_eq!(
        error_kinds(source),
        vec![TypeCheckerErrorKind::StaticLocalFunctionAccessesOuterVariable]
    );
}
