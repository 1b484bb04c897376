use expect_test::expect;
use reef_types::DefId;

use super::helpers::*;
use crate::ir::*;
use crate::lowering::LoweringError;

#[test]
fn test_return_binary_operation() -> Result<(), LoweringError> {
    let module = lower("fn Add(a: i64, b: i64): i64 { return a + b; }")?;
    let add = method(&module, "Add");

    assert_eq!(add.id, DefId::in_module(MODULE, "Add"));
    assert_eq!(
        add.parameters,
        vec![
            method_local("_param0", Some("a"), primitive("i64")),
            method_local("_param1", Some("b"), primitive("i64")),
        ]
    );
    assert_eq!(add.return_value, method_local(RETURN_VALUE_LOCAL, None, primitive("i64")));
    assert!(add.locals.is_empty());
    assert_eq!(
        add.basic_blocks,
        vec![block(
            0,
            vec![assign(
                local(RETURN_VALUE_LOCAL),
                Rvalue::BinaryOperation {
                    left: copy(local("_param0")),
                    right: copy(local("_param1")),
                    kind: BinaryOperationKind::Add,
                },
            )],
            Terminator::Return,
        )]
    );

    expect![[r#"
        fn Add(_param0: i64 (a), _param1: i64 (b)) -> i64 {
            bb0: {
                _returnValue = Add(copy _param0, copy _param1);
                return
            }
        }
    "#]]
    .assert_eq(&Method::Lowered(add.clone()).to_string());
    Ok(())
}

#[test]
fn test_empty_function_returns_immediately() -> Result<(), LoweringError> {
    let module = lower("fn Nothing() {}")?;
    let nothing = method(&module, "Nothing");
    assert_eq!(nothing.return_value.ty, primitive("Unit"));
    assert_eq!(nothing.basic_blocks, vec![block(0, vec![], Terminator::Return)]);
    Ok(())
}

#[test]
fn test_main_is_only_emitted_with_top_level_code() -> Result<(), LoweringError> {
    let module = lower("fn Nothing() {}")?;
    assert!(module.method("_Main").is_none());

    let module = lower("var a = 1;")?;
    assert!(module.method("_Main").is_some());
    Ok(())
}

#[test]
fn test_variable_declarations() -> Result<(), LoweringError> {
    let module = lower("var a = 1; var b = a;")?;
    let main = main_method(&module);

    assert_eq!(
        main.locals,
        vec![
            method_local("_local0", Some("a"), primitive("i32")),
            method_local("_local1", Some("b"), primitive("i32")),
        ]
    );
    assert_eq!(
        main.basic_blocks,
        vec![block(
            0,
            vec![
                assign_use(local("_local0"), i32_const(1)),
                assign_use(local("_local1"), copy(local("_local0"))),
            ],
            Terminator::Return,
        )]
    );
    Ok(())
}

#[test]
fn test_assignment_writes_directly_to_the_variable() -> Result<(), LoweringError> {
    let module = lower("var mut a = 1; a = a + 2;")?;
    let main = main_method(&module);

    assert_eq!(main.locals.len(), 1);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign_use(local("_local0"), i32_const(1)),
            assign(
                local("_local0"),
                Rvalue::BinaryOperation {
                    left: copy(local("_local0")),
                    right: i32_const(2),
                    kind: BinaryOperationKind::Add,
                },
            ),
        ]
    );
    Ok(())
}

#[test]
fn test_declared_integer_type_sets_the_constant_size() -> Result<(), LoweringError> {
    let module = lower("var a: u8 = 3; var b: i16 = 4;")?;
    let main = main_method(&module);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign_use(local("_local0"), Operand::UIntConstant { value: 3, size: 1 }),
            assign_use(local("_local1"), Operand::IntConstant { value: 4, size: 2 }),
        ]
    );
    Ok(())
}

#[test]
fn test_literals_and_not() -> Result<(), LoweringError> {
    let module = lower("var a = \"hi\"; var b = !true;")?;
    let main = main_method(&module);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign_use(local("_local0"), Operand::StringConstant("hi".to_owned())),
            assign(
                local("_local1"),
                Rvalue::UnaryOperation {
                    operand: bool_const(true),
                    kind: UnaryOperationKind::Not,
                },
            ),
        ]
    );
    Ok(())
}

#[test]
fn test_call_result_is_stored_in_a_temporary() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Add(a: i64, b: i64): i64 { return a + b; }
        var c = Add(1, 2) + 3;
    ",
    )?;
    let main = main_method(&module);

    assert_eq!(
        main.locals,
        vec![
            method_local("_local0", Some("c"), primitive("i64")),
            method_local("_local1", None, primitive("i64")),
        ]
    );
    assert_eq!(
        main.basic_blocks,
        vec![
            block(
                0,
                vec![],
                Terminator::MethodCall {
                    function: FunctionReference {
                        id: DefId::in_module(MODULE, "Add"),
                        type_arguments: vec![],
                    },
                    arguments: vec![i64_const(1), i64_const(2)],
                    destination: local("_local1"),
                    goto_after: bb(1),
                },
            ),
            block(
                1,
                vec![assign(
                    local("_local0"),
                    Rvalue::BinaryOperation {
                        left: copy(local("_local1")),
                        right: i64_const(3),
                        kind: BinaryOperationKind::Add,
                    },
                )],
                Terminator::Return,
            ),
        ]
    );
    Ok(())
}

#[test]
fn test_generic_function_takes_type_arguments() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Identity<T>(value: T): T { return value; }
        var a = Identity(true);
    ",
    )?;

    let identity = method(&module, "Identity");
    let generic = TypeReference::Generic {
        owner: DefId::in_module(MODULE, "Identity"),
        name: "T".to_owned(),
    };
    assert_eq!(identity.type_parameters, vec!["T".to_owned()]);
    assert_eq!(identity.parameters[0].ty, generic);
    assert_eq!(identity.return_value.ty, generic);

    let main = main_method(&module);
    let Terminator::MethodCall {
        function, destination, ..
    } = &main.basic_blocks[0].terminator
    else {
        panic!("expected a call, found {}", main.basic_blocks[0].terminator);
    };
    assert_eq!(function.type_arguments, vec![primitive("bool")]);
    assert_eq!(destination, &local("_local0"));
    Ok(())
}

#[test]
fn test_lowering_is_deterministic() -> Result<(), LoweringError> {
    let source = "
        union MyUnion { A, B(i64), C { field X: i64 } }
        class Point { pub field X: i64, pub field Y: i64 }
        fn Outer(): i64 {
            var a = 1;
            fn Inner(): i64 { return a; }
            return Inner();
        }
        var p = new Point { Y = 2, X = 1 };
        var u = MyUnion::B(3);
        var b = match (u) { MyUnion::B(var x) => x, _ => p.X };
    ";
    let first = lower(source)?;
    let second = lower(source)?;
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    Ok(())
}
