use reef_types::DefId;

use super::helpers::*;
use crate::ir::*;
use crate::lowering::{LoweringError, LoweringOptions};

fn synthesized(function: &str, suffix: &str) -> TypeReference {
    let id = DefId::in_module(MODULE, function).nested(suffix);
    let name = id.name().to_owned();
    TypeReference::concrete(name, id, vec![])
}

fn function_object(arguments: Vec<TypeReference>) -> TypeReference {
    core_type(&format!("Function`{}", arguments.len()), arguments)
}

#[test]
fn test_captured_local_lives_in_the_locals_object() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Outer(): i64 {
            var a = 1;
            fn Inner(): i64 {
                return a;
            }
            return Inner();
        }
    ",
    )?;
    let locals_type = synthesized("Outer", "Locals");
    let closure_type = synthesized("Outer__Inner", "Closure");

    // Local functions come before the function declaring them.
    let names: Vec<&str> = module.methods.iter().map(Method::name).collect();
    assert_eq!(names, vec!["Outer__Inner", "Outer"]);

    let outer = method(&module, "Outer");
    assert_eq!(
        outer.locals,
        vec![
            method_local(LOCALS_OBJECT_LOCAL, None, locals_type.clone()),
            method_local("_local1", None, closure_type.clone()),
        ]
    );
    let locals_object = local(LOCALS_OBJECT_LOCAL);
    assert_eq!(
        outer.basic_blocks,
        vec![
            block(
                0,
                vec![
                    assign(locals_object.clone(), Rvalue::CreateObject(locals_type.clone())),
                    assign_use(locals_object.clone().class_field("a"), i64_const(1)),
                    assign(local("_local1"), Rvalue::CreateObject(closure_type.clone())),
                    assign_use(local("_local1").class_field("Outer__Locals"), copy(locals_object)),
                ],
                Terminator::MethodCall {
                    function: FunctionReference {
                        id: DefId::in_module(MODULE, "Outer").nested("Inner"),
                        type_arguments: vec![],
                    },
                    arguments: vec![copy(local("_local1"))],
                    destination: local(RETURN_VALUE_LOCAL),
                    goto_after: bb(1),
                },
            ),
            block(1, vec![], Terminator::Return),
        ]
    );

    let inner = method(&module, "Outer__Inner");
    assert_eq!(
        inner.parameters,
        vec![method_local("_param0", Some("closure"), closure_type)]
    );
    assert_eq!(
        inner.basic_blocks,
        vec![block(
            0,
            vec![assign_use(
                local(RETURN_VALUE_LOCAL),
                copy(local("_param0").class_field("Outer__Locals").class_field("a")),
            )],
            Terminator::Return,
        )]
    );
    Ok(())
}

#[test]
fn test_locals_and_closure_types_are_synthesized() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Outer(): i64 {
            var a = 1;
            fn Inner(): i64 {
                return a;
            }
            return Inner();
        }
    ",
    )?;

    let locals = data_type(&module, "Outer__Locals");
    assert_eq!(
        locals.variants,
        vec![DataTypeVariant {
            name: CLASS_VARIANT.to_owned(),
            fields: vec![DataTypeField {
                name: "a".to_owned(),
                ty: primitive("i64"),
            }],
        }]
    );

    let closure = data_type(&module, "Outer__Inner__Closure");
    assert_eq!(
        closure.variants[0].fields,
        vec![DataTypeField {
            name: "Outer__Locals".to_owned(),
            ty: synthesized("Outer", "Locals"),
        }]
    );
    Ok(())
}

#[test]
fn test_captured_parameter_is_copied_into_the_locals_object() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Scale(factor: i64): i64 {
            fn Apply(value: i64): i64 { return value * factor; }
            return Apply(2);
        }
    ",
    )?;

    let scale = method(&module, "Scale");
    let locals_object = local(LOCALS_OBJECT_LOCAL);
    assert_eq!(
        scale.basic_blocks[0].statements[..2],
        [
            assign(locals_object.clone(), Rvalue::CreateObject(synthesized("Scale", "Locals"))),
            assign_use(locals_object.class_field("factor"), copy(local("_param0"))),
        ]
    );
    let Terminator::MethodCall { arguments, .. } = &scale.basic_blocks[0].terminator else {
        panic!("expected a call, found {}", scale.basic_blocks[0].terminator);
    };
    assert_eq!(arguments, &vec![copy(local("_local1")), i64_const(2)]);

    let apply = method(&module, "Scale__Apply");
    assert_eq!(apply.parameters.len(), 2);
    assert_eq!(apply.parameters[1], method_local("_param1", Some("value"), primitive("i64")));
    assert_eq!(
        apply.basic_blocks[0].statements,
        vec![assign(
            local(RETURN_VALUE_LOCAL),
            Rvalue::BinaryOperation {
                left: copy(local("_param1")),
                right: copy(local("_param0").class_field("Scale__Locals").class_field("factor")),
                kind: BinaryOperationKind::Multiply,
            },
        )]
    );
    Ok(())
}

#[test]
fn test_local_function_without_captures_is_a_plain_method() -> Result<(), LoweringError> {
    let module = lower(
        "
        fn Outer(): i64 {
            fn Two(): i64 { return 2; }
            return Two();
        }
    ",
    )?;

    assert!(module.data_type("Outer__Locals").is_none());
    assert!(module.data_type("Outer__Two__Closure").is_none());
    assert!(method(&module, "Outer__Two").parameters.is_empty());

    let outer = method(&module, "Outer");
    assert!(outer.locals.is_empty());
    assert_eq!(
        outer.basic_blocks[0].terminator,
        Terminator::MethodCall {
            function: FunctionReference {
                id: DefId::in_module(MODULE, "Outer").nested("Two"),
                type_arguments: vec![],
            },
            arguments: vec![],
            destination: local(RETURN_VALUE_LOCAL),
            goto_after: bb(1),
        }
    );
    Ok(())
}

#[test]
fn test_local_function_captures_this() -> Result<(), LoweringError> {
    let module = lower(
        "
        class Counter {
            pub field Count: i64,

            pub fn Doubled(): i64 {
                fn Twice(): i64 { return Count + Count; }
                return Twice();
            }
        }
    ",
    )?;
    let closure_type = synthesized("Counter__Doubled__Twice", "Closure");

    let closure = data_type(&module, "Counter__Doubled__Twice__Closure");
    assert_eq!(
        closure.variants[0].fields,
        vec![DataTypeField {
            name: "this".to_owned(),
            ty: user_type("Counter"),
        }]
    );

    let doubled = method(&module, "Counter__Doubled");
    assert_eq!(
        doubled.basic_blocks[0].statements,
        vec![
            assign(local("_local0"), Rvalue::CreateObject(closure_type)),
            assign_use(local("_local0").class_field("this"), copy(local("_param0"))),
        ]
    );

    let twice = method(&module, "Counter__Doubled__Twice");
    let count = local("_param0").class_field("this").class_field("Count");
    assert_eq!(
        twice.basic_blocks[0].statements,
        vec![assign(
            local(RETURN_VALUE_LOCAL),
            Rvalue::BinaryOperation {
                left: copy(count.clone()),
                right: copy(count),
                kind: BinaryOperationKind::Add,
            },
        )]
    );
    Ok(())
}

#[test]
fn test_function_value_is_called_through_its_object() -> Result<(), LoweringError> {
    let source = "
        fn Add(a: i64, b: i64): i64 { return a + b; }
        var f = Add;
        var c = f(1, 2);
    ";
    let module = lower(source)?;
    let main = main_method(&module);
    let i64_type = primitive("i64");
    let object_type = function_object(vec![i64_type.clone(), i64_type.clone(), i64_type.clone()]);

    assert_eq!(main.locals[0].ty, object_type);
    assert_eq!(
        main.basic_blocks,
        vec![
            block(
                0,
                vec![
                    assign(local("_local0"), Rvalue::CreateObject(object_type)),
                    assign_use(
                        local("_local0").class_field("FunctionReference"),
                        Operand::FunctionPointer(FunctionReference {
                            id: DefId::in_module(MODULE, "Add"),
                            type_arguments: vec![],
                        }),
                    ),
                ],
                Terminator::MethodCall {
                    function: FunctionReference {
                        id: DefId::core("Function`3").nested("Call"),
                        type_arguments: vec![i64_type.clone(), i64_type.clone(), i64_type],
                    },
                    arguments: vec![copy(local("_local0")), i64_const(1), i64_const(2)],
                    destination: local("_local1"),
                    goto_after: bb(1),
                },
            ),
            block(1, vec![], Terminator::Return),
        ]
    );

    let module = lower_with(
        source,
        LoweringOptions {
            emit_builtin_types: true,
        },
    )?;
    let object = data_type(&module, "Function`3");
    assert_eq!(
        object.type_parameters,
        vec!["TParam0".to_owned(), "TParam1".to_owned(), "TReturn".to_owned()]
    );
    let Some(Method::Extern(call)) = module.method("Function`3__Call") else {
        panic!("no extern call method in:\n{module}");
    };
    assert_eq!(call.parameters.len(), 3);
    Ok(())
}

#[test]
fn test_bound_method_stores_its_receiver() -> Result<(), LoweringError> {
    let module = lower(
        "
        class Counter {
            pub field Count: i64,

            pub fn Get(): i64 { return Count; }
        }
        var c = new Counter { Count = 1 };
        var g = c.Get;
    ",
    )?;
    let main = main_method(&module);
    let g = named(main, "g");

    assert_eq!(main.local("_local1").map(|l| &l.ty), Some(&function_object(vec![primitive("i64")])));
    assert_eq!(
        main.basic_blocks[0].statements[2..],
        [
            assign(g.clone(), Rvalue::CreateObject(function_object(vec![primitive("i64")]))),
            assign_use(
                g.clone().class_field("FunctionReference"),
                Operand::FunctionPointer(FunctionReference {
                    id: DefId::in_module(MODULE, "Counter").nested("Get"),
                    type_arguments: vec![],
                }),
            ),
            assign_use(g.class_field("FunctionParameter"), copy(local("_local0"))),
        ]
    );
    Ok(())
}
