use reef_types::DefId;

use super::helpers::*;
use crate::ir::*;
use crate::lowering::{LoweringError, LoweringOptions};

fn field(name: &str, ty: TypeReference) -> DataTypeField {
    DataTypeField {
        name: name.to_owned(),
        ty,
    }
}

fn discriminant_field() -> DataTypeField {
    field(VARIANT_IDENTIFIER_FIELD, primitive("u16"))
}

#[test]
fn test_class_data_type_with_static_field() -> Result<(), LoweringError> {
    let module = lower(
        "
        class MyClass {
            pub field A: i64,
            pub mut field V: i64,
            pub static field B: i64 = 1
        }
    ",
    )?;
    let class = data_type(&module, "MyClass");

    assert_eq!(class.id, DefId::in_module(MODULE, "MyClass"));
    assert!(class.type_parameters.is_empty());
    assert_eq!(
        class.variants,
        vec![DataTypeVariant {
            name: CLASS_VARIANT.to_owned(),
            fields: vec![field("A", primitive("i64")), field("V", primitive("i64"))],
        }]
    );
    assert_eq!(
        class.static_fields,
        vec![StaticField {
            name: "B".to_owned(),
            ty: primitive("i64"),
            initializer: vec![block(
                0,
                vec![assign_use(local(RETURN_VALUE_LOCAL), i64_const(1))],
                Terminator::Return,
            )],
            locals: vec![],
            return_value: method_local(RETURN_VALUE_LOCAL, None, primitive("i64")),
        }]
    );
    // Static initializers live on the data type, not in the method list.
    assert!(module.methods.is_empty());
    Ok(())
}

#[test]
fn test_generic_class_keeps_its_type_parameters() -> Result<(), LoweringError> {
    let module = lower(
        "
        class Box<T> { pub field Value: T }
        var b = new Box::<i64> { Value = 1 };
    ",
    )?;
    let class = data_type(&module, "Box");
    let id = DefId::in_module(MODULE, "Box");

    assert_eq!(class.type_parameters, vec!["T".to_owned()]);
    assert_eq!(
        class.variants[0].fields,
        vec![field(
            "Value",
            TypeReference::Generic {
                owner: id.clone(),
                name: "T".to_owned(),
            }
        )]
    );

    let main = main_method(&module);
    let boxed = TypeReference::concrete("Box", id, vec![primitive("i64")]);
    assert_eq!(main.locals[0].ty, boxed);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign(local("_local0"), Rvalue::CreateObject(boxed)),
            assign_use(local("_local0").class_field("Value"), i64_const(1)),
        ]
    );
    Ok(())
}

#[test]
fn test_object_initializer_stores_fields_in_declaration_order() -> Result<(), LoweringError> {
    let module = lower(
        "
        class Point { pub field X: i64, pub field Y: i64 }
        var p = new Point { Y = 2, X = 1 };
        var x = p.X;
    ",
    )?;
    let main = main_method(&module);

    assert_eq!(
        main.basic_blocks,
        vec![block(
            0,
            vec![
                assign(local("_local0"), Rvalue::CreateObject(user_type("Point"))),
                assign_use(local("_local0").class_field("X"), i64_const(1)),
                assign_use(local("_local0").class_field("Y"), i64_const(2)),
                assign_use(local("_local1"), copy(local("_local0").class_field("X"))),
            ],
            Terminator::Return,
        )]
    );
    Ok(())
}

#[test]
fn test_static_field_access() -> Result<(), LoweringError> {
    let module = lower(
        "
        class MyClass { pub static field B: i64 = 1 }
        var b = MyClass::B;
    ",
    )?;
    let main = main_method(&module);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![assign_use(
            local("_local0"),
            copy(Place::StaticField {
                owner: user_type("MyClass"),
                field: "B".to_owned(),
            }),
        )]
    );
    Ok(())
}

#[test]
fn test_instance_function_reads_fields_through_this() -> Result<(), LoweringError> {
    let module = lower(
        "
        class Counter {
            pub mut field Count: i64,

            pub mut fn Increment() {
                Count = Count + 1;
            }
        }
        var mut c = new Counter { Count = 0 };
        c.Increment();
    ",
    )?;

    let increment = method(&module, "Counter__Increment");
    assert_eq!(
        increment.parameters,
        vec![method_local("_param0", Some("this"), user_type("Counter"))]
    );
    assert_eq!(
        increment.basic_blocks,
        vec![block(
            0,
            vec![assign(
                local("_param0").class_field("Count"),
                Rvalue::BinaryOperation {
                    left: copy(local("_param0").class_field("Count")),
                    right: i64_const(1),
                    kind: BinaryOperationKind::Add,
                },
            )],
            Terminator::Return,
        )]
    );

    let main = main_method(&module);
    let Terminator::MethodCall {
        function, arguments, ..
    } = &main.basic_blocks[0].terminator
    else {
        panic!("expected a call, found {}", main.basic_blocks[0].terminator);
    };
    assert_eq!(function.id, DefId::in_module(MODULE, "Counter").nested("Increment"));
    assert_eq!(arguments, &vec![copy(local("_local0"))]);
    Ok(())
}

#[test]
fn test_tuple_construction_and_member_access() -> Result<(), LoweringError> {
    let module = lower("var a = (1, true); var b = a.Item1;")?;
    let main = main_method(&module);
    let tuple = core_type("Tuple`2", vec![primitive("i32"), primitive("bool")]);

    assert_eq!(main.locals[0].ty, tuple);
    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign(local("_local0"), Rvalue::CreateObject(tuple)),
            assign_use(local("_local0").class_field("Item0"), i32_const(1)),
            assign_use(local("_local0").class_field("Item1"), bool_const(true)),
            assign_use(local("_local1"), copy(local("_local0").class_field("Item1"))),
        ]
    );
    Ok(())
}

#[test]
fn test_union_data_type_starts_every_variant_with_the_discriminant() -> Result<(), LoweringError> {
    let module = lower("union MyUnion { A, B(i64), C { field X: i64 } }")?;
    let union = data_type(&module, "MyUnion");

    assert_eq!(
        union.variants,
        vec![
            DataTypeVariant {
                name: "A".to_owned(),
                fields: vec![discriminant_field()],
            },
            DataTypeVariant {
                name: "B".to_owned(),
                fields: vec![discriminant_field(), field("Item0", primitive("i64"))],
            },
            DataTypeVariant {
                name: "C".to_owned(),
                fields: vec![discriminant_field(), field("X", primitive("i64"))],
            },
        ]
    );
    Ok(())
}

#[test]
fn test_tuple_variant_create_method() -> Result<(), LoweringError> {
    let module = lower("union MyUnion { A, B(i64), C { field X: i64 } }")?;

    // Only tuple variants get a constructor.
    let names: Vec<&str> = module.methods.iter().map(Method::name).collect();
    assert_eq!(names, vec!["MyUnion__Create__B"]);

    let create = method(&module, "MyUnion__Create__B");
    let result = local(RETURN_VALUE_LOCAL);
    assert_eq!(create.id, DefId::in_module(MODULE, "MyUnion").nested("Create__B"));
    assert_eq!(
        create.parameters,
        vec![method_local("_param0", Some("Item0"), primitive("i64"))]
    );
    assert_eq!(create.return_value.ty, user_type("MyUnion"));
    assert_eq!(
        create.basic_blocks,
        vec![block(
            0,
            vec![
                assign(result.clone(), Rvalue::CreateObject(user_type("MyUnion"))),
                assign_use(result.clone().field(VARIANT_IDENTIFIER_FIELD, "B"), tag(1)),
                assign_use(result.field("Item0", "B"), copy(local("_param0"))),
            ],
            Terminator::Return,
        )]
    );
    Ok(())
}

#[test]
fn test_class_variant_initializer() -> Result<(), LoweringError> {
    let module = lower(
        "
        union MyUnion { A, C { field X: i64, field Y: i64 } }
        var u = new MyUnion::C { Y = 2, X = 1 };
    ",
    )?;
    let main = main_method(&module);
    let u = local("_local0");

    assert_eq!(
        main.basic_blocks[0].statements,
        vec![
            assign(u.clone(), Rvalue::CreateObject(user_type("MyUnion"))),
            assign_use(u.clone().field(VARIANT_IDENTIFIER_FIELD, "C"), tag(1)),
            assign_use(u.clone().field("X", "C"), i64_const(1)),
            assign_use(u.field("Y", "C"), i64_const(2)),
        ]
    );
    Ok(())
}

#[test]
fn test_builtin_types_are_only_emitted_on_request() -> Result<(), LoweringError> {
    let source = "
        fn Parse(a: i64): result::<i64, string> { return ok(a); }
        var t = (1, true);
    ";

    let module = lower(source)?;
    assert!(module.data_type("result").is_none());
    assert!(module.data_type("Tuple`2").is_none());

    let module = lower_with(
        source,
        LoweringOptions {
            emit_builtin_types: true,
        },
    )?;

    let result = data_type(&module, "result");
    let value = TypeReference::Generic {
        owner: DefId::core("result"),
        name: "TValue".to_owned(),
    };
    assert_eq!(result.type_parameters, vec!["TValue".to_owned(), "TError".to_owned()]);
    assert_eq!(
        result.variant("Ok").map(|v| v.fields.clone()),
        Some(vec![discriminant_field(), field("Item0", value)])
    );
    assert!(module.lowered_method("result__Create__Ok").is_some());
    assert!(module.lowered_method("result__Create__Error").is_some());

    let tuple = data_type(&module, "Tuple`2");
    let tuple_id = DefId::core("Tuple`2");
    assert_eq!(tuple.type_parameters, vec!["T0".to_owned(), "T1".to_owned()]);
    assert_eq!(
        tuple.variants[0].fields,
        vec![
            field(
                "Item0",
                TypeReference::Generic {
                    owner: tuple_id.clone(),
                    name: "T0".to_owned(),
                }
            ),
            field(
                "Item1",
                TypeReference::Generic {
                    owner: tuple_id,
                    name: "T1".to_owned(),
                }
            ),
        ]
    );
    Ok(())
}
