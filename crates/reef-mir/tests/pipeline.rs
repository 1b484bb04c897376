//! Runs whole programs through parsing, checking and lowering, and checks
//! the structural guarantees every lowered method gives.

use reef_mir::{lower_program_with_options, BasicBlockId, LoweredMethod, LoweredModule, LoweringOptions, Method};
use reef_syntax::parse_source;
use reef_types::type_check;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const PROGRAM: &str = r#"
pub union Shape {
    Circle { field Radius: i64 },
    Square(i64),
    Empty,

    pub fn Describe(): string {
        return "shape";
    }
}

pub class Counter {
    pub mut field Count: i64,
    pub static field Start: i64 = 0,

    pub mut fn Add(amount: i64) {
        Count = Count + amount;
    }

    pub fn Scaled(factor: i64): i64 {
        fn Apply(): i64 {
            return Count * factor;
        }
        return Apply();
    }
}

fn Area(shape: Shape): i64 {
    return match (shape) {
        Shape::Circle { Radius: var r } => r * r * 3,
        Shape::Square(var side) => side * side,
        _ => 0
    };
}

fn Parse(a: i64): result::<i64, string> {
    if (a > 0) {
        return ok(a);
    }
    return error("negative");
}

fn SumAreas(limit: i64): result::<i64, string> {
    var checked = Parse(limit)?;
    var mut total = 0;
    var mut i = 0;
    while (i < checked) {
        total = total + Area(Shape::Square(i));
        if (total > 100 || i == 7) {
            break;
        }
        i = i + 1;
    }
    return ok(total);
}

var mut counter = new Counter { Count = Counter::Start };
counter.Add(2);
var pair = (counter.Count, Area(Shape::Empty) == 0);
var found = Shape::Square(3) matches Shape::Square(var s) && s > 1;
"#;

fn lower(options: LoweringOptions) -> LoweredModule {
    init_logging();
    let parsed = parse_source("Main", PROGRAM);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    let checked = type_check(&parsed.program);
    assert!(checked.errors.is_empty(), "unexpected type errors: {:#?}", checked.errors);
    match lower_program_with_options(&checked.program, options) {
        Ok(module) => module,
        Err(error) => panic!("lowering failed: {error}"),
    }
}

/// Every block is numbered by its position and every jump lands on a block
/// of the same method.
fn assert_well_formed(method: &LoweredMethod) {
    assert!(!method.basic_blocks.is_empty(), "{} has no blocks", method.name);
    for (index, block) in method.basic_blocks.iter().enumerate() {
        assert_eq!(block.id, BasicBlockId(index as u32), "{} numbers its blocks out of order", method.name);
        for target in block.terminator.successors() {
            assert!(
                method.block(target.0).is_some(),
                "{}: {} jumps to missing block {target}",
                method.name,
                block.id
            );
        }
    }
}

/// Every local a statement writes to is declared.
fn assert_locals_declared(method: &LoweredMethod) {
    for block in &method.basic_blocks {
        for reef_mir::Statement::Assign(place, _) in &block.statements {
            if let Some(root) = place.root_local() {
                assert!(
                    method.local(root).is_some(),
                    "{}: {} writes undeclared local {root}",
                    method.name,
                    block.id
                );
            }
        }
    }
}

#[test]
fn lowered_methods_are_well_formed() {
    let module = lower(LoweringOptions::default());
    let lowered: Vec<&LoweredMethod> = module.methods.iter().filter_map(Method::as_lowered).collect();
    assert!(lowered.len() >= 8, "too few methods:\n{module}");
    for method in lowered {
        assert_well_formed(method);
        assert_locals_declared(method);
    }
}

#[test]
fn module_lists_every_declaration() {
    let module = lower(LoweringOptions::default());

    let data_types: Vec<&str> = module.data_types.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        data_types,
        vec!["Shape", "Counter", "Counter__Scaled__Locals", "Counter__Scaled__Apply__Closure"]
    );

    let methods: Vec<&str> = module.methods.iter().map(Method::name).collect();
    assert_eq!(
        methods,
        vec![
            "Shape__Describe",
            "Shape__Create__Square",
            "Counter__Add",
            "Counter__Scaled__Apply",
            "Counter__Scaled",
            "_Main",
            "Area",
            "Parse",
            "SumAreas",
        ]
    );
}

#[test]
fn builtin_types_complete_the_module() {
    let module = lower(LoweringOptions {
        emit_builtin_types: true,
    });
    for name in ["result", "Tuple`2"] {
        assert!(module.data_type(name).is_some(), "missing built-in type {name}");
    }
    for name in ["result__Create__Ok", "result__Create__Error"] {
        let method = module
            .lowered_method(name)
            .unwrap_or_else(|| panic!("missing built-in method {name}"));
        assert_well_formed(method);
    }
}

#[test]
fn lowering_twice_gives_the_same_module() {
    let first = lower(LoweringOptions::default());
    let second = lower(LoweringOptions::default());
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
