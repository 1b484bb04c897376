use expect_test::expect;
use reef_syntax::ast::{ExprKind, UnionVariantKind};
use reef_syntax::{parse_source, ParserErrorKind};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const PROGRAM: &str = r#"
pub union MyUnion {
    A,
    B(string, i64),
    C { field MyField: string },

    pub fn Describe(): string {
        return "union";
    }
}

pub class MyClass<T> {
    pub mut field Value: T,
    static field Count: i64 = 0,

    pub fn Get(): T {
        return Value;
    }
}

fn Pick(a: MyUnion): i64 {
    return match (a) {
        MyUnion::A => 1,
        MyUnion::B(_, var b) => b,
        MyUnion::C { MyField } => 3,
    };
}

var mut x = new MyClass::<i64> { Value = 1 };
x.Value = Pick(MyUnion::B("b", 2));
if (x.Value > 1) {
    x.Value = 0;
} else {
    x.Value = 2;
}
"#;

#[test]
fn parses_a_complete_program() {
    init_logging();
    let result = parse_source("Main", PROGRAM);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);

    let program = result.program;
    assert_eq!(program.module_id, "Main");
    assert_eq!(program.unions.len(), 1);
    assert_eq!(program.classes.len(), 1);
    assert_eq!(program.functions.len(), 1);
    assert_eq!(program.expressions.len(), 3);

    let union = &program.unions[0];
    assert!(union.modifiers.is_public());
    assert!(matches!(union.variants[2].kind, UnionVariantKind::Class(ref fields) if fields.len() == 1));
    assert_eq!(union.functions[0].name.name, "Describe");

    assert!(matches!(program.expressions[2].kind, ExprKind::If(_)));
}

#[test]
fn reports_every_independent_error() {
    init_logging();
    let result = parse_source("Main", "var a = ; a +; { b");
    let rendered: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
    expect![[r#"
        [
            "Variable declaration is missing a value after '='",
            "Binary operator is missing its right operand",
            "Scope is missing its closing '}'",
        ]
    "#]]
    .assert_debug_eq(&rendered);
    assert_eq!(result.program.expressions.len(), 3);
}

#[test]
fn lex_errors_come_first() {
    init_logging();
    let result = parse_source("Main", "var a = 1 $ b");
    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ParserErrorKind::LexError,
            ParserErrorKind::ScopeEarlyTailReturnExpression,
        ]
    );
}

#[test]
fn empty_source_is_an_empty_program() {
    let result = parse_source("Main", "");
    assert!(result.errors.is_empty());
    assert!(result.program.expressions.is_empty());
    assert!(result.program.functions.is_empty());
}
