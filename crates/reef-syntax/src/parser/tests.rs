use super::*;
use crate::error::ParserError;
use crate::lexer::tokenize;

fn parse_source(source: &str) -> ParseResult {
    let tokens = tokenize(source).expect("source should tokenize");
    Parser::new(&tokens, ParseOptions::default()).parse_program("Test")
}

fn parse_ok(source: &str) -> LangProgram {
    let result = parse_source(source);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.program
}

fn single_expression(source: &str) -> Expr {
    let mut program = parse_ok(source);
    assert_eq!(program.expressions.len(), 1, "expected exactly one expression");
    program.expressions.remove(0)
}

fn kinds(errors: &[ParserError]) -> Vec<ParserErrorKind> {
    errors.iter().map(|e| e.kind.clone()).collect()
}

fn offsets(errors: &[ParserError]) -> Vec<Option<usize>> {
    errors.iter().map(|e| e.span.map(|s| s.offset())).collect()
}

fn render_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::LessThan => "<",
        BinaryOp::GreaterThan => ">",
        BinaryOp::EqualityCheck => "==",
        BinaryOp::NegativeEqualityCheck => "!=",
        BinaryOp::BooleanAnd => "&&",
        BinaryOp::BooleanOr => "||",
        BinaryOp::ValueAssignment => "=",
    }
}

fn render_type(ty: &TypeIdentifier) -> String {
    match ty {
        TypeIdentifier::Named { name, .. } => name.name.clone(),
        _ => "<type>".to_string(),
    }
}

fn render(expr: &Expr) -> String {
    let opt = |e: &Option<Box<Expr>>| e.as_deref().map_or("<missing>".to_string(), render);
    match &expr.kind {
        ExprKind::Literal(Literal::Int(value)) => value.to_string(),
        ExprKind::Literal(Literal::Bool(value)) => value.to_string(),
        ExprKind::Literal(Literal::String(value)) => format!("{:?}", value),
        ExprKind::Variable { name, .. } => name.name.clone(),
        ExprKind::Binary { op, left, right, .. } => {
            format!("({} {} {})", opt(left), render_op(*op), opt(right))
        }
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
            ..
        } => format!("(!{})", opt(operand)),
        ExprKind::Unary {
            op: UnaryOp::FallOut,
            operand,
            ..
        } => format!("({}?)", opt(operand)),
        ExprKind::MemberAccess { owner, member, .. } => {
            format!("{}.{}", render(owner), member.as_ref().map_or("<missing>", |m| m.name.as_str()))
        }
        ExprKind::StaticMemberAccess { ty, member, .. } => {
            format!("{}::{}", render_type(ty), member.as_ref().map_or("<missing>", |m| m.name.as_str()))
        }
        ExprKind::MethodCall { callee, arguments } => {
            let arguments: Vec<_> = arguments.iter().map(render).collect();
            format!("{}({})", render(callee), arguments.join(", "))
        }
        ExprKind::Matches { value, pattern } => {
            let pattern = match pattern.as_ref().map(|p| &p.kind) {
                Some(PatternKind::Discard) => "_",
                Some(_) => "<pattern>",
                None => "<missing>",
            };
            format!("({} matches {})", render(value), pattern)
        }
        other => format!("{:?}", other),
    }
}

fn render_source(source: &str) -> String {
    render(&single_expression(source))
}

#[test]
fn test_binary_precedence() {
    assert_eq!(render_source("a + b * c"), "(a + (b * c))");
    assert_eq!(render_source("a * b + c"), "((a * b) + c)");
    assert_eq!(render_source("a < b == c"), "((a < b) == c)");
    assert_eq!(render_source("a = b + c"), "(a = (b + c))");
    assert_eq!(render_source("a == b && c != d || e"), "(((a == b) && (c != d)) || e)");
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(render_source("a - b - c"), "((a - b) - c)");
    assert_eq!(render_source("a = b = c"), "((a = b) = c)");
}

#[test]
fn test_unary_operators() {
    assert_eq!(render_source("!a?"), "(!(a?))");
    assert_eq!(render_source("!a + b"), "((!a) + b)");
    assert_eq!(render_source("a? + b"), "((a?) + b)");
}

#[test]
fn test_postfix_chains() {
    assert_eq!(render_source("a.b.c()"), "a.b.c()");
    assert_eq!(render_source("MyUnion::A(1, \"x\")"), "MyUnion::A(1, \"x\")");
    assert_eq!(render_source("f(a + b, c)"), "f((a + b), c)");
}

#[test]
fn test_matches_binds_looser_than_comparison() {
    assert_eq!(render_source("x matches _ && y"), "((x matches _) && y)");
    assert_eq!(render_source("a == b matches _"), "((a == b) matches _)");
}

#[test]
fn test_parenthesized_and_tuples() {
    assert_eq!(render_source("(a)"), "a");

    let tuple = single_expression("(a,)");
    assert!(matches!(&tuple.kind, ExprKind::Tuple(items) if items.len() == 1));

    let unit = single_expression("()");
    assert!(matches!(&unit.kind, ExprKind::Tuple(items) if items.is_empty()));

    let pair = single_expression("(a, b)");
    assert!(matches!(&pair.kind, ExprKind::Tuple(items) if items.len() == 2));
}

#[test]
fn test_early_tail_expression_is_reported_at_first_expression() {
    let result = parse_source("a b; c; d e");
    assert_eq!(result.program.expressions.len(), 5);
    assert_eq!(
        kinds(&result.errors),
        vec![
            ParserErrorKind::ScopeEarlyTailReturnExpression,
            ParserErrorKind::ScopeEarlyTailReturnExpression,
        ]
    );
    assert_eq!(offsets(&result.errors), vec![Some(0), Some(8)]);
}

#[test]
fn test_if_does_not_need_semicolon() {
    let program = parse_ok("if (a) { b; } c;");
    assert_eq!(program.expressions.len(), 2);
}

#[test]
fn test_block_tail() {
    let with_tail = single_expression("{ a; b }");
    assert!(matches!(&with_tail.kind, ExprKind::Block(block) if block.has_tail && block.expressions.len() == 2));

    let without_tail = single_expression("{ a; b; }");
    assert!(matches!(&without_tail.kind, ExprKind::Block(block) if !block.has_tail));
}

#[test]
fn test_missing_left_operand() {
    let result = parse_source("+ b;");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::BinaryOperatorMissingLeftValue]);
    assert_eq!(offsets(&result.errors), vec![Some(0)]);
    assert_eq!(render(&result.program.expressions[0]), "(<missing> + b)");
}

#[test]
fn test_missing_right_operand() {
    let result = parse_source("a +;");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::BinaryOperatorMissingRightValue]);
    assert_eq!(offsets(&result.errors), vec![Some(3)]);
    assert_eq!(result.program.expressions.len(), 1);
}

#[test]
fn test_variable_declaration() {
    let expr = single_expression("var mut a: i64 = 1;");
    match expr.kind {
        ExprKind::VariableDeclaration {
            name,
            mutable,
            ty,
            value,
        } => {
            assert_eq!(name.name, "a");
            assert!(mutable);
            assert_eq!(ty.as_ref().map(render_type).as_deref(), Some("i64"));
            assert!(matches!(value.as_deref().map(|v| &v.kind), Some(ExprKind::Literal(Literal::Int(1)))));
        }
        other => panic!("expected variable declaration, found {:?}", other),
    }

    let result = parse_source("var a = ;");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::VariableDeclarationMissingValue]);
    assert_eq!(offsets(&result.errors), vec![Some(8)]);
}

#[test]
fn test_modifier_errors_on_type_definitions() {
    let result = parse_source("mut static class A {}");
    assert_eq!(
        kinds(&result.errors),
        vec![
            ParserErrorKind::UnexpectedModifier {
                declaration: DeclarationKind::Class,
                modifier: TokenKind::Static,
            },
            ParserErrorKind::UnexpectedModifier {
                declaration: DeclarationKind::Class,
                modifier: TokenKind::Mut,
            },
        ]
    );
    assert_eq!(result.program.classes.len(), 1);

    let result = parse_source("union A { pub B }");
    assert_eq!(
        kinds(&result.errors),
        vec![ParserErrorKind::UnexpectedModifier {
            declaration: DeclarationKind::UnionVariant,
            modifier: TokenKind::Pub,
        }]
    );
    assert_eq!(offsets(&result.errors), vec![Some(10)]);
}

#[test]
fn test_duplicate_modifier() {
    let result = parse_source("pub pub fn a() {}");
    assert_eq!(
        kinds(&result.errors),
        vec![ParserErrorKind::ScopeDuplicateModifier { modifier: TokenKind::Pub }]
    );
    assert_eq!(offsets(&result.errors), vec![Some(4)]);
    assert_eq!(result.program.functions.len(), 1);
    assert!(result.program.functions[0].modifiers.is_public());
}

#[test]
fn test_comma_list_errors() {
    let result = parse_source("a(,b)");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::ScopeUnexpectedComma]);
    assert_eq!(offsets(&result.errors), vec![Some(2)]);

    let result = parse_source("a(b c)");
    assert_eq!(
        kinds(&result.errors),
        vec![ParserErrorKind::ExpectedToken {
            expected: vec![TokenKind::Comma, TokenKind::RightParenthesis],
        }]
    );
    assert_eq!(offsets(&result.errors), vec![Some(4)]);

    assert_eq!(render_source("a(b,)"), "a(b)");

    let result = parse_source("a::<>");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::EmptyTypeArgumentList]);
}

#[test]
fn test_type_argument_list_errors() {
    let result = parse_source("a::<,>");
    assert_eq!(kinds(&result.errors), vec![ParserErrorKind::ScopeUnexpectedComma]);
    assert_eq!(offsets(&result.errors), vec![Some(4)]);

    let result = parse_source("a::<A B>");
    assert_eq!(
        kinds(&result.errors),
        vec![ParserErrorKind::ExpectedToken {
            expected: vec![TokenKind::Comma, TokenKind::RightAngleBracket],
        }]
    );
    assert_eq!(offsets(&result.errors), vec![Some(6)]);

    let expr = single_expression("a::<A,>");
    let ExprKind::Variable { type_arguments, .. } = &expr.kind else {
        panic!("expected a variable, got {:?}", expr.kind);
    };
    let rendered: Vec<String> = type_arguments.iter().flatten().map(render_type).collect();
    assert_eq!(rendered, ["A"]);
}

#[test]
fn test_type_definition_inside_class_is_skipped() {
    let result = parse_source("class A { class B {} }");
    assert!(matches!(
        kinds(&result.errors).as_slice(),
        [ParserErrorKind::ScopeMissingMember { .. }]
    ));
    assert_eq!(offsets(&result.errors), vec![Some(10)]);
    assert_eq!(result.program.classes.len(), 1);

    let result = parse_source("class A { union B<T> { X(T), Y { field Z: T } } field Y: i64 }");
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert_eq!(offsets(&result.errors), vec![Some(10)]);
    assert_eq!(result.program.classes[0].fields.len(), 1);
    assert_eq!(result.program.classes[0].fields[0].name.name, "Y");
}

#[test]
fn test_type_definition_inside_function_is_skipped() {
    let result = parse_source("fn f() { class A {} }");
    assert!(matches!(
        kinds(&result.errors).as_slice(),
        [ParserErrorKind::ScopeMissingMember { .. }]
    ));
    assert_eq!(offsets(&result.errors), vec![Some(9)]);
    assert_eq!(result.program.functions.len(), 1);

    let result = parse_source("fn f() { class A { fn g() {} } var x = 1; }");
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert_eq!(result.program.functions[0].body.expressions.len(), 1);
}

#[test]
fn test_missing_closing_brace() {
    let result = parse_source("{ a");
    assert_eq!(
        kinds(&result.errors),
        vec![ParserErrorKind::ScopeMissingClosingTag {
            expected: TokenKind::RightBrace,
        }]
    );
    assert_eq!(offsets(&result.errors), vec![None]);
}

#[test]
fn test_unexpected_token_in_scope() {
    let result = parse_source(") a;");
    assert!(matches!(
        kinds(&result.errors).as_slice(),
        [ParserErrorKind::ScopeMissingMember { .. }]
    ));
    assert_eq!(result.program.expressions.len(), 1);
}

#[test]
fn test_function_declaration() {
    let program = parse_ok("pub fn add<T>(mut a: i64, b: T): i64 { return a; }");
    let function = &program.functions[0];
    assert_eq!(function.name.name, "add");
    assert!(function.modifiers.is_public());
    assert_eq!(function.type_parameters.len(), 1);
    assert_eq!(function.parameters.len(), 2);
    assert!(function.parameters[0].mutable);
    assert!(!function.parameters[1].mutable);
    assert_eq!(function.return_type.as_ref().map(render_type).as_deref(), Some("i64"));
    assert_eq!(function.body.expressions.len(), 1);
    assert!(!function.body.has_tail);
}

#[test]
fn test_union_definition() {
    let program = parse_ok("union U { A, B(string, i64), C { field a: string }, fn f() {} }");
    let union = &program.unions[0];
    assert_eq!(union.variants.len(), 3);
    assert!(matches!(union.variants[0].kind, UnionVariantKind::Unit));
    assert!(matches!(&union.variants[1].kind, UnionVariantKind::Tuple(members) if members.len() == 2));
    assert!(matches!(&union.variants[2].kind, UnionVariantKind::Class(fields) if fields.len() == 1));
    assert_eq!(union.functions.len(), 1);
}

#[test]
fn test_class_definition() {
    let program = parse_ok(
        "class C<T> { pub mut field a: i64, static field b: string = \"x\", fn get(): i64 { return 1; } }",
    );
    let class = &program.classes[0];
    assert_eq!(class.type_parameters.len(), 1);
    assert_eq!(class.fields.len(), 2);
    assert!(class.fields[0].modifiers.is_public());
    assert!(class.fields[0].modifiers.is_mutable());
    assert!(class.fields[1].modifiers.is_static());
    assert!(class.fields[1].initializer.is_some());
    assert_eq!(class.functions.len(), 1);
}

#[test]
fn test_patterns() {
    let expr = single_expression("a matches MyUnion::B(var x, _) var y");
    let ExprKind::Matches { pattern: Some(pattern), .. } = expr.kind else {
        panic!("expected matches expression");
    };
    match pattern.kind {
        PatternKind::UnionTupleVariant {
            variant,
            members,
            binding,
            ..
        } => {
            assert_eq!(variant.name, "B");
            assert!(matches!(members[0].kind, PatternKind::Variable(_)));
            assert!(matches!(members[1].kind, PatternKind::Discard));
            assert_eq!(binding.map(|b| b.name.name).as_deref(), Some("y"));
        }
        other => panic!("unexpected pattern {:?}", other),
    }

    let expr = single_expression("a matches MyClass { field1, field2: var b, _ }");
    let ExprKind::Matches { pattern: Some(pattern), .. } = expr.kind else {
        panic!("expected matches expression");
    };
    match pattern.kind {
        PatternKind::Class {
            fields,
            discard_remaining,
            binding,
            ..
        } => {
            assert_eq!(fields.len(), 2);
            assert!(fields[0].pattern.is_none());
            assert!(fields[1].pattern.is_some());
            assert!(discard_remaining);
            assert!(binding.is_none());
        }
        other => panic!("unexpected pattern {:?}", other),
    }
}

#[test]
fn test_match_expression() {
    let expr = single_expression("match (a) { MyUnion::A => 1, MyUnion::B(var x) => x, _ => 3 }");
    let ExprKind::Match { arms, .. } = expr.kind else {
        panic!("expected match expression");
    };
    assert_eq!(arms.len(), 3);
    assert!(arms.iter().all(|arm| arm.expression.is_some()));
}

#[test]
fn test_if_else_chain() {
    let expr = single_expression("if (a) b else if (c) d else if (e) f else g");
    let ExprKind::If(if_expr) = expr.kind else {
        panic!("expected if expression");
    };
    assert_eq!(if_expr.else_ifs.len(), 2);
    assert!(if_expr.else_body.is_some());
}

#[test]
fn test_object_initializers() {
    let expr = single_expression("new MyClass { a = 1, b = \"x\" }");
    assert!(matches!(&expr.kind, ExprKind::ObjectInitializer { fields, .. } if fields.len() == 2));

    let expr = single_expression("new MyUnion::C { a = 1 }");
    assert!(matches!(
        &expr.kind,
        ExprKind::UnionClassVariantInitializer { variant, fields, .. }
            if variant.name == "C" && fields.len() == 1
    ));
}

#[test]
fn test_generic_type_arguments() {
    let expr = single_expression("var a: result::<i64, string> = ok(1);");
    let ExprKind::VariableDeclaration { ty: Some(TypeIdentifier::Named { type_arguments, .. }), .. } = expr.kind else {
        panic!("expected declaration with a generic type");
    };
    assert_eq!(type_arguments.len(), 2);

    let expr = single_expression("var f: Fn(mut i64, string): bool = todo!;");
    let ExprKind::VariableDeclaration { ty: Some(TypeIdentifier::Function { parameters, return_type, .. }), .. } = expr.kind else {
        panic!("expected declaration with a function type");
    };
    assert_eq!(parameters.len(), 2);
    assert!(parameters[0].mutable);
    assert!(return_type.is_some());
}

#[test]
fn test_max_errors() {
    let tokens = tokenize("a b c d e").expect("source should tokenize");
    let options = ParseOptions { max_errors: Some(2) };
    let result = Parser::new(&tokens, options).parse_program("Test");
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.program.expressions.len(), 5);
}
