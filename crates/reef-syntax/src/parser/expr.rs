use miette::SourceSpan;

use super::{ident, ListItem, Parser, ScopeKinds};
use crate::ast::*;
use crate::error::ParserErrorKind;
use crate::join_spans;
use crate::lexer::{Token, TokenKind};

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Plus,
        TokenKind::Dash => BinaryOp::Minus,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::ForwardSlash => BinaryOp::Divide,
        TokenKind::LeftAngleBracket => BinaryOp::LessThan,
        TokenKind::RightAngleBracket => BinaryOp::GreaterThan,
        TokenKind::DoubleEquals => BinaryOp::EqualityCheck,
        TokenKind::NotEquals => BinaryOp::NegativeEqualityCheck,
        TokenKind::DoubleAmpersand => BinaryOp::BooleanAnd,
        TokenKind::DoubleBar => BinaryOp::BooleanOr,
        TokenKind::Equals => BinaryOp::ValueAssignment,
        _ => return None,
    };
    Some(op)
}

/// How tightly a token binds to the expression before it.
fn binding_strength(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::DoubleColon => Some(12),
        TokenKind::Dot => Some(11),
        TokenKind::QuestionMark => Some(UnaryOp::FallOut.binding_strength()),
        TokenKind::Bang => Some(UnaryOp::Not.binding_strength()),
        TokenKind::LeftParenthesis => Some(8),
        TokenKind::Matches => Some(3),
        other => binary_op(other).map(BinaryOp::binding_strength),
    }
}

fn unescape(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl<'a> Parser<'a> {
    /// Parses one expression, continuing while the following operator binds
    /// tighter than `binding`.
    ///
    /// Returns the expression (if any) and whether any token was consumed.
    pub(super) fn pop_expression(&mut self, binding: Option<u8>) -> (Option<Expr>, bool) {
        let mut previous: Option<Expr> = None;
        let mut consumed = false;

        while self.has_next() && !self.at(TokenKind::Semicolon) {
            let (expression, consumed_token) = self.match_token_to_expression(previous.take());
            previous = expression;
            if !consumed_token {
                break;
            }
            consumed = true;

            let keep_binding = match self.current_kind() {
                // a prefix operator always starts a new expression
                Some(TokenKind::Bang) | None => false,
                Some(kind) => match binding_strength(kind) {
                    Some(strength) => binding.map_or(true, |current| strength > current),
                    None => false,
                },
            };
            if !keep_binding {
                break;
            }
        }

        (previous, consumed)
    }

    /// Moves past the current token and parses an expression, reporting
    /// `missing` at the first token if none could be parsed.
    pub(super) fn expect_next_expression(&mut self, binding: Option<u8>, missing: ParserErrorKind) -> Option<Expr> {
        self.move_next();
        let before = self.current();
        let (expression, _) = self.pop_expression(binding);
        if expression.is_none() {
            self.error_at(missing, before);
        }
        expression
    }

    fn match_token_to_expression(&mut self, previous: Option<Expr>) -> (Option<Expr>, bool) {
        let Some(token) = self.current() else {
            return (previous, false);
        };

        if let Some(op) = binary_op(token.kind) {
            return (self.get_binary_operator(token, op, previous), true);
        }

        let expression = match token.kind {
            TokenKind::StringLiteral | TokenKind::IntLiteral | TokenKind::True | TokenKind::False => {
                self.get_literal(token)
            }
            TokenKind::Var => self.get_variable_declaration(token),
            TokenKind::Identifier | TokenKind::Todo => self.get_variable_access(token),
            TokenKind::Bang => self.get_prefix_unary(token),
            TokenKind::QuestionMark => self.get_postfix_unary(token, previous),
            TokenKind::LeftBrace => self.get_block(token),
            TokenKind::LeftParenthesis => match previous {
                Some(callee) => self.get_method_call(callee),
                None => self.get_tuple_or_parenthesized(token),
            },
            TokenKind::If => self.get_if_expression(token),
            TokenKind::While => self.get_while_expression(token),
            TokenKind::Break => self.get_keyword_expression(token, ExprKind::Break),
            TokenKind::Continue => self.get_keyword_expression(token, ExprKind::Continue),
            TokenKind::Return => self.get_return(token),
            TokenKind::Dot => self.get_member_access(token, previous),
            TokenKind::DoubleColon => self.get_static_member_access(token, previous),
            TokenKind::New => self.get_object_initializer(token),
            TokenKind::Matches => self.get_matches(token, previous),
            TokenKind::Match => self.get_match(token),
            _ => return (previous, false),
        };

        (expression, true)
    }

    //--------------------------------------------------------------------------
    // Atoms
    //--------------------------------------------------------------------------

    fn get_literal(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let literal = match token.kind {
            TokenKind::IntLiteral => match token.lexeme.parse::<u64>() {
                Ok(value) => Literal::Int(value),
                Err(_) => {
                    self.error_at(ParserErrorKind::IntLiteralOutOfRange, Some(token));
                    Literal::Int(0)
                }
            },
            TokenKind::StringLiteral => Literal::String(unescape(token.lexeme)),
            TokenKind::True => Literal::Bool(true),
            _ => Literal::Bool(false),
        };
        self.move_next();
        Some(self.new_expr(ExprKind::Literal(literal), token.span))
    }

    fn get_variable_access(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        self.move_next();
        if token.kind == TokenKind::Todo {
            return Some(self.new_expr(ExprKind::Todo, token.span));
        }

        let mut span = token.span;
        let type_arguments = if self.at(TokenKind::Turbofish) {
            let (arguments, end) = self.get_type_arguments();
            if let Some(end) = end {
                span = join_spans(span, end);
            }
            Some(arguments)
        } else {
            None
        };

        Some(self.new_expr(
            ExprKind::Variable {
                name: ident(token),
                type_arguments,
            },
            span,
        ))
    }

    fn get_keyword_expression(&mut self, token: &'a Token<'a>, kind: ExprKind) -> Option<Expr> {
        self.move_next();
        Some(self.new_expr(kind, token.span))
    }

    fn get_variable_declaration(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        if !self.move_next() {
            self.error_span(
                ParserErrorKind::ExpectedToken {
                    expected: vec![TokenKind::Mut, TokenKind::Identifier],
                },
                None,
            );
            return None;
        }

        let mutable = self.at(TokenKind::Mut);
        if mutable && !self.move_next() {
            self.error_span(ParserErrorKind::ExpectedToken { expected: vec![TokenKind::Identifier] }, None);
            return None;
        }

        let name = match self.current() {
            Some(name) if name.kind == TokenKind::Identifier => ident(name),
            other => {
                let expected = if mutable {
                    vec![TokenKind::Identifier]
                } else {
                    vec![TokenKind::Mut, TokenKind::Identifier]
                };
                self.error_at(ParserErrorKind::ExpectedToken { expected }, other);
                return None;
            }
        };

        let mut end = name.span;
        let mut ty = None;
        let mut value = None;

        if self.move_next() {
            if self.at(TokenKind::Colon) {
                ty = self.expect_next_type_identifier();
                if let Some(ty) = &ty {
                    end = ty.span();
                }
            }

            if let Some(equals) = self.current().filter(|t| t.kind == TokenKind::Equals) {
                end = equals.span;
                value = self.expect_next_expression(None, ParserErrorKind::VariableDeclarationMissingValue);
                if let Some(value) = &value {
                    end = value.span;
                }
            }
        }

        Some(self.new_expr(
            ExprKind::VariableDeclaration {
                name,
                mutable,
                ty,
                value: value.map(Box::new),
            },
            join_spans(token.span, end),
        ))
    }

    fn get_block(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let scope = self.get_scope(Some(TokenKind::RightBrace), ScopeKinds::BLOCK);
        let block = Block {
            expressions: scope.expressions,
            functions: scope.functions,
            has_tail: scope.has_tail,
        };
        Some(self.new_expr(ExprKind::Block(block), scope.span.unwrap_or(token.span)))
    }

    fn get_tuple_or_parenthesized(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Expression, Self::get_list_expression);
        let span = join_spans(token.span, list.last.unwrap_or(token.span));
        let mut items = list.items;
        if items.len() == 1 && !list.trailing_comma {
            return items.pop();
        }
        Some(self.new_expr(ExprKind::Tuple(items), span))
    }

    fn get_list_expression(&mut self) -> Option<Expr> {
        let (expression, consumed) = self.pop_expression(None);
        if expression.is_none() && !consumed {
            self.error_at_current(ParserErrorKind::ExpectedExpression);
            self.move_next();
        }
        expression
    }

    //--------------------------------------------------------------------------
    // Operators
    //--------------------------------------------------------------------------

    fn get_binary_operator(&mut self, token: &'a Token<'a>, op: BinaryOp, left: Option<Expr>) -> Option<Expr> {
        if left.is_none() {
            self.error_at(ParserErrorKind::BinaryOperatorMissingLeftValue, Some(token));
        }

        let right = self.expect_next_expression(
            Some(op.binding_strength()),
            ParserErrorKind::BinaryOperatorMissingRightValue,
        );

        let start = left.as_ref().map_or(token.span, |l| l.span);
        let end = right.as_ref().map_or(token.span, |r| r.span);
        Some(self.new_expr(
            ExprKind::Binary {
                op,
                op_span: token.span,
                left: left.map(Box::new),
                right: right.map(Box::new),
            },
            join_spans(start, end),
        ))
    }

    fn get_prefix_unary(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let operand = self.expect_next_expression(
            Some(UnaryOp::Not.binding_strength()),
            ParserErrorKind::ExpectedExpression,
        );
        let end = operand.as_ref().map_or(token.span, |o| o.span);
        Some(self.new_expr(
            ExprKind::Unary {
                op: UnaryOp::Not,
                op_span: token.span,
                operand: operand.map(Box::new),
            },
            join_spans(token.span, end),
        ))
    }

    fn get_postfix_unary(&mut self, token: &'a Token<'a>, operand: Option<Expr>) -> Option<Expr> {
        if operand.is_none() {
            self.error_at(ParserErrorKind::ExpectedExpression, Some(token));
        }
        self.move_next();
        let start = operand.as_ref().map_or(token.span, |o| o.span);
        Some(self.new_expr(
            ExprKind::Unary {
                op: UnaryOp::FallOut,
                op_span: token.span,
                operand: operand.map(Box::new),
            },
            join_spans(start, token.span),
        ))
    }

    //--------------------------------------------------------------------------
    // Calls and member access
    //--------------------------------------------------------------------------

    fn get_method_call(&mut self, callee: Expr) -> Option<Expr> {
        let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Expression, Self::get_list_expression);
        let span = join_spans(callee.span, list.last.unwrap_or(callee.span));
        Some(self.new_expr(
            ExprKind::MethodCall {
                callee: Box::new(callee),
                arguments: list.items,
            },
            span,
        ))
    }

    /// Parses `name[::<T>]` after a `.` or `::`. Returns the member, any
    /// explicit type arguments and the span of the last token used.
    fn get_member_name(&mut self, token: &'a Token<'a>) -> (Option<Ident>, Option<Vec<TypeIdentifier>>, SourceSpan) {
        let Some(member) = self.expect_next_identifier() else {
            return (None, None, token.span);
        };
        let mut end = member.span;
        self.move_next();

        let type_arguments = if self.at(TokenKind::Turbofish) {
            let (arguments, last) = self.get_type_arguments();
            if let Some(last) = last {
                end = last;
            }
            Some(arguments)
        } else {
            None
        };

        (Some(member), type_arguments, end)
    }

    fn get_member_access(&mut self, token: &'a Token<'a>, owner: Option<Expr>) -> Option<Expr> {
        let Some(owner) = owner else {
            self.error_at(ParserErrorKind::ExpectedExpression, Some(token));
            self.move_next();
            return None;
        };

        let (member, type_arguments, end) = self.get_member_name(token);
        let span = join_spans(owner.span, end);
        Some(self.new_expr(
            ExprKind::MemberAccess {
                owner: Box::new(owner),
                member,
                type_arguments,
            },
            span,
        ))
    }

    fn get_static_member_access(&mut self, token: &'a Token<'a>, previous: Option<Expr>) -> Option<Expr> {
        let ty = match previous {
            Some(Expr {
                kind: ExprKind::Variable { name, type_arguments },
                span,
                ..
            }) => TypeIdentifier::Named {
                name,
                type_arguments: type_arguments.unwrap_or_default(),
                span,
            },
            other => {
                let span = other.map_or(token.span, |e| e.span);
                self.error_span(ParserErrorKind::ExpectedTypeName, Some(span));
                self.move_next();
                return None;
            }
        };

        let (member, type_arguments, end) = self.get_member_name(token);
        let span = join_spans(ty.span(), end);
        Some(self.new_expr(
            ExprKind::StaticMemberAccess {
                ty,
                member,
                type_arguments,
            },
            span,
        ))
    }

    //--------------------------------------------------------------------------
    // Object creation
    //--------------------------------------------------------------------------

    fn get_object_initializer(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        if !self.move_next() {
            self.error_span(ParserErrorKind::ExpectedTypeName, None);
            return None;
        }
        let ty = self.get_named_type_identifier()?;

        match self.current_kind() {
            Some(TokenKind::LeftBrace) => {
                let (fields, end) = self.get_field_initializers();
                let span = join_spans(token.span, end.unwrap_or_else(|| ty.span()));
                Some(self.new_expr(ExprKind::ObjectInitializer { ty, fields }, span))
            }
            Some(TokenKind::DoubleColon) => {
                let variant = self.expect_next_identifier()?;
                self.expect_next(TokenKind::LeftBrace)?;
                let (fields, end) = self.get_field_initializers();
                let span = join_spans(token.span, end.unwrap_or(variant.span));
                Some(self.new_expr(ExprKind::UnionClassVariantInitializer { ty, variant, fields }, span))
            }
            _ => {
                self.error_at_current(ParserErrorKind::ExpectedToken {
                    expected: vec![TokenKind::LeftBrace, TokenKind::DoubleColon],
                });
                None
            }
        }
    }

    /// `{ a = 1, b = 2 }`. Expects the current token to be `{`.
    fn get_field_initializers(&mut self) -> (Vec<FieldInitializer>, Option<SourceSpan>) {
        let list = self.comma_separated(
            TokenKind::RightBrace,
            ListItem::Tokens(&[TokenKind::Identifier]),
            |parser| {
                let name = parser.expect_current_identifier(&[])?;
                if parser.expect_next(TokenKind::Equals).is_none() {
                    return Some(FieldInitializer { name, value: None });
                }
                let value = parser.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
                Some(FieldInitializer { name, value })
            },
        );
        (list.items, list.last)
    }

    //--------------------------------------------------------------------------
    // Control flow
    //--------------------------------------------------------------------------

    /// `( condition )`. Expects the current token to be the keyword before it.
    /// Leaves the cursor on the closing parenthesis.
    fn get_parenthesized_condition(&mut self) -> Option<(Expr, SourceSpan)> {
        self.expect_next(TokenKind::LeftParenthesis)?;
        let condition = self.expect_next_expression(None, ParserErrorKind::ExpectedExpression)?;
        let close = self.expect_current(TokenKind::RightParenthesis)?;
        Some((condition, close.span))
    }

    fn get_if_expression(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let (condition, close) = self.get_parenthesized_condition()?;
        let body = self.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
        let mut end = body.as_ref().map_or(close, |b| b.span);

        let mut else_ifs = Vec::new();
        let mut else_body = None;

        while let Some(else_token) = self.current().filter(|t| t.kind == TokenKind::Else) {
            end = else_token.span;
            if !self.move_next() {
                self.error_span(
                    ParserErrorKind::ExpectedTokenOrExpression {
                        expected: vec![TokenKind::If],
                    },
                    None,
                );
                break;
            }

            if self.at(TokenKind::If) {
                let Some((condition, close)) = self.get_parenthesized_condition() else {
                    break;
                };
                let body = self.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
                end = body.as_ref().map_or(close, |b| b.span);
                else_ifs.push(ElseIf {
                    condition: Box::new(condition),
                    body: body.map(Box::new),
                });
                continue;
            }

            let before = self.current();
            let (body, _) = self.pop_expression(None);
            match &body {
                Some(body) => end = body.span,
                None => self.error_at(
                    ParserErrorKind::ExpectedTokenOrExpression {
                        expected: vec![TokenKind::If],
                    },
                    before,
                ),
            }
            else_body = body.map(Box::new);
            break;
        }

        Some(self.new_expr(
            ExprKind::If(IfExpr {
                condition: Box::new(condition),
                body: body.map(Box::new),
                else_ifs,
                else_body,
            }),
            join_spans(token.span, end),
        ))
    }

    fn get_while_expression(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let (condition, close) = self.get_parenthesized_condition()?;
        let body = self.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
        let end = body.as_ref().map_or(close, |b| b.span);
        Some(self.new_expr(
            ExprKind::While {
                condition: Box::new(condition),
                body: body.map(Box::new),
            },
            join_spans(token.span, end),
        ))
    }

    fn get_return(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        self.move_next();
        let (value, _) = self.pop_expression(None);
        let end = value.as_ref().map_or(token.span, |v| v.span);
        Some(self.new_expr(ExprKind::Return(value.map(Box::new)), join_spans(token.span, end)))
    }

    //--------------------------------------------------------------------------
    // Pattern matching
    //--------------------------------------------------------------------------

    fn get_matches(&mut self, token: &'a Token<'a>, value: Option<Expr>) -> Option<Expr> {
        let Some(value) = value else {
            self.error_at(ParserErrorKind::ExpectedExpression, Some(token));
            self.move_next();
            return None;
        };

        let pattern = if self.move_next() {
            self.get_pattern()
        } else {
            self.error_span(ParserErrorKind::ExpectedPattern, None);
            None
        };

        let end = pattern.as_ref().map_or(token.span, |p| p.span);
        let span = join_spans(value.span, end);
        Some(self.new_expr(
            ExprKind::Matches {
                value: Box::new(value),
                pattern,
            },
            span,
        ))
    }

    fn get_match(&mut self, token: &'a Token<'a>) -> Option<Expr> {
        let (value, close) = self.get_parenthesized_condition()?;

        if self.expect_next(TokenKind::LeftBrace).is_none() {
            return Some(self.new_expr(
                ExprKind::Match {
                    value: Box::new(value),
                    arms: Vec::new(),
                },
                join_spans(token.span, close),
            ));
        }

        let list = self.comma_separated(TokenKind::RightBrace, ListItem::Pattern, |parser| {
            let pattern = parser.get_pattern()?;
            if parser.expect_current(TokenKind::EqualsArrow).is_none() {
                return Some(MatchArm {
                    pattern,
                    expression: None,
                });
            }
            let expression = parser.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
            Some(MatchArm { pattern, expression })
        });

        let span = join_spans(token.span, list.last.unwrap_or(close));
        Some(self.new_expr(
            ExprKind::Match {
                value: Box::new(value),
                arms: list.items,
            },
            span,
        ))
    }
}
