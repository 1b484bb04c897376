//! Recursive-descent parser with precedence climbing for expressions.
//!
//! The parser never fails: every syntax problem is recorded as a
//! [`ParserError`] and parsing resumes at the next token that can start a
//! statement or member, so a single pass reports every independent mistake.

mod expr;
mod pattern;
mod types;

use miette::SourceSpan;

use crate::ast::*;
use crate::error::{DeclarationKind, ParserError, ParserErrorKind};
use crate::join_spans;
use crate::lexer::{Token, TokenKind};

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Stop recording errors once this many have been collected.
    pub max_errors: Option<usize>,
}

/// The result of parsing a token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub program: LangProgram,
    pub errors: Vec<ParserError>,
}

/// What the items of a comma separated list are, used for error reporting.
#[derive(Debug, Clone, Copy)]
enum ListItem<'k> {
    Tokens(&'k [TokenKind]),
    Expression,
    Type,
    Pattern,
}

/// A parsed comma separated list.
struct CommaList<T> {
    items: Vec<T>,
    /// Span of the terminator. `None` when the list was never closed.
    last: Option<SourceSpan>,
    /// A leading or doubled comma was reported
    stray_comma: bool,
    /// The last item was followed by a comma before the terminator
    trailing_comma: bool,
}

/// Which members a `{ ... }` or top level scope may contain.
#[derive(Debug, Clone, Copy)]
struct ScopeKinds {
    type_definitions: bool,
    expressions: bool,
    functions: bool,
}

impl ScopeKinds {
    const PROGRAM: ScopeKinds = ScopeKinds {
        type_definitions: true,
        expressions: true,
        functions: true,
    };

    const BLOCK: ScopeKinds = ScopeKinds {
        type_definitions: false,
        expressions: true,
        functions: true,
    };

    fn expected_tokens(self, closing: Option<TokenKind>) -> Vec<TokenKind> {
        let mut expected = Vec::new();
        if self.functions {
            expected.extend([TokenKind::Fn, TokenKind::Pub, TokenKind::Static]);
        }
        if self.type_definitions {
            expected.extend([TokenKind::Class, TokenKind::Union]);
        }
        expected.extend(closing);
        expected.dedup();
        expected
    }
}

#[derive(Default)]
struct Scope {
    expressions: Vec<Expr>,
    functions: Vec<LangFunction>,
    classes: Vec<ProgramClass>,
    unions: Vec<ProgramUnion>,
    has_tail: bool,
    span: Option<SourceSpan>,
}

/// Which members a class or union body may contain.
#[derive(Debug, Clone, Copy)]
struct MemberKinds {
    functions: bool,
    fields: bool,
    variants: bool,
}

#[derive(Default)]
struct MemberList {
    functions: Vec<LangFunction>,
    fields: Vec<ClassField>,
    variants: Vec<UnionVariant>,
    span: Option<SourceSpan>,
}

enum Member {
    Function(LangFunction),
    Field(ClassField),
    Variant(UnionVariant),
}

#[derive(PartialEq, Eq)]
enum CommaState {
    Forbidden,
    Allowed,
    Required,
}

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    errors: Vec<ParserError>,
    next_expr_id: u32,
    next_pattern_id: u32,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>], options: ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            next_expr_id: 0,
            next_pattern_id: 0,
            options,
        }
    }

    /// Parses the whole token stream as a program.
    pub fn parse_program(mut self, module_id: &str) -> ParseResult {
        let scope = if self.has_next() {
            self.get_scope(None, ScopeKinds::PROGRAM)
        } else {
            Scope::default()
        };

        log::debug!(
            "parsed module {}: {} expressions, {} functions, {} classes, {} unions, {} errors",
            module_id,
            scope.expressions.len(),
            scope.functions.len(),
            scope.classes.len(),
            scope.unions.len(),
            self.errors.len()
        );

        ParseResult {
            program: LangProgram {
                module_id: module_id.to_string(),
                expressions: scope.expressions,
                functions: scope.functions,
                classes: scope.classes,
                unions: scope.unions,
            },
            errors: self.errors,
        }
    }

    /// Parses a single expression from the start of the stream.
    pub fn parse_expression(mut self) -> (Option<Expr>, Vec<ParserError>) {
        let (expression, _) = self.pop_expression(None);
        (expression, self.errors)
    }

    //--------------------------------------------------------------------------
    // Token cursor
    //--------------------------------------------------------------------------

    fn current(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn has_next(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// Advances past the current token. Returns whether a token remains.
    fn move_next(&mut self) -> bool {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.has_next()
    }

    /// Skips a `class` or `union` declaration written where none is allowed:
    /// the keyword, the name, the generic parameters and the body.
    fn skip_declaration(&mut self) {
        self.move_next();
        if self.at(TokenKind::Identifier) {
            self.move_next();
        }
        if self.at(TokenKind::LeftAngleBracket) {
            self.skip_balanced(TokenKind::LeftAngleBracket, TokenKind::RightAngleBracket);
        }
        if self.at(TokenKind::LeftBrace) {
            self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
        }
    }

    /// Moves past the token closing the one at the cursor.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        let mut depth = 0usize;
        while let Some(kind) = self.current_kind() {
            self.move_next();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn current_span(&self) -> Option<SourceSpan> {
        self.current().map(|t| t.span)
    }

    fn last_span(&self) -> Option<SourceSpan> {
        self.tokens.last().map(|t| t.span)
    }

    //--------------------------------------------------------------------------
    // Error helpers
    //--------------------------------------------------------------------------

    fn error_span(&mut self, kind: ParserErrorKind, span: Option<SourceSpan>) {
        if let Some(max) = self.options.max_errors {
            if self.errors.len() >= max {
                return;
            }
        }
        log::trace!("parser error {:?} at {:?}", kind, span);
        self.errors.push(ParserError::new(kind, span));
    }

    fn error_at(&mut self, kind: ParserErrorKind, token: Option<&Token<'_>>) {
        self.error_span(kind, token.map(|t| t.span));
    }

    fn error_at_current(&mut self, kind: ParserErrorKind) {
        let span = self.current_span();
        self.error_span(kind, span);
    }

    /// Checks the current token is `kind`, reporting an error otherwise.
    fn expect_current(&mut self, kind: TokenKind) -> Option<&'a Token<'a>> {
        match self.current() {
            Some(token) if token.kind == kind => Some(token),
            other => {
                self.error_at(ParserErrorKind::ExpectedToken { expected: vec![kind] }, other);
                None
            }
        }
    }

    fn expect_next(&mut self, kind: TokenKind) -> Option<&'a Token<'a>> {
        self.move_next();
        self.expect_current(kind)
    }

    fn expect_current_identifier(&mut self, other_expected: &[TokenKind]) -> Option<Ident> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => Some(ident(token)),
            other => {
                let mut expected = other_expected.to_vec();
                expected.push(TokenKind::Identifier);
                self.error_at(ParserErrorKind::ExpectedToken { expected }, other);
                None
            }
        }
    }

    fn expect_next_identifier(&mut self) -> Option<Ident> {
        self.move_next();
        self.expect_current_identifier(&[])
    }

    fn new_expr(&mut self, kind: ExprKind, span: SourceSpan) -> Expr {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        Expr { id, kind, span }
    }

    fn new_pattern(&mut self, kind: PatternKind, span: SourceSpan) -> Pattern {
        let id = PatternId(self.next_pattern_id);
        self.next_pattern_id += 1;
        Pattern { id, kind, span }
    }

    //--------------------------------------------------------------------------
    // Comma separated lists
    //--------------------------------------------------------------------------

    fn report_list_error(&mut self, item: ListItem<'_>, terminator: Option<TokenKind>, token: Option<&Token<'_>>) {
        let kind = match (item, terminator) {
            (ListItem::Tokens(tokens), terminator) => {
                let mut expected = tokens.to_vec();
                expected.extend(terminator);
                ParserErrorKind::ExpectedToken { expected }
            }
            (ListItem::Expression, Some(t)) => ParserErrorKind::ExpectedTokenOrExpression { expected: vec![t] },
            (ListItem::Expression, None) => ParserErrorKind::ExpectedExpression,
            (ListItem::Type, Some(t)) => ParserErrorKind::ExpectedTypeOrToken { expected: vec![t] },
            (ListItem::Type, None) => ParserErrorKind::ExpectedType,
            (ListItem::Pattern, Some(t)) => ParserErrorKind::ExpectedPatternOrToken { expected: vec![t] },
            (ListItem::Pattern, None) => ParserErrorKind::ExpectedPattern,
        };
        self.error_at(kind, token);
    }

    /// Parses `item (, item)* ,?` up to `terminator`.
    ///
    /// Expects the current token to be the list's opening token. Leaves the
    /// cursor on the token after the terminator.
    fn comma_separated<T>(
        &mut self,
        terminator: TokenKind,
        item_kind: ListItem<'_>,
        mut item: impl FnMut(&mut Self) -> Option<T>,
    ) -> CommaList<T> {
        let mut list = CommaList {
            items: Vec::new(),
            last: None,
            stray_comma: false,
            trailing_comma: false,
        };

        if !self.move_next() {
            self.report_list_error(item_kind, Some(terminator), None);
            return list;
        }

        let mut after_comma = false;
        loop {
            let Some(token) = self.current() else {
                break;
            };
            if token.kind == terminator {
                break;
            }

            if !list.items.is_empty() {
                if token.kind != TokenKind::Comma {
                    self.error_at(
                        ParserErrorKind::ExpectedToken {
                            expected: vec![TokenKind::Comma, terminator],
                        },
                        Some(token),
                    );
                } else {
                    after_comma = true;
                    if !self.move_next() {
                        self.report_list_error(item_kind, Some(terminator), None);
                        break;
                    }
                }
            }

            while let Some(comma) = self.current().filter(|t| t.kind == TokenKind::Comma) {
                self.error_at(ParserErrorKind::ScopeUnexpectedComma, Some(comma));
                list.stray_comma = true;
                after_comma = true;
                self.move_next();
            }

            if !self.has_next() {
                self.report_list_error(item_kind, Some(terminator), None);
                break;
            }

            if self.at(terminator) {
                break;
            }

            after_comma = false;
            let before = self.pos;
            let next = item(self);
            let produced = next.is_some();
            if let Some(next) = next {
                list.items.push(next);
            } else if self.pos == before {
                self.move_next();
            }

            if !self.has_next() {
                let expected = if produced {
                    vec![TokenKind::Comma, terminator]
                } else {
                    vec![terminator]
                };
                self.error_span(ParserErrorKind::ExpectedToken { expected }, None);
                break;
            }
        }

        if let Some(closing) = self.current().filter(|t| t.kind == terminator) {
            list.last = Some(closing.span);
            list.trailing_comma = after_comma && !list.items.is_empty();
            self.move_next();
        }
        list
    }

    //--------------------------------------------------------------------------
    // Scopes: program, blocks and function bodies
    //--------------------------------------------------------------------------

    /// Parses a scope. Expects the current token to be the opening token, or
    /// the first token of the scope when `closing` is `None`.
    fn get_scope(&mut self, closing: Option<TokenKind>, kinds: ScopeKinds) -> Scope {
        let expected = kinds.expected_tokens(closing);
        let start = self.current_span();
        let mut scope = Scope::default();
        let mut end = start;

        if closing.is_some() && !self.move_next() {
            self.report_missing_closing(closing);
            scope.span = start;
            return scope;
        }

        let mut closed = false;
        let mut pending_tail: Option<SourceSpan> = None;

        while let Some(token) = self.current() {
            if Some(token.kind) == closing {
                end = Some(token.span);
                closed = true;
                self.move_next();
                break;
            }

            let modifiers = self.get_modifiers();
            let Some(token) = self.current() else {
                self.error_span(ParserErrorKind::ExpectedToken { expected: expected.clone() }, None);
                break;
            };

            if kinds.functions && token.kind == TokenKind::Fn {
                if let Some(function) = self.get_function_declaration(modifiers) {
                    end = Some(function.span);
                    scope.functions.push(function);
                }
                pending_tail = None;
                scope.has_tail = false;
                continue;
            }

            if kinds.type_definitions && matches!(token.kind, TokenKind::Class | TokenKind::Union) {
                let declaration = if token.kind == TokenKind::Class {
                    DeclarationKind::Class
                } else {
                    DeclarationKind::Union
                };
                self.report_unexpected_modifiers(&modifiers, declaration, false);

                if token.kind == TokenKind::Class {
                    if let Some(class) = self.get_class_definition(modifiers) {
                        end = Some(class.span);
                        scope.classes.push(class);
                    }
                } else if let Some(union) = self.get_union_definition(modifiers) {
                    end = Some(union.span);
                    scope.unions.push(union);
                }
                pending_tail = None;
                scope.has_tail = false;
                continue;
            }

            if matches!(token.kind, TokenKind::Class | TokenKind::Union) {
                self.error_at(ParserErrorKind::ScopeMissingMember { expected: expected.clone() }, Some(token));
                self.skip_declaration();
                pending_tail = None;
                scope.has_tail = false;
                continue;
            }

            if !kinds.expressions {
                self.error_at(ParserErrorKind::ScopeMissingMember { expected: expected.clone() }, Some(token));
                self.move_next();
                continue;
            }

            self.report_unexpected_modifiers(&modifiers, DeclarationKind::Expression, true);

            let (expression, consumed) = self.pop_expression(None);
            let Some(expression) = expression else {
                if !consumed {
                    if !self.at(TokenKind::Semicolon) {
                        self.error_at_current(ParserErrorKind::ScopeMissingMember { expected: expected.clone() });
                    }
                    self.move_next();
                } else if self.at(TokenKind::Semicolon) {
                    self.move_next();
                }
                pending_tail = None;
                scope.has_tail = false;
                continue;
            };

            if let Some(previous) = pending_tail.take() {
                self.error_span(ParserErrorKind::ScopeEarlyTailReturnExpression, Some(previous));
            }

            let expression_span = expression.span;
            let is_block_like = matches!(
                expression.kind,
                ExprKind::If(_) | ExprKind::Block(_) | ExprKind::While { .. }
            );
            scope.expressions.push(expression);
            end = Some(expression_span);

            match self.current_kind() {
                None => {
                    scope.has_tail = true;
                    break;
                }
                Some(TokenKind::Semicolon) => {
                    end = self.current_span();
                    scope.has_tail = false;
                    self.move_next();
                }
                Some(_) => {
                    scope.has_tail = true;
                    if !is_block_like {
                        pending_tail = Some(expression_span);
                    }
                }
            }
        }

        if closing.is_some() && !closed {
            self.report_missing_closing(closing);
            end = self.last_span().or(end);
        }

        scope.span = match (start, end) {
            (Some(start), Some(end)) => Some(join_spans(start, end)),
            (start, end) => start.or(end),
        };
        scope
    }

    fn report_missing_closing(&mut self, closing: Option<TokenKind>) {
        if let Some(expected) = closing {
            self.error_span(ParserErrorKind::ScopeMissingClosingTag { expected }, None);
        }
    }

    /// Collects `pub`, `static` and `mut` in any order. The first occurrence
    /// of each wins; repeats are reported.
    fn get_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        while let Some(token) = self.current().filter(|t| t.kind.is_modifier()) {
            let slot = match token.kind {
                TokenKind::Pub => &mut modifiers.access,
                TokenKind::Static => &mut modifiers.static_,
                _ => &mut modifiers.mutability,
            };
            if slot.is_some() {
                self.error_at(ParserErrorKind::ScopeDuplicateModifier { modifier: token.kind }, Some(token));
            } else {
                *slot = Some(token.span);
            }
            self.move_next();
        }
        modifiers
    }

    /// Reports modifiers that do not apply to `declaration`. `static` is
    /// always reported before `mut`.
    fn report_unexpected_modifiers(&mut self, modifiers: &Modifiers, declaration: DeclarationKind, include_access: bool) {
        let mut unexpected = vec![
            (modifiers.static_, TokenKind::Static),
            (modifiers.mutability, TokenKind::Mut),
        ];
        if include_access {
            unexpected.push((modifiers.access, TokenKind::Pub));
        }
        for (span, modifier) in unexpected {
            if let Some(span) = span {
                self.error_span(ParserErrorKind::UnexpectedModifier { declaration, modifier }, Some(span));
            }
        }
    }

    //--------------------------------------------------------------------------
    // Type definitions and members
    //--------------------------------------------------------------------------

    fn get_class_definition(&mut self, modifiers: Modifiers) -> Option<ProgramClass> {
        let start = modifiers.access.or(self.current_span());
        let Some(name) = self.expect_next_identifier() else {
            self.move_next();
            return None;
        };
        let mut class = ProgramClass {
            modifiers,
            span: join_opt(start, name.span),
            name,
            type_parameters: Vec::new(),
            functions: Vec::new(),
            fields: Vec::new(),
        };

        if !self.move_next() {
            self.error_span(
                ParserErrorKind::ExpectedToken {
                    expected: vec![TokenKind::LeftBrace, TokenKind::LeftAngleBracket],
                },
                None,
            );
            return Some(class);
        }

        let had_type_parameters = self.at(TokenKind::LeftAngleBracket);
        if had_type_parameters {
            class.type_parameters = self.get_type_parameter_list();
            if !self.has_next() {
                self.error_span(ParserErrorKind::ExpectedToken { expected: vec![TokenKind::LeftBrace] }, None);
                return Some(class);
            }
        }

        if !self.at(TokenKind::LeftBrace) {
            self.report_missing_body_open(had_type_parameters);
            self.move_next();
            return Some(class);
        }

        let members = self.get_member_list(MemberKinds {
            functions: true,
            fields: true,
            variants: false,
        });
        class.functions = members.functions;
        class.fields = members.fields;
        if let Some(end) = members.span {
            class.span = join_opt(start, end);
        }
        Some(class)
    }

    fn get_union_definition(&mut self, modifiers: Modifiers) -> Option<ProgramUnion> {
        let start = modifiers.access.or(self.current_span());
        let Some(name) = self.expect_next_identifier() else {
            self.move_next();
            return None;
        };
        let mut union = ProgramUnion {
            modifiers,
            span: join_opt(start, name.span),
            name,
            type_parameters: Vec::new(),
            functions: Vec::new(),
            variants: Vec::new(),
        };

        if !self.move_next() {
            self.error_span(
                ParserErrorKind::ExpectedToken {
                    expected: vec![TokenKind::LeftAngleBracket, TokenKind::LeftBrace],
                },
                None,
            );
            return Some(union);
        }

        let had_type_parameters = self.at(TokenKind::LeftAngleBracket);
        if had_type_parameters {
            union.type_parameters = self.get_type_parameter_list();
            if !self.has_next() {
                self.error_span(ParserErrorKind::ExpectedToken { expected: vec![TokenKind::LeftBrace] }, None);
                return Some(union);
            }
        }

        if !self.at(TokenKind::LeftBrace) {
            self.report_missing_body_open(had_type_parameters);
            self.move_next();
            return Some(union);
        }

        let members = self.get_member_list(MemberKinds {
            functions: true,
            fields: false,
            variants: true,
        });
        union.functions = members.functions;
        union.variants = members.variants;
        if let Some(end) = members.span {
            union.span = join_opt(start, end);
        }
        Some(union)
    }

    fn report_missing_body_open(&mut self, had_type_parameters: bool) {
        let expected = if had_type_parameters {
            vec![TokenKind::LeftBrace]
        } else {
            vec![TokenKind::LeftBrace, TokenKind::LeftAngleBracket]
        };
        self.error_at_current(ParserErrorKind::ExpectedToken { expected });
    }

    /// `<A, B>` on a declaration.
    fn get_type_parameter_list(&mut self) -> Vec<Ident> {
        let open = self.current_span();
        let list = self.comma_separated(
            TokenKind::RightAngleBracket,
            ListItem::Tokens(&[TokenKind::Identifier]),
            |parser| {
                let parameter = parser.expect_current_identifier(&[TokenKind::RightAngleBracket]);
                parser.move_next();
                parameter
            },
        );
        self.check_empty_type_list(&list, open);
        list.items
    }

    fn check_empty_type_list<T>(&mut self, list: &CommaList<T>, open: Option<SourceSpan>) {
        if list.items.is_empty() && !list.stray_comma && list.last.is_some() {
            let span = match (open, list.last) {
                (Some(open), Some(last)) => Some(join_spans(open, last)),
                (open, last) => open.or(last),
            };
            self.error_span(ParserErrorKind::EmptyTypeArgumentList, span);
        }
    }

    /// Parses a class or union body. Expects the current token to be `{`.
    fn get_member_list(&mut self, kinds: MemberKinds) -> MemberList {
        let mut expected = vec![TokenKind::RightBrace];
        if kinds.functions {
            expected.extend([TokenKind::Fn, TokenKind::Pub, TokenKind::Static]);
        }
        if kinds.fields {
            expected.extend([TokenKind::Field, TokenKind::Pub, TokenKind::Mut, TokenKind::Static]);
        }
        if kinds.variants {
            expected.push(TokenKind::Identifier);
        }
        let mut seen = Vec::new();
        expected.retain(|k| {
            let fresh = !seen.contains(k);
            seen.push(*k);
            fresh
        });

        let start = self.current_span();
        let mut members = MemberList::default();
        let mut end = start;

        if !self.move_next() {
            self.error_span(ParserErrorKind::ScopeMissingClosingTag { expected: TokenKind::RightBrace }, None);
            members.span = start;
            return members;
        }

        let mut comma = CommaState::Forbidden;
        loop {
            let Some(token) = self.current() else {
                self.error_span(ParserErrorKind::ScopeMissingClosingTag { expected: TokenKind::RightBrace }, None);
                end = self.last_span().or(end);
                break;
            };

            match token.kind {
                TokenKind::Comma => {
                    if comma == CommaState::Forbidden {
                        self.error_at(ParserErrorKind::ScopeUnexpectedComma, Some(token));
                    }
                    comma = CommaState::Forbidden;
                    self.move_next();
                    continue;
                }
                TokenKind::RightBrace => {
                    end = Some(token.span);
                    self.move_next();
                    break;
                }
                _ => {}
            }

            if comma == CommaState::Required {
                self.error_at(
                    ParserErrorKind::ExpectedToken {
                        expected: vec![TokenKind::Comma, TokenKind::RightBrace],
                    },
                    Some(token),
                );
            }

            if matches!(token.kind, TokenKind::Class | TokenKind::Union) {
                self.error_at(ParserErrorKind::ScopeMissingMember { expected: expected.clone() }, Some(token));
                self.skip_declaration();
                comma = CommaState::Allowed;
                continue;
            }

            let is_member_start = token.kind.is_modifier()
                || matches!(token.kind, TokenKind::Fn | TokenKind::Field)
                || (kinds.variants && token.kind == TokenKind::Identifier);
            if !is_member_start {
                self.error_at(ParserErrorKind::ScopeMissingMember { expected: expected.clone() }, Some(token));
                self.move_next();
                continue;
            }

            comma = match self.get_member(kinds) {
                Some(Member::Function(function)) => {
                    members.functions.push(function);
                    CommaState::Allowed
                }
                Some(Member::Field(field)) => {
                    members.fields.push(field);
                    CommaState::Required
                }
                Some(Member::Variant(variant)) => {
                    members.variants.push(variant);
                    CommaState::Required
                }
                None => CommaState::Allowed,
            };
        }

        members.span = match (start, end) {
            (Some(start), Some(end)) => Some(join_spans(start, end)),
            (start, end) => start.or(end),
        };
        members
    }

    fn get_member(&mut self, kinds: MemberKinds) -> Option<Member> {
        let mut expected = Vec::new();
        if kinds.functions {
            expected.push(TokenKind::Fn);
        }
        if kinds.fields {
            expected.push(TokenKind::Field);
        }
        if kinds.variants {
            expected.push(TokenKind::Identifier);
        }

        let modifiers = self.get_modifiers();
        let Some(token) = self.current() else {
            self.error_span(ParserErrorKind::ExpectedToken { expected }, None);
            return None;
        };

        match token.kind {
            TokenKind::Fn if kinds.functions => self.get_function_declaration(modifiers).map(Member::Function),
            TokenKind::Field if kinds.fields => self.get_field(modifiers).map(Member::Field),
            TokenKind::Identifier if kinds.variants => {
                self.report_unexpected_modifiers(&modifiers, DeclarationKind::UnionVariant, true);
                Some(Member::Variant(self.get_union_variant(ident(token))))
            }
            _ => {
                self.error_at(ParserErrorKind::ExpectedToken { expected }, Some(token));
                self.move_next();
                None
            }
        }
    }

    /// `field name: Type [= value]`. Expects the current token to be `field`.
    fn get_field(&mut self, modifiers: Modifiers) -> Option<ClassField> {
        let name = self.expect_next_identifier()?;
        let mut field = ClassField {
            modifiers,
            name,
            ty: None,
            initializer: None,
        };

        if self.expect_next(TokenKind::Colon).is_none() {
            return Some(field);
        }

        field.ty = self.expect_next_type_identifier();
        if field.ty.is_none() {
            return Some(field);
        }

        if self.at(TokenKind::Equals) {
            field.initializer = self.expect_next_expression(None, ParserErrorKind::ExpectedExpression);
        }

        Some(field)
    }

    fn get_union_variant(&mut self, name: Ident) -> UnionVariant {
        if !self.move_next() {
            return UnionVariant {
                name,
                kind: UnionVariantKind::Unit,
            };
        }

        let kind = match self.current_kind() {
            Some(TokenKind::LeftParenthesis) => {
                let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Type, |parser| {
                    parser.get_type_identifier()
                });
                UnionVariantKind::Tuple(list.items)
            }
            Some(TokenKind::LeftBrace) => {
                let members = self.get_member_list(MemberKinds {
                    functions: false,
                    fields: true,
                    variants: false,
                });
                UnionVariantKind::Class(members.fields)
            }
            _ => UnionVariantKind::Unit,
        };

        UnionVariant { name, kind }
    }

    /// `fn name<T>(mut a: T): R { ... }`. Expects the current token to be `fn`.
    fn get_function_declaration(&mut self, modifiers: Modifiers) -> Option<LangFunction> {
        let fn_span = self.current_span();
        let start = [modifiers.access, modifiers.static_, modifiers.mutability, fn_span]
            .into_iter()
            .flatten()
            .min_by_key(|s| s.offset());

        let Some(name) = self.expect_next_identifier() else {
            self.move_next();
            return None;
        };

        let mut function = LangFunction {
            modifiers,
            span: join_opt(start, name.span),
            name,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            body: Block::default(),
        };

        if !self.move_next() {
            self.error_span(
                ParserErrorKind::ExpectedToken {
                    expected: vec![TokenKind::LeftAngleBracket, TokenKind::LeftParenthesis],
                },
                None,
            );
            return Some(function);
        }

        let had_type_parameters = self.at(TokenKind::LeftAngleBracket);
        if had_type_parameters {
            function.type_parameters = self.get_type_parameter_list();
            if !self.has_next() {
                self.error_span(
                    ParserErrorKind::ExpectedToken {
                        expected: vec![TokenKind::LeftParenthesis],
                    },
                    None,
                );
                return Some(function);
            }
        }

        if !self.at(TokenKind::LeftParenthesis) {
            let expected = if had_type_parameters {
                vec![TokenKind::LeftParenthesis]
            } else {
                vec![TokenKind::LeftParenthesis, TokenKind::LeftAngleBracket]
            };
            self.error_at_current(ParserErrorKind::ExpectedToken { expected });
            self.move_next();
            return Some(function);
        }

        let parameters = self.comma_separated(
            TokenKind::RightParenthesis,
            ListItem::Tokens(&[TokenKind::Identifier, TokenKind::Mut]),
            Self::get_function_parameter,
        );
        function.parameters = parameters.items;

        if !self.has_next() {
            if parameters.last.is_some() {
                self.error_span(
                    ParserErrorKind::ExpectedToken {
                        expected: vec![TokenKind::LeftBrace, TokenKind::Colon],
                    },
                    None,
                );
            }
            return Some(function);
        }

        if self.at(TokenKind::Colon) {
            function.return_type = self.expect_next_type_identifier();
            if function.return_type.is_none() {
                self.move_next();
                return Some(function);
            }
            if !self.has_next() {
                self.error_span(ParserErrorKind::ExpectedToken { expected: vec![TokenKind::LeftBrace] }, None);
                return Some(function);
            }
        }

        if !self.at(TokenKind::LeftBrace) {
            let expected = if function.return_type.is_some() {
                vec![TokenKind::LeftBrace]
            } else {
                vec![TokenKind::Colon, TokenKind::LeftBrace]
            };
            self.error_at_current(ParserErrorKind::ExpectedToken { expected });
            self.move_next();
            return Some(function);
        }

        let scope = self.get_scope(Some(TokenKind::RightBrace), ScopeKinds::BLOCK);
        function.body = Block {
            expressions: scope.expressions,
            functions: scope.functions,
            has_tail: scope.has_tail,
        };
        if let Some(end) = scope.span {
            function.span = join_opt(start, end);
        }
        Some(function)
    }

    fn get_function_parameter(&mut self) -> Option<FunctionParameter> {
        let mut mutable = false;
        if self.at(TokenKind::Mut) {
            mutable = true;
            if !self.move_next() {
                self.error_span(ParserErrorKind::ExpectedToken { expected: vec![TokenKind::Identifier] }, None);
                return None;
            }
        }

        let token = self.current()?;
        if token.kind != TokenKind::Identifier {
            let expected = if mutable {
                vec![TokenKind::Identifier]
            } else {
                vec![TokenKind::Mut, TokenKind::Identifier]
            };
            self.error_at(ParserErrorKind::ExpectedToken { expected }, Some(token));
            self.move_next();
            return None;
        }
        let name = ident(token);

        if self.expect_next(TokenKind::Colon).is_none() {
            return Some(FunctionParameter { name, ty: None, mutable });
        }

        let ty = self.expect_next_type_identifier();
        Some(FunctionParameter { name, ty, mutable })
    }
}

pub(crate) fn ident(token: &Token<'_>) -> Ident {
    Ident::new(token.lexeme, token.span)
}

fn join_opt(start: Option<SourceSpan>, end: SourceSpan) -> SourceSpan {
    match start {
        Some(start) => join_spans(start, end),
        None => end,
    }
}

#[cfg(test)]
mod tests;
