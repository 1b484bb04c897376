use miette::SourceSpan;

use super::{ident, ListItem, Parser};
use crate::ast::{FnTypeParameter, TypeIdentifier};
use crate::error::ParserErrorKind;
use crate::join_spans;
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    pub(super) fn expect_next_type_identifier(&mut self) -> Option<TypeIdentifier> {
        if !self.move_next() {
            self.error_span(ParserErrorKind::ExpectedType, None);
            return None;
        }
        self.get_type_identifier()
    }

    /// Parses a type starting at the current token and leaves the cursor on
    /// the token after it. Does not move when no type could be parsed.
    pub(super) fn get_type_identifier(&mut self) -> Option<TypeIdentifier> {
        let Some(token) = self.current() else {
            self.error_span(ParserErrorKind::ExpectedType, None);
            return None;
        };

        match token.kind {
            TokenKind::Identifier if token.lexeme == "Fn" => self.get_function_type(token),
            TokenKind::Identifier => self.get_named_type_identifier(),
            TokenKind::LeftParenthesis => self.get_tuple_type(token),
            _ => {
                self.error_at(ParserErrorKind::ExpectedType, Some(token));
                None
            }
        }
    }

    /// `Name` or `Name::<A, B>`.
    pub(super) fn get_named_type_identifier(&mut self) -> Option<TypeIdentifier> {
        let token = match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => token,
            other => {
                self.error_at(ParserErrorKind::ExpectedTypeName, other);
                return None;
            }
        };
        self.move_next();

        let mut span = token.span;
        let mut type_arguments = Vec::new();
        if self.at(TokenKind::Turbofish) {
            let (arguments, end) = self.get_type_arguments();
            type_arguments = arguments;
            if let Some(end) = end {
                span = join_spans(span, end);
            }
        }

        Some(TypeIdentifier::Named {
            name: ident(token),
            type_arguments,
            span,
        })
    }

    /// `::<A, B>`. Expects the current token to be the turbofish.
    pub(super) fn get_type_arguments(&mut self) -> (Vec<TypeIdentifier>, Option<SourceSpan>) {
        let open = self.current_span();
        let list = self.comma_separated(TokenKind::RightAngleBracket, ListItem::Type, Self::get_type_identifier);
        self.check_empty_type_list(&list, open);
        (list.items, list.last)
    }

    /// `Fn(mut A, B): C`
    fn get_function_type(&mut self, token: &'a Token<'a>) -> Option<TypeIdentifier> {
        if self.expect_next(TokenKind::LeftParenthesis).is_none() {
            return Some(TypeIdentifier::Function {
                parameters: Vec::new(),
                return_type: None,
                span: token.span,
            });
        }

        let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Type, |parser| {
            let mutable = parser.at(TokenKind::Mut);
            if mutable && !parser.move_next() {
                parser.error_span(ParserErrorKind::ExpectedType, None);
                return None;
            }
            let ty = parser.get_type_identifier()?;
            Some(FnTypeParameter { ty, mutable })
        });

        let mut end = list.last.unwrap_or(token.span);
        let mut return_type = None;
        if self.at(TokenKind::Colon) {
            if let Some(ty) = self.expect_next_type_identifier() {
                end = ty.span();
                return_type = Some(Box::new(ty));
            }
        }

        Some(TypeIdentifier::Function {
            parameters: list.items,
            return_type,
            span: join_spans(token.span, end),
        })
    }

    /// `()`, `(A)` or `(A, B)`.
    fn get_tuple_type(&mut self, token: &'a Token<'a>) -> Option<TypeIdentifier> {
        let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Type, Self::get_type_identifier);
        let span = join_spans(token.span, list.last.unwrap_or(token.span));
        let mut members = list.items;

        match members.len() {
            0 => Some(TypeIdentifier::Unit { span }),
            1 if !list.trailing_comma => members.pop(),
            _ => Some(TypeIdentifier::Tuple { members, span }),
        }
    }
}
