use miette::SourceSpan;

use super::{ListItem, Parser};
use crate::ast::*;
use crate::error::ParserErrorKind;
use crate::join_spans;
use crate::lexer::{Token, TokenKind};

enum FieldEntry {
    Field(FieldPattern),
    /// `_` discarding every field not listed
    DiscardRemaining,
}

impl<'a> Parser<'a> {
    /// Parses a pattern starting at the current token. Leaves the cursor on
    /// the token after the pattern.
    pub(super) fn get_pattern(&mut self) -> Option<Pattern> {
        let Some(token) = self.current() else {
            self.error_span(ParserErrorKind::ExpectedPattern, None);
            return None;
        };

        match token.kind {
            TokenKind::Underscore => {
                self.move_next();
                Some(self.new_pattern(PatternKind::Discard, token.span))
            }
            TokenKind::Var => {
                let (binding, end) = self.get_pattern_binding(token)?;
                Some(self.new_pattern(PatternKind::Variable(binding), join_spans(token.span, end)))
            }
            TokenKind::Identifier => self.get_type_pattern(),
            _ => {
                self.error_at(ParserErrorKind::ExpectedPattern, Some(token));
                None
            }
        }
    }

    /// `var [mut] name`. Expects the current token to be `var`.
    fn get_pattern_binding(&mut self, var: &'a Token<'a>) -> Option<(PatternBinding, SourceSpan)> {
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

        let other_expected: &[TokenKind] = if mutable { &[] } else { &[TokenKind::Mut] };
        let name = self.expect_current_identifier(other_expected)?;
        self.move_next();

        let end = name.span;
        log::trace!("pattern binding {} at {:?}", name.name, var.span);
        Some((PatternBinding { name, mutable }, end))
    }

    fn get_trailing_binding(&mut self, end: &mut SourceSpan) -> Option<PatternBinding> {
        let var = self.current().filter(|t| t.kind == TokenKind::Var)?;
        let (binding, binding_end) = self.get_pattern_binding(var)?;
        *end = binding_end;
        Some(binding)
    }

    /// Patterns that start with a type name.
    fn get_type_pattern(&mut self) -> Option<Pattern> {
        let ty = self.get_named_type_identifier()?;
        let start = ty.span();
        let mut end = start;

        let kind = match self.current_kind() {
            Some(TokenKind::DoubleColon) => {
                let Some(variant) = self.expect_next_identifier() else {
                    return Some(self.new_pattern(
                        PatternKind::UnionVariant {
                            ty,
                            variant: None,
                            binding: None,
                        },
                        start,
                    ));
                };
                end = variant.span;
                self.move_next();

                match self.current_kind() {
                    Some(TokenKind::LeftParenthesis) => {
                        let list = self.comma_separated(TokenKind::RightParenthesis, ListItem::Pattern, Self::get_pattern);
                        if let Some(last) = list.last {
                            end = last;
                        }
                        let binding = self.get_trailing_binding(&mut end);
                        PatternKind::UnionTupleVariant {
                            ty,
                            variant,
                            members: list.items,
                            binding,
                        }
                    }
                    Some(TokenKind::LeftBrace) => {
                        let (fields, discard_remaining, last) = self.get_field_patterns();
                        if let Some(last) = last {
                            end = last;
                        }
                        let binding = self.get_trailing_binding(&mut end);
                        PatternKind::UnionClassVariant {
                            ty,
                            variant,
                            fields,
                            discard_remaining,
                            binding,
                        }
                    }
                    _ => {
                        let binding = self.get_trailing_binding(&mut end);
                        PatternKind::UnionVariant {
                            ty,
                            variant: Some(variant),
                            binding,
                        }
                    }
                }
            }
            Some(TokenKind::LeftBrace) => {
                let (fields, discard_remaining, last) = self.get_field_patterns();
                if let Some(last) = last {
                    end = last;
                }
                let binding = self.get_trailing_binding(&mut end);
                PatternKind::Class {
                    ty,
                    fields,
                    discard_remaining,
                    binding,
                }
            }
            _ => {
                let binding = self.get_trailing_binding(&mut end);
                PatternKind::Type { ty, binding }
            }
        };

        Some(self.new_pattern(kind, join_spans(start, end)))
    }

    /// `{ a, b: pattern, _ }`. Expects the current token to be `{`.
    fn get_field_patterns(&mut self) -> (Vec<FieldPattern>, bool, Option<SourceSpan>) {
        let list = self.comma_separated(
            TokenKind::RightBrace,
            ListItem::Tokens(&[TokenKind::Identifier, TokenKind::Underscore]),
            |parser| {
                if parser.at(TokenKind::Underscore) {
                    parser.move_next();
                    return Some(FieldEntry::DiscardRemaining);
                }

                let name = parser.expect_current_identifier(&[TokenKind::Underscore])?;
                if !parser.move_next() || !parser.at(TokenKind::Colon) {
                    return Some(FieldEntry::Field(FieldPattern { name, pattern: None }));
                }

                if !parser.move_next() {
                    parser.error_span(ParserErrorKind::ExpectedPattern, None);
                    return Some(FieldEntry::Field(FieldPattern { name, pattern: None }));
                }
                let pattern = parser.get_pattern();
                Some(FieldEntry::Field(FieldPattern { name, pattern }))
            },
        );

        let mut discard_remaining = false;
        let mut fields = Vec::new();
        for entry in list.items {
            match entry {
                FieldEntry::Field(field) => fields.push(field),
                FieldEntry::DiscardRemaining => discard_remaining = true,
            }
        }
        (fields, discard_remaining, list.last)
    }
}
