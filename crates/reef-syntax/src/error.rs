use miette::{Diagnostic, SourceSpan};
use std::fmt;
use thiserror::Error;

use crate::lexer::TokenKind;

/// A syntax error produced while parsing.
///
/// `span` is `None` when the parser ran out of tokens.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("{kind}")]
#[diagnostic(code(reef_syntax::parse_error))]
pub struct ParserError {
    pub kind: ParserErrorKind,
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, span: Option<SourceSpan>) -> Self {
        Self { kind, span }
    }
}

/// The kind of declaration a modifier was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Class,
    Union,
    UnionVariant,
    Expression,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Class => write!(f, "class"),
            DeclarationKind::Union => write!(f, "union"),
            DeclarationKind::UnionVariant => write!(f, "union variant"),
            DeclarationKind::Expression => write!(f, "expression"),
        }
    }
}

/// Symbolic parser error kinds. Tests match on these exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserErrorKind {
    /// None of the expected tokens was found.
    ExpectedToken { expected: Vec<TokenKind> },
    /// An expression was required.
    ExpectedExpression,
    /// Either an expression or one of the tokens was required.
    ExpectedTokenOrExpression { expected: Vec<TokenKind> },
    ExpectedType,
    ExpectedTypeOrToken { expected: Vec<TokenKind> },
    ExpectedPattern,
    ExpectedPatternOrToken { expected: Vec<TokenKind> },
    /// A named type was required, e.g. after `new` or before `::`.
    ExpectedTypeName,
    /// `var a =` with nothing after the `=`.
    VariableDeclarationMissingValue,
    BinaryOperatorMissingLeftValue,
    BinaryOperatorMissingRightValue,
    /// A scope opened with `{` was never closed.
    ScopeMissingClosingTag { expected: TokenKind },
    /// A leading or doubled comma in a comma separated list.
    ScopeUnexpectedComma,
    /// An expression was followed by another expression without a `;`.
    ScopeEarlyTailReturnExpression,
    ScopeDuplicateModifier { modifier: TokenKind },
    /// A token that cannot start any member allowed in this scope.
    ScopeMissingMember { expected: Vec<TokenKind> },
    UnexpectedModifier {
        declaration: DeclarationKind,
        modifier: TokenKind,
    },
    /// `<>` with no type arguments or parameters.
    EmptyTypeArgumentList,
    IntLiteralOutOfRange,
    LexError,
}

fn join_kinds(kinds: &[TokenKind]) -> String {
    kinds
        .iter()
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserErrorKind::ExpectedToken { expected } => {
                write!(f, "Expected one of {}", join_kinds(expected))
            }
            ParserErrorKind::ExpectedExpression => write!(f, "Expected expression"),
            ParserErrorKind::ExpectedTokenOrExpression { expected } => {
                write!(f, "Expected expression or one of {}", join_kinds(expected))
            }
            ParserErrorKind::ExpectedType => write!(f, "Expected type"),
            ParserErrorKind::ExpectedTypeOrToken { expected } => {
                write!(f, "Expected type or one of {}", join_kinds(expected))
            }
            ParserErrorKind::ExpectedPattern => write!(f, "Expected pattern"),
            ParserErrorKind::ExpectedPatternOrToken { expected } => {
                write!(f, "Expected pattern or one of {}", join_kinds(expected))
            }
            ParserErrorKind::ExpectedTypeName => write!(f, "Expected type name"),
            ParserErrorKind::VariableDeclarationMissingValue => {
                write!(f, "Variable declaration is missing a value after '='")
            }
            ParserErrorKind::BinaryOperatorMissingLeftValue => {
                write!(f, "Binary operator is missing its left operand")
            }
            ParserErrorKind::BinaryOperatorMissingRightValue => {
                write!(f, "Binary operator is missing its right operand")
            }
            ParserErrorKind::ScopeMissingClosingTag { expected } => {
                write!(f, "Scope is missing its closing '{}'", expected)
            }
            ParserErrorKind::ScopeUnexpectedComma => write!(f, "Unexpected ','"),
            ParserErrorKind::ScopeEarlyTailReturnExpression => {
                write!(f, "Expression must be followed by ';'")
            }
            ParserErrorKind::ScopeDuplicateModifier { modifier } => {
                write!(f, "Duplicate '{}' modifier", modifier)
            }
            ParserErrorKind::ScopeMissingMember { expected } => {
                write!(f, "Expected member, one of {}", join_kinds(expected))
            }
            ParserErrorKind::UnexpectedModifier {
                declaration,
                modifier,
            } => write!(f, "'{}' modifier is not allowed on {}", modifier, declaration),
            ParserErrorKind::EmptyTypeArgumentList => write!(f, "Type argument list is empty"),
            ParserErrorKind::IntLiteralOutOfRange => write!(f, "Integer literal is out of range"),
            ParserErrorKind::LexError => write!(f, "Unrecognised token"),
        }
    }
}
