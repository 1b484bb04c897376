use logos::Logos;
use miette::SourceSpan;
use std::fmt;

use crate::error::{ParserError, ParserErrorKind};

/// A token spans from `start` to `end` within the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: SourceSpan,
}

/// All possible tokens we can encounter in our grammar.
#[derive(Debug, Logos, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TokenKind {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("pub")]
    Pub,
    #[token("fn")]
    Fn,
    #[token("var")]
    Var,
    #[token("mut")]
    Mut,
    #[token("class")]
    Class,
    #[token("field")]
    Field,
    #[token("new")]
    New,
    #[token("static")]
    Static,
    #[token("union")]
    Union,
    #[token("matches")]
    Matches,
    #[token("match")]
    Match,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("todo!")]
    Todo,

    // Multi-character operators
    #[token("::<")]
    Turbofish,
    #[token("::")]
    DoubleColon,
    #[token("==")]
    DoubleEquals,
    #[token("!=")]
    NotEquals,
    #[token("=>")]
    EqualsArrow,
    #[token("&&")]
    DoubleAmpersand,
    #[token("||")]
    DoubleBar,

    // Single-character operators
    #[token("+")]
    Plus,
    #[token("-")]
    Dash,
    #[token("*")]
    Star,
    #[token("/")]
    ForwardSlash,
    #[token("=")]
    Equals,
    #[token("!")]
    Bang,
    #[token("?")]
    QuestionMark,
    #[token("<")]
    LeftAngleBracket,
    #[token(">")]
    RightAngleBracket,

    // Punctuation
    #[token("(")]
    LeftParenthesis,
    #[token(")")]
    RightParenthesis,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("_")]
    Underscore,

    // Literals
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // Whitespace and line comments are skipped
    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,
}

impl TokenKind {
    /// Whether this token is one of the declaration modifiers.
    pub fn is_modifier(self) -> bool {
        matches!(self, TokenKind::Pub | TokenKind::Static | TokenKind::Mut)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Pub => "pub",
            TokenKind::Fn => "fn",
            TokenKind::Var => "var",
            TokenKind::Mut => "mut",
            TokenKind::Class => "class",
            TokenKind::Field => "field",
            TokenKind::New => "new",
            TokenKind::Static => "static",
            TokenKind::Union => "union",
            TokenKind::Matches => "matches",
            TokenKind::Match => "match",
            TokenKind::Return => "return",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::While => "while",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Todo => "todo!",
            TokenKind::Turbofish => "::<",
            TokenKind::DoubleColon => "::",
            TokenKind::DoubleEquals => "==",
            TokenKind::NotEquals => "!=",
            TokenKind::EqualsArrow => "=>",
            TokenKind::DoubleAmpersand => "&&",
            TokenKind::DoubleBar => "||",
            TokenKind::Plus => "+",
            TokenKind::Dash => "-",
            TokenKind::Star => "*",
            TokenKind::ForwardSlash => "/",
            TokenKind::Equals => "=",
            TokenKind::Bang => "!",
            TokenKind::QuestionMark => "?",
            TokenKind::LeftAngleBracket => "<",
            TokenKind::RightAngleBracket => ">",
            TokenKind::LeftParenthesis => "(",
            TokenKind::RightParenthesis => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Underscore => "_",
            TokenKind::IntLiteral => "int literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Error => "<error>",
        };
        f.write_str(text)
    }
}

/// Tokenizes `source`, failing on the first byte range that is not a valid token.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParserError> {
    let (tokens, mut errors) = tokenize_lossy(source);
    match errors.is_empty() {
        true => Ok(tokens),
        false => Err(errors.remove(0)),
    }
}

/// Tokenizes `source`, skipping unlexable ranges and reporting each as a `LexError`.
pub(crate) fn tokenize_lossy(source: &str) -> (Vec<Token<'_>>, Vec<ParserError>) {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while let Some(kind) = lexer.next() {
        let range = lexer.span();
        let span = SourceSpan::new(range.start.into(), range.end - range.start);
        if kind == TokenKind::Error {
            log::trace!("unlexable input {:?} at {:?}", lexer.slice(), range);
            errors.push(ParserError::new(ParserErrorKind::LexError, Some(span)));
            continue;
        }
        tokens.push(Token {
            kind,
            lexeme: lexer.slice(),
            span,
        });
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("var matches match mutable _ _a"),
            vec![
                TokenKind::Var,
                TokenKind::Matches,
                TokenKind::Match,
                TokenKind::Identifier,
                TokenKind::Underscore,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn turbofish_and_static_access() {
        assert_eq!(
            kinds("result::<i32> MyUnion::A"),
            vec![
                TokenKind::Identifier,
                TokenKind::Turbofish,
                TokenKind::Identifier,
                TokenKind::RightAngleBracket,
                TokenKind::Identifier,
                TokenKind::DoubleColon,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_eq!(
            kinds("a // trailing comment\n  \"b\\\"c\" 12"),
            vec![TokenKind::Identifier, TokenKind::StringLiteral, TokenKind::IntLiteral]
        );
    }

    #[test]
    fn spans_point_into_source() {
        let tokens = tokenize("var abc").expect("source should tokenize");
        assert_eq!(tokens[1].lexeme, "abc");
        assert_eq!(tokens[1].span.offset(), 4);
        assert_eq!(tokens[1].span.len(), 3);
    }

    #[test]
    fn unknown_character_is_a_lex_error() {
        let err = tokenize("a $ b").unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::LexError);
        assert_eq!(err.span.map(|s| s.offset()), Some(2));
    }
}
