pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{DeclarationKind, ParserError, ParserErrorKind};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{ParseOptions, ParseResult, Parser};

use miette::SourceSpan;

/// Parses a token stream into a program.
///
/// Parsing always produces a program. Every syntax problem found along the
/// way is returned in [`ParseResult::errors`], in the order encountered.
pub fn parse(module_id: &str, tokens: &[Token<'_>]) -> ParseResult {
    parse_with_options(module_id, tokens, ParseOptions::default())
}

pub fn parse_with_options(module_id: &str, tokens: &[Token<'_>], options: ParseOptions) -> ParseResult {
    Parser::new(tokens, options).parse_program(module_id)
}

/// Tokenizes and parses `source`. Unlexable input is reported as
/// [`ParserErrorKind::LexError`] ahead of any parse errors.
pub fn parse_source(module_id: &str, source: &str) -> ParseResult {
    let (tokens, mut lex_errors) = lexer::tokenize_lossy(source);
    let mut result = parse(module_id, &tokens);
    lex_errors.append(&mut result.errors);
    result.errors = lex_errors;
    result
}

/// Parses a single expression, continuing only while operators bind.
pub fn parse_expression(tokens: &[Token<'_>]) -> (Option<ast::Expr>, Vec<ParserError>) {
    Parser::new(tokens, ParseOptions::default()).parse_expression()
}

/// The smallest span covering both `start` and `end`.
pub fn join_spans(start: SourceSpan, end: SourceSpan) -> SourceSpan {
    let from = start.offset().min(end.offset());
    let to = (start.offset() + start.len()).max(end.offset() + end.len());
    SourceSpan::new(from.into(), to - from)
}
