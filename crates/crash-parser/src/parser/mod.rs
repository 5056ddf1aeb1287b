//! Parser entry points.
//!
//! ## Architecture
//!
//! - `stream`: `TokenStream` with lookahead and span tracking
//! - `error`: `ParseError` and its categories
//! - `decl`: `circuit` definitions and statements
//! - `expr`: expressions, Pratt parsing for binary operators

mod decl;
mod error;
mod expr;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use crash_ast::Program;
use crash_lexer::Token;
use std::ops::Range;

/// Pair tokens with their index as a stand-in byte range.
///
/// Used by callers that only have bare tokens (tests, quick checks). Error
/// spans then point at token indices rather than bytes.
fn tokens_with_index_spans(tokens: &[Token]) -> Vec<(Token, Range<usize>)> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, tok)| (tok.clone(), i..i + 1))
        .collect()
}

/// Parse bare tokens into a program.
pub fn parse_program(tokens: &[Token], file_id: u16) -> Result<Program, Vec<ParseError>> {
    let tokens = tokens_with_index_spans(tokens);
    parse_program_with_spans(&tokens, file_id)
}

/// Parse tokens carrying real byte ranges into a program.
///
/// Parsing continues after an error by skipping to the next `circuit`
/// keyword, so one call reports every broken definition.
pub fn parse_program_with_spans(
    tokens: &[(Token, Range<usize>)],
    file_id: u16,
) -> Result<Program, Vec<ParseError>> {
    let mut stream = TokenStream::new(tokens, file_id);
    decl::parse_program(&mut stream)
}
