//! Hand-written recursive descent parser for the crash circuit language.
//!
//! Turns the token stream of `crash-lexer` into a [`crash_ast::Program`].
//! Grammar validation stops at what the resolver needs: names, parameter
//! lists, output lists and well-formed expressions.

pub mod parser;

pub use parser::{ParseError, ParseErrorKind, parse_program, parse_program_with_spans};

pub use crash_lexer::Token;
