// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the crash circuit language.
//!
//! Whitespace and comments (`# ...` and `// ...`) are skipped by logos and
//! never reach the parser.
//!
//! ```
//! # use crash_lexer::Token;
//! # use logos::Logos;
//! let tokens: Vec<_> = Token::lexer("y = !a").collect();
//! assert_eq!(tokens.len(), 4);
//! ```

use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    /// Keyword `circuit`
    #[token("circuit")]
    Circuit,
    /// Keyword `true`
    #[token("true")]
    True,
    /// Keyword `false`
    #[token("false")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    /// Decimal integer literal. Literals that overflow `i64` fail to lex.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("->")]
    Arrow,
    #[token("=")]
    Assign,

    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("!")]
    Bang,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Ident(name) => return write!(f, "identifier `{}`", name),
            Token::Int(value) => return write!(f, "integer `{}`", value),
            Token::Circuit => "circuit",
            Token::True => "true",
            Token::False => "false",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Arrow => "->",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Amp => "&",
            Token::Bang => "!",
        };
        write!(f, "`{}`", text)
    }
}

/// Tokens paired with their byte ranges, plus the ranges that failed to lex.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<(Token, Range<usize>)>,
    pub errors: Vec<Range<usize>>,
}

/// Tokenize a whole source file, collecting every invalid range instead of
/// stopping at the first one.
pub fn tokenize(source: &str) -> Lexed {
    let mut lexed = Lexed::default();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => lexed.tokens.push((token, lexer.span())),
            Err(()) => lexed.errors.push(lexer.span()),
        }
    }
    lexed
}
