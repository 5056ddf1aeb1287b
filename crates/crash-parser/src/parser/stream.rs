//! Token stream wrapper for the hand-written parser.

use crash_ast::Span;
use crash_lexer::Token;
use std::ops::Range;

/// Deepest expression nesting accepted before parsing fails.
pub const MAX_NESTING: usize = 128;

/// Token stream with lookahead and span tracking.
///
/// Each token carries its byte range in the source so spans built from
/// stream positions point at real source text.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    file_id: u16,
    depth: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)], file_id: u16) -> Self {
        Self {
            tokens,
            pos: 0,
            file_id,
            depth: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Consume the current token and return it.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Same variant as `expected`, ignoring payloads.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume `token` if it is next. Returns whether it was consumed.
    pub fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let start = self.pos;
            self.advance();
            Ok(self.span_from(start))
        } else {
            Err(super::ParseError::expected_token(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    /// Consume an identifier and return its name and span.
    pub fn expect_ident(&mut self, context: &str) -> Result<(String, Span), super::ParseError> {
        let span = self.current_span();
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok((name, span))
            }
            other => Err(super::ParseError::unexpected_token(other, context, span)),
        }
    }

    /// Enter one level of expression nesting. Fails past [`MAX_NESTING`].
    pub fn enter_nesting(&mut self) -> Result<(), super::ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(super::ParseError::invalid_syntax(
                "expression nested too deeply",
                self.current_span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the token at `start` to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let start_byte = self
            .tokens
            .get(start)
            .map(|(_, range)| range.start)
            .unwrap_or_else(|| self.eof_offset());
        let end_byte = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, range)) if self.pos > start => range.end,
            _ => start_byte,
        };
        Span::new(self.file_id, start_byte as u32, end_byte as u32)
    }

    /// Span of the current token, or an empty span at end of input.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, range)) => Span::new(self.file_id, range.start as u32, range.end as u32),
            None => {
                let eof = self.eof_offset() as u32;
                Span::new(self.file_id, eof, eof)
            }
        }
    }

    /// Skip ahead to the next `circuit` keyword for error recovery.
    pub fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            if matches!(token, Token::Circuit) {
                break;
            }
            self.pos += 1;
        }
    }

    fn eof_offset(&self) -> usize {
        self.tokens.last().map_or(0, |(_, range)| range.end)
    }
}
