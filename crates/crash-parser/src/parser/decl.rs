//! `circuit` definitions and body statements.

use super::{ParseError, TokenStream, expr};
use crash_ast::{Definition, Ident, Program, Stmt};
use crash_lexer::Token;

pub(super) fn parse_program(stream: &mut TokenStream) -> Result<Program, Vec<ParseError>> {
    let mut definitions = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        let before = stream.current_pos();
        match parse_definition(stream) {
            Ok(def) => definitions.push(def),
            Err(e) => {
                errors.push(e);
                // A stray token before any `circuit` would otherwise stall recovery.
                if stream.current_pos() == before {
                    stream.advance();
                }
                stream.synchronize();
            }
        }
    }

    if errors.is_empty() {
        Ok(Program { definitions })
    } else {
        Err(errors)
    }
}

/// `circuit name(a, b) -> y { ... }` or `-> (q, nq)`
fn parse_definition(stream: &mut TokenStream) -> Result<Definition, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Circuit)?;
    let (name, name_span) = stream.expect_ident("as circuit name")?;

    stream.expect(Token::LParen)?;
    let params = parse_ident_list(stream, Token::RParen, "in parameter list")?;
    stream.expect(Token::RParen)?;

    stream.expect(Token::Arrow)?;
    let outputs = if stream.eat(&Token::LParen) {
        let outputs = parse_ident_list(stream, Token::RParen, "in output list")?;
        stream.expect(Token::RParen)?;
        outputs
    } else {
        let (output, span) = stream.expect_ident("as output name")?;
        vec![Ident::new(output, span)]
    };
    if outputs.is_empty() {
        return Err(ParseError::invalid_syntax(
            format!("circuit '{}' must declare at least one output", name),
            stream.span_from(start),
        ));
    }

    stream.expect(Token::LBrace)?;
    let mut body = Vec::new();
    while !stream.check(&Token::RBrace) {
        if stream.at_end() {
            return Err(ParseError::expected_token(
                Token::RBrace,
                None,
                stream.current_span(),
            ));
        }
        body.push(parse_stmt(stream)?);
        stream.eat(&Token::Semicolon);
    }
    stream.expect(Token::RBrace)?;

    Ok(Definition {
        name: Ident::new(name, name_span),
        params,
        outputs,
        body,
        span: stream.span_from(start),
    })
}

/// Comma separated identifiers up to (not including) `close`. A trailing
/// comma is accepted.
fn parse_ident_list(
    stream: &mut TokenStream,
    close: Token,
    context: &str,
) -> Result<Vec<Ident>, ParseError> {
    let mut idents = Vec::new();
    while !stream.check(&close) {
        let (name, span) = stream.expect_ident(context)?;
        idents.push(Ident::new(name, span));
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    Ok(idents)
}

/// Assignment when the statement starts with `ident =` or `ident ,`,
/// otherwise a bare expression.
fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let is_assign = matches!(stream.peek(), Some(Token::Ident(_)))
        && matches!(stream.peek_nth(1), Some(Token::Assign) | Some(Token::Comma));
    if !is_assign {
        return Ok(Stmt::Expr(expr::parse_expr(stream)?));
    }

    let start = stream.current_pos();
    let mut targets = Vec::new();
    loop {
        let (name, span) = stream.expect_ident("as assignment target")?;
        targets.push(Ident::new(name, span));
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::Assign)?;
    let value = expr::parse_expr(stream)?;

    if targets.len() > 1 && !value.is_call() {
        return Err(ParseError::invalid_syntax(
            "assigning to several targets requires a circuit call on the right-hand side",
            value.span,
        ));
    }

    Ok(Stmt::Assign {
        targets,
        value,
        span: stream.span_from(start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crash_ast::ExprKind;
    use std::ops::Range;

    fn parse(source: &[Token]) -> Result<Program, Vec<ParseError>> {
        let tokens: Vec<(Token, Range<usize>)> = source
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i..i + 1))
            .collect();
        let mut stream = TokenStream::new(&tokens, 0);
        parse_program(&mut stream)
    }

    fn ident(name: &str) -> Token {
        Token::Ident(name.to_string())
    }

    #[test]
    fn test_tuple_outputs_and_assignment() {
        // circuit f(a) -> (x, y) { x, y = g(a) }
        let program = parse(&[
            Token::Circuit,
            ident("f"),
            Token::LParen,
            ident("a"),
            Token::RParen,
            Token::Arrow,
            Token::LParen,
            ident("x"),
            Token::Comma,
            ident("y"),
            Token::RParen,
            Token::LBrace,
            ident("x"),
            Token::Comma,
            ident("y"),
            Token::Assign,
            ident("g"),
            Token::LParen,
            ident("a"),
            Token::RParen,
            Token::RBrace,
        ])
        .unwrap();

        let def = &program.definitions[0];
        assert_eq!(def.outputs.len(), 2);
        match &def.body[0] {
            Stmt::Assign { targets, value, .. } => {
                assert_eq!(targets.len(), 2);
                assert!(matches!(value.kind, ExprKind::Call { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_tuple_assignment_from_non_call_is_rejected() {
        // circuit f() -> x { x, y = 1 }
        let errors = parse(&[
            Token::Circuit,
            ident("f"),
            Token::LParen,
            Token::RParen,
            Token::Arrow,
            ident("x"),
            Token::LBrace,
            ident("x"),
            Token::Comma,
            ident("y"),
            Token::Assign,
            Token::Int(1),
            Token::RBrace,
        ])
        .unwrap_err();
        assert_eq!(errors[0].kind, super::super::ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_recovery_reports_each_broken_definition() {
        // circuit a( circuit b() -> ) circuit c() -> z { }
        let errors = parse(&[
            Token::Circuit,
            ident("a"),
            Token::LParen,
            Token::Circuit,
            ident("b"),
            Token::LParen,
            Token::RParen,
            Token::Arrow,
            Token::RParen,
            Token::Circuit,
            ident("c"),
            Token::LParen,
            Token::RParen,
            Token::Arrow,
            ident("z"),
            Token::LBrace,
            Token::RBrace,
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unclosed_body_is_eof_error() {
        let errors = parse(&[
            Token::Circuit,
            ident("f"),
            Token::LParen,
            Token::RParen,
            Token::Arrow,
            ident("y"),
            Token::LBrace,
            ident("y"),
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, super::super::ParseErrorKind::UnexpectedEof);
    }
}
