//! Expression parsing.
//!
//! Binary operators use precedence climbing; prefix operators bind tighter
//! than any binary operator.

use super::{ParseError, TokenStream};
use crash_ast::{BinaryOp, Expr, ExprKind, Ident, UnaryOp};
use crash_lexer::Token;

/// Precedence and operator for a binary token. Higher binds tighter; all
/// binary operators are left associative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Pipe => Some((10, BinaryOp::Or)),
        Token::Caret => Some((15, BinaryOp::Xor)),
        Token::Amp => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::Le)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::Ge)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        _ => None,
    }
}

pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_binary(stream, 0)
}

fn parse_binary(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some((prec, op)) = stream.peek().and_then(binary_op_info) {
        if prec < min_prec {
            break;
        }
        stream.advance();
        let right = parse_binary(stream, prec + 1)?;
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            stream.span_from(start),
        );
    }

    Ok(left)
}

/// Every nested expression passes through here, so this is where nesting
/// depth is bounded.
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    stream.enter_nesting()?;
    let result = parse_unary(stream);
    stream.leave_nesting();
    result
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let op = match stream.peek() {
        Some(Token::Bang) => UnaryOp::Not,
        Some(Token::Minus) => UnaryOp::Neg,
        _ => return parse_atom(stream),
    };
    let start = stream.current_pos();
    stream.advance();
    let operand = parse_prefix(stream)?;
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        stream.span_from(start),
    ))
}

/// Literals, names, calls and parenthesized expressions.
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    match stream.advance() {
        Some(Token::Int(value)) => Ok(Expr::new(ExprKind::Literal(value), span)),
        Some(Token::True) => Ok(Expr::new(ExprKind::Literal(1), span)),
        Some(Token::False) => Ok(Expr::new(ExprKind::Literal(0), span)),
        Some(Token::LParen) => {
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(Expr::new(inner.kind, stream.span_from(start)))
        }
        Some(Token::Ident(name)) => {
            if !stream.check(&Token::LParen) {
                return Ok(Expr::new(ExprKind::Name(name), span));
            }
            let args = parse_call_args(stream)?;
            Ok(Expr::new(
                ExprKind::Call {
                    callee: Ident::new(name, span),
                    args,
                },
                stream.span_from(start),
            ))
        }
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "in expression",
            span,
        )),
    }
}

fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        args.push(parse_expr(stream)?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}
