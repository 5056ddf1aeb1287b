//! Untyped syntax tree.
//!
//! The parser produces a [`Program`]: an ordered list of circuit
//! [`Definition`]s. Names are still plain strings at this stage; the
//! resolver maps them to definition and local indices.

pub mod walk;

use crate::foundation::{BinaryOp, Span, UnaryOp};
use serde::{Deserialize, Serialize};

/// A parsed source unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

/// An identifier together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// `circuit name(params) -> outputs { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: Ident,
    /// Formal parameters in declaration order.
    pub params: Vec<Ident>,
    /// Declared output names. Their order is the shape of the return tuple.
    pub outputs: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Definition {
    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

/// Body statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `x = expr` or `a, b = call(...)`
    Assign {
        targets: Vec<Ident>,
        value: Expr,
        span: Span,
    },
    /// Bare expression, evaluated for its reads and calls.
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. } => *span,
            Stmt::Expr(expr) => expr.span,
        }
    }

    /// The expression evaluated by this statement.
    pub fn value(&self) -> &Expr {
        match self {
            Stmt::Assign { value, .. } => value,
            Stmt::Expr(expr) => expr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal; `true`/`false` are parsed as `1`/`0`.
    Literal(i64),
    /// Read of a parameter, local or state variable.
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of another circuit by name.
    Call { callee: Ident, args: Vec<Expr> },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }
}
