//! Operators of the expression language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators.
///
/// All operands and results are integers; comparisons produce `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `|` bitwise or
    Or,
    /// `^` bitwise xor
    Xor,
    /// `&` bitwise and
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `!` logical not: zero becomes one, anything else becomes zero
    Not,
    /// `-` arithmetic negation
    Neg,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
        }
    }

    /// Apply the operator. Arithmetic wraps on overflow.
    pub fn apply(self, left: i64, right: i64) -> i64 {
        match self {
            BinaryOp::Or => left | right,
            BinaryOp::Xor => left ^ right,
            BinaryOp::And => left & right,
            BinaryOp::Eq => i64::from(left == right),
            BinaryOp::Ne => i64::from(left != right),
            BinaryOp::Lt => i64::from(left < right),
            BinaryOp::Le => i64::from(left <= right),
            BinaryOp::Gt => i64::from(left > right),
            BinaryOp::Ge => i64::from(left >= right),
            BinaryOp::Add => left.wrapping_add(right),
            BinaryOp::Sub => left.wrapping_sub(right),
            BinaryOp::Mul => left.wrapping_mul(right),
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }

    pub fn apply(self, operand: i64) -> i64 {
        match self {
            UnaryOp::Not => i64::from(operand == 0),
            UnaryOp::Neg => operand.wrapping_neg(),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
