//! Expression tree walking.
//!
//! A single pre-order traversal shared by the analysis passes. The visitor
//! is a closure that owns whatever it accumulates.
//!
//! ```rust,ignore
//! let mut calls = 0;
//! walk_expr(&expr, &mut |node| {
//!     if node.is_call() {
//!         calls += 1;
//!     }
//! });
//! ```

use super::{Expr, ExprKind, Stmt};

/// Visit `expr` and then its children left to right.
///
/// A call node is visited before its arguments, so nested calls are seen
/// in source encounter order: `f(g(x), h(y))` yields `f`, `g`, `h`.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) => {}
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
    }
}

/// Walk the expression of every statement in order.
pub fn walk_body<V>(body: &[Stmt], visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for stmt in body {
        walk_expr(stmt.value(), visitor);
    }
}
