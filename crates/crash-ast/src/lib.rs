// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Syntax tree for the crash circuit language.
//!
//! This crate holds the untyped tree produced by `crash-parser` together
//! with the foundation types (spans, source maps, operators) shared by the
//! parser, the resolver and the runtime.

pub mod ast;
pub mod foundation;

pub use foundation::{BinaryOp, SourceFile, SourceMap, Span, UnaryOp};

pub use ast::*;
