//! Foundation types shared by every compiler stage.

pub mod ops;
pub mod span;

pub use ops::{BinaryOp, UnaryOp};
pub use span::{SourceFile, SourceMap, Span};
