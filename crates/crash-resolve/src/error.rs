//! Compile-time diagnostics.
//!
//! - `CompileError` - one diagnostic with a primary span and optional labels
//! - `ErrorKind` - which check produced it
//! - `Severity` - error or warning
//! - `DiagnosticFormatter` - renders diagnostics with source snippets
//!
//! # Examples
//!
//! ```
//! # use crash_resolve::error::*;
//! # use crash_ast::Span;
//! let error = CompileError::new(
//!     ErrorKind::DuplicateName,
//!     Span::new(0, 8, 12),
//!     "circuit 'nand' is defined more than once".to_string(),
//! );
//! assert_eq!(error.severity, Severity::Error);
//! ```

use crash_ast::{SourceMap, Span};
use crash_parser::ParseError;
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub severity: Severity,
    /// Primary source location
    pub span: Span,
    pub message: String,
    /// Related locations, e.g. the other definitions on a cycle
    pub labels: Vec<Label>,
    /// Hints shown after the snippet
    pub notes: Vec<String>,
}

/// Category of compilation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid token or malformed construct
    Syntax,
    /// Unknown callee, or a declared output that is never given a value
    UndefinedName,
    /// Circuit, parameter or output declared twice
    DuplicateName,
    /// Call with the wrong number of arguments
    WrongArgCount,
    /// Call result does not match the number of assignment targets
    OutputMismatch,
    /// Circuits calling each other in a loop
    CyclicDependency,
    /// Assigned value that nothing reads or returns
    UnusedValue,
    /// Broken compiler invariant
    Internal,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::UndefinedName => "undefined name",
            ErrorKind::DuplicateName => "duplicate name",
            ErrorKind::WrongArgCount => "wrong argument count",
            ErrorKind::OutputMismatch => "output mismatch",
            ErrorKind::CyclicDependency => "cyclic dependency",
            ErrorKind::UnusedValue => "unused value",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Secondary labeled span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    fn with_severity(kind: ErrorKind, severity: Severity, span: Span, message: String) -> Self {
        Self {
            kind,
            severity,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::new(ErrorKind::Syntax, err.span, err.message)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Formats diagnostics with source code context.
///
/// ```text
/// error: cyclic dependency: circuits call each other in a loop: a → b → a
///   --> loop.crash:1:9
///    |
///  1 | circuit a(x) -> y { y = b(x) }
///    |         ^
///    = note: 'b' is part of the cycle
///      at loop.crash:2:9
/// ```
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    pub fn format(&self, error: &CompileError) -> String {
        let mut output = format!(
            "{}: {}: {}\n",
            error.severity,
            error.kind.name(),
            error.message
        );

        let file_path = self.sources.file_path(&error.span);
        let (line, col) = self.sources.line_col(&error.span);
        output.push_str(&format!("  --> {}:{}:{}\n", file_path.display(), line, col));

        let file = self.sources.file(&error.span);
        if let Some(source_line) = file.line_text(line) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, source_line));

            let start_col = col as usize;
            let span_len = error.span.end.saturating_sub(error.span.start) as usize;
            let end_col = (start_col + span_len).min(source_line.len() + 1);
            let underline = " ".repeat(start_col.saturating_sub(1))
                + &"^".repeat(end_col.saturating_sub(start_col).max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for label in &error.labels {
            output.push_str(&format!("   = note: {}\n", label.message));
            let (label_line, label_col) = self.sources.line_col(&label.span);
            output.push_str(&format!(
                "     at {}:{}:{}\n",
                self.sources.file_path(&label.span).display(),
                label_line,
                label_col
            ));
        }

        for note in &error.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }

        output
    }

    /// All diagnostics separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
