//! Source location tracking for diagnostics.
//!
//! - `Span`: byte range inside one source file
//! - `SourceMap`: every file of a compilation, with line/column lookup
//! - `SourceFile`: one file and its line index
//!
//! # Examples
//!
//! ```
//! # use crash_ast::foundation::span::*;
//! # use std::path::PathBuf;
//! let mut map = SourceMap::new();
//! let file_id = map.add_file(PathBuf::from("gates.crash"), "circuit x() -> y {\n}".to_string());
//! let span = Span::new(file_id, 0, 7);
//!
//! assert_eq!(map.snippet(&span), "circuit");
//! assert_eq!(map.line_col(&span), (1, 1));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Byte range inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Index into `SourceMap` files
    pub file_id: u16,
    /// Byte offset of the first character
    pub start: u32,
    /// Byte offset one past the last character
    pub end: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }
}

/// All source files taking part in one compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// One source file with its line index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    /// Byte offset of every line start, followed by an EOF sentinel.
    pub line_starts: Vec<u32>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    pub fn file(&self, span: &Span) -> &SourceFile {
        &self.files[span.file_id as usize]
    }

    pub fn file_path(&self, span: &Span) -> &Path {
        &self.file(span).path
    }

    pub fn snippet(&self, span: &Span) -> &str {
        &self.file(span).source[span.start as usize..span.end as usize]
    }

    /// 1-based (line, column) of the span start.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        self.file(span).line_col(span.start)
    }
}

impl SourceFile {
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// 1-based (line, column) for a byte offset.
    ///
    /// # Panics
    /// Panics if `offset` lies past the end of the file.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        assert!(
            offset <= self.source.len() as u32,
            "offset {} is beyond EOF (len = {})",
            offset,
            self.source.len()
        );

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        let line_idx = line_idx.min(self.line_count().saturating_sub(1));

        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line as usize - 1] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(source: &str) -> SourceFile {
        SourceFile::new(PathBuf::from("test.crash"), source.to_string())
    }

    #[test]
    fn test_line_starts_with_and_without_trailing_newline() {
        assert_eq!(compute_line_starts("ab\ncd"), vec![0, 3, 5]);
        assert_eq!(compute_line_starts("ab\ncd\n"), vec![0, 3, 6]);
    }

    #[test]
    fn test_line_col_and_text() {
        let f = file("circuit a() -> y {\n  y = 1\n}\n");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(21), (2, 3));
        assert_eq!(f.line_text(2), Some("  y = 1"));
        assert_eq!(f.line_text(4), None);
        assert_eq!(f.line_count(), 3);
    }

    #[test]
    fn test_line_col_at_eof() {
        let f = file("x\ny");
        assert_eq!(f.line_col(3), (2, 2));
    }
}
