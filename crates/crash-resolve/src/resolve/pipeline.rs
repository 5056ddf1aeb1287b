//! Compile pipeline.
//!
//! ```text
//! source → tokenize → parse → analyze → resolve_statefulness → rewrite
//! ```
//!
//! Each stage stops the pipeline when it reports errors. Warnings are
//! collected alongside a successful compilation.

use super::analysis::{Analysis, analyze, unused_assignments};
use super::rewrite::rewrite_program;
use super::statefulness::resolve_statefulness;
use crate::error::{CompileError, DiagnosticFormatter, ErrorKind};
use crate::ir::CompiledUnit;
use crash_ast::{Program, SourceMap, Span};
use crash_lexer::tokenize;
use crash_parser::parse_program_with_spans;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: Program,
    pub analysis: Analysis,
    /// Definition names callees first
    pub order: Vec<String>,
    pub unit: CompiledUnit,
}

/// Compilation outcome together with the sources its diagnostics refer to.
#[derive(Debug)]
pub struct CompileResult {
    pub sources: SourceMap,
    pub compilation: Option<Compilation>,
    /// Errors and warnings in the order they were found
    pub diagnostics: Vec<CompileError>,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(CompileError::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompileError> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CompileError> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Every diagnostic rendered with source snippets.
    pub fn format_diagnostics(&self) -> String {
        DiagnosticFormatter::new(&self.sources).format_all(&self.diagnostics)
    }
}

/// Run the resolution passes on a parsed program.
pub fn compile(program: Program) -> Result<Compilation, Vec<CompileError>> {
    let mut analysis = analyze(&program)?;
    let order = resolve_statefulness(&mut analysis)?;
    let unit = rewrite_program(&program, &analysis)?;
    Ok(Compilation {
        program,
        analysis,
        order,
        unit,
    })
}

/// Compile one source text registered under `path`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn compile_source(path: impl AsRef<Path>, source: impl Into<String>) -> CompileResult {
    let mut sources = SourceMap::new();
    let source = source.into();
    let file_id = sources.add_file(PathBuf::from(path.as_ref()), source.clone());

    let lexed = tokenize(&source);
    if !lexed.errors.is_empty() {
        let diagnostics = lexed
            .errors
            .iter()
            .map(|range| {
                let span = Span::new(file_id, range.start as u32, range.end as u32);
                CompileError::new(
                    ErrorKind::Syntax,
                    span,
                    format!("unrecognized input `{}`", &source[range.clone()]),
                )
            })
            .collect();
        return failed(sources, diagnostics);
    }
    tracing::trace!(tokens = lexed.tokens.len(), "lexed");

    let program = match parse_program_with_spans(&lexed.tokens, file_id) {
        Ok(program) => program,
        Err(errors) => {
            return failed(sources, errors.into_iter().map(CompileError::from).collect());
        }
    };
    tracing::debug!(definitions = program.definitions.len(), "parsed");

    let mut diagnostics = Vec::new();
    let compilation = match compile(program) {
        Ok(compilation) => {
            diagnostics.extend(unused_assignments(&compilation.program, &compilation.analysis));
            compilation
        }
        Err(errors) => return failed(sources, errors),
    };

    tracing::info!(
        definitions = compilation.unit.len(),
        stateful = compilation
            .unit
            .definitions
            .iter()
            .filter(|d| d.is_stateful())
            .count(),
        warnings = diagnostics.len(),
        "compiled"
    );

    CompileResult {
        sources,
        compilation: Some(compilation),
        diagnostics,
    }
}

/// Read and compile a `.crash` file.
pub fn compile_file(path: &Path) -> std::io::Result<CompileResult> {
    let source = std::fs::read_to_string(path)?;
    Ok(compile_source(path, source))
}

fn failed(sources: SourceMap, diagnostics: Vec<CompileError>) -> CompileResult {
    tracing::debug!(errors = diagnostics.len(), "compilation failed");
    CompileResult {
        sources,
        compilation: None,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GATES: &str = "\
# gates
circuit and_gate(a, b) -> y { y = a & b }
circuit nand(a, b) -> y { y = !and_gate(a, b) }
circuit sr_latch(s, r) -> (q, nq) {
    q = !(r | nq);
    nq = !(s | q)
}
";

    #[test]
    fn test_compiles_gates() {
        let result = compile_source("gates.crash", GATES);
        assert!(!result.has_errors(), "{}", result.format_diagnostics());
        let compilation = result.compilation.unwrap();
        assert_eq!(compilation.order, vec!["and_gate", "sr_latch", "nand"]);
        assert!(compilation.unit.find("sr_latch").unwrap().is_stateful());
        assert!(!compilation.unit.find("nand").unwrap().is_stateful());
    }

    #[test]
    fn test_lex_errors_are_syntax_diagnostics() {
        let result = compile_source("bad.crash", "circuit f() -> y { y = 1 $ 2 }");
        assert!(result.has_errors());
        assert!(result.compilation.is_none());
        assert_eq!(result.diagnostics[0].kind, ErrorKind::Syntax);
        assert!(result.diagnostics[0].message.contains('$'));
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let depth = 500;
        let source = format!(
            "circuit f(a) -> y {{ y = {}a{} }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let result = compile_source("deep.crash", source);
        assert!(result.compilation.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, ErrorKind::Syntax);
        assert!(result.diagnostics[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_cycle_diagnostic_renders_with_snippet() {
        let result = compile_source(
            "loop.crash",
            "circuit a(x) -> y { y = b(x) }\ncircuit b(x) -> y { y = a(x) }\n",
        );
        let text = result.format_diagnostics();
        assert!(text.starts_with("error: cyclic dependency: circuits call each other in a loop: a → b → a"));
        assert!(text.contains("--> loop.crash:1:25"));
        assert!(text.contains("'b' calls 'a' here"));
    }

    #[test]
    fn test_warnings_do_not_fail_compilation() {
        let result = compile_source("w.crash", "circuit f(a) -> y { t = a; y = a }");
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
        assert!(result.compilation.is_some());
    }

    #[test]
    fn test_compile_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GATES.as_bytes()).unwrap();
        let result = compile_file(file.path()).unwrap();
        assert!(!result.has_errors());
        assert_eq!(result.compilation.unwrap().unit.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(compile_file(&dir.path().join("absent.crash")).is_err());
    }
}
