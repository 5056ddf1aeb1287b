//! File-level commands: `check`, `compile` and `analyze`.
//!
//! Each returns the text to print so the binary stays a thin dispatcher.

use anyhow::{Context, Result, bail};
use crash_resolve::{Compilation, compile_file};
use crash_runtime::Registry;
use std::fmt::Write;
use std::path::Path;
use tracing::warn;

/// Compile `path`, failing with rendered diagnostics on any error.
pub fn load(path: &Path) -> Result<Compilation> {
    let result =
        compile_file(path).with_context(|| format!("failed to read {}", path.display()))?;

    if result.has_errors() {
        bail!("{}", result.format_diagnostics());
    }
    if !result.diagnostics.is_empty() {
        warn!("warnings in {}:\n{}", path.display(), result.format_diagnostics());
    }

    result
        .compilation
        .with_context(|| format!("no compilation produced for {}", path.display()))
}

/// Compile `path` and register its circuits.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let compilation = load(path)?;
    Ok(Registry::build(compilation.unit)?)
}

/// One line per circuit with its signature and statefulness.
pub fn check(path: &Path) -> Result<String> {
    let compilation = load(path)?;
    let mut out = String::new();
    for summary in compilation.analysis.definitions.values() {
        writeln!(
            out,
            "{}({}) -> ({}){}",
            summary.name,
            summary.params.join(", "),
            summary.outputs.join(", "),
            if summary.stateful { "  [stateful]" } else { "" }
        )?;
    }
    let stateful = compilation
        .analysis
        .definitions
        .values()
        .filter(|s| s.stateful)
        .count();
    write!(
        out,
        "ok: {} circuit(s), {} stateful",
        compilation.analysis.definitions.len(),
        stateful
    )?;
    Ok(out)
}

/// Rewritten definitions as pseudo-source, followed by the circuit names.
pub fn compile(path: &Path) -> Result<String> {
    let compilation = load(path)?;
    let unit = &compilation.unit;
    let mut out = String::new();
    for def in &unit.definitions {
        writeln!(out, "{}\n", unit.listing(def))?;
    }
    let names: Vec<_> = unit.definitions.iter().map(|d| d.name.as_str()).collect();
    write!(out, "circuits: {}", names.join(", "))?;
    Ok(out)
}

/// The analysis table as pretty JSON.
pub fn analyze(path: &Path) -> Result<String> {
    let compilation = load(path)?;
    Ok(serde_json::to_string_pretty(&compilation.analysis)?)
}
