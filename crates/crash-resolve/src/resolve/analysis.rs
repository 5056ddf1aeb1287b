//! Dependency analysis.
//!
//! One pre-order walk per definition collects:
//!
//! - **own state variables**: every name read that is not a parameter. A
//!   temporary that is assigned before it is read still counts; the walk
//!   does not track ordering within the body.
//! - **call sites**: one entry per call expression, outer call before the
//!   calls in its arguments, statements in order.
//! - **assigned names**: in first-assignment order, for local layout and
//!   output checks.
//!
//! Calls also add `caller → callee` edges to the [`DependencyGraph`].
//! Unknown callees are left in the graph and reported by the statefulness
//! pass when it orders the graph.

use super::graph::DependencyGraph;
use super::statefulness::DepSlot;
use crate::error::{CompileError, ErrorKind};
use crash_ast::walk::walk_body;
use crash_ast::{Definition, ExprKind, Ident, Program, Span, Stmt};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub callee: String,
    pub span: Span,
}

/// Everything the later passes need to know about one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionSummary {
    pub name: String,
    pub params: Vec<String>,
    pub outputs: Vec<String>,
    /// Own state variables, sorted by name
    pub state: BTreeSet<String>,
    pub assigned: IndexSet<String>,
    pub calls: Vec<CallSite>,
    /// Set by the statefulness pass.
    pub stateful: bool,
    /// Set by the statefulness pass: one slot per call site whose callee is
    /// stateful, in call-site order.
    pub dep_state: Vec<DepSlot>,
    pub span: Span,
}

impl DefinitionSummary {
    pub fn has_own_state(&self) -> bool {
        !self.state.is_empty()
    }
}

/// Analysis table for a whole program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// Summaries in declaration order
    pub definitions: IndexMap<String, DefinitionSummary>,
    pub graph: DependencyGraph,
}

impl Analysis {
    pub fn get(&self, name: &str) -> Option<&DefinitionSummary> {
        self.definitions.get(name)
    }
}

/// Summarize every definition and build the call graph.
///
/// Fails on duplicate circuit, parameter or output names.
pub fn analyze(program: &Program) -> Result<Analysis, Vec<CompileError>> {
    let mut errors = Vec::new();
    let mut analysis = Analysis::default();
    let mut first_seen: IndexMap<&str, Span> = IndexMap::new();

    for def in &program.definitions {
        if let Some(first) = first_seen.get(def.name.name.as_str()) {
            errors.push(
                CompileError::new(
                    ErrorKind::DuplicateName,
                    def.name.span,
                    format!("circuit '{}' is defined more than once", def.name.name),
                )
                .with_label(*first, "first defined here".to_string()),
            );
            continue;
        }
        first_seen.insert(&def.name.name, def.name.span);

        check_unique(&def.params, "parameter", &def.name.name, &mut errors);
        check_unique(&def.outputs, "output", &def.name.name, &mut errors);

        let summary = summarize(def);
        analysis.graph.add_node(&summary.name);
        for call in &summary.calls {
            analysis.graph.add_edge(&summary.name, &call.callee);
        }
        tracing::trace!(
            circuit = %summary.name,
            state = summary.state.len(),
            calls = summary.calls.len(),
            "analyzed definition"
        );
        analysis.definitions.insert(summary.name.clone(), summary);
    }

    if errors.is_empty() {
        Ok(analysis)
    } else {
        Err(errors)
    }
}

fn check_unique(idents: &[Ident], what: &str, circuit: &str, errors: &mut Vec<CompileError>) {
    let mut seen: IndexMap<&str, Span> = IndexMap::new();
    for ident in idents {
        match seen.get(ident.name.as_str()) {
            Some(first) => errors.push(
                CompileError::new(
                    ErrorKind::DuplicateName,
                    ident.span,
                    format!("{} '{}' of circuit '{}' is declared twice", what, ident.name, circuit),
                )
                .with_label(*first, "first declared here".to_string()),
            ),
            None => {
                seen.insert(&ident.name, ident.span);
            }
        }
    }
}

/// Walk one definition body.
pub fn summarize(def: &Definition) -> DefinitionSummary {
    let mut state = BTreeSet::new();
    let mut calls = Vec::new();
    walk_body(&def.body, &mut |expr| match &expr.kind {
        ExprKind::Name(name) if !def.is_param(name) => {
            state.insert(name.clone());
        }
        ExprKind::Call { callee, .. } => calls.push(CallSite {
            callee: callee.name.clone(),
            span: callee.span,
        }),
        _ => {}
    });

    let mut assigned = IndexSet::new();
    for stmt in &def.body {
        if let Stmt::Assign { targets, .. } = stmt {
            for target in targets {
                assigned.insert(target.name.clone());
            }
        }
    }

    DefinitionSummary {
        name: def.name.name.clone(),
        params: def.params.iter().map(|p| p.name.clone()).collect(),
        outputs: def.outputs.iter().map(|o| o.name.clone()).collect(),
        state,
        assigned,
        calls,
        stateful: false,
        dep_state: Vec::new(),
        span: def.span,
    }
}

/// Warnings for assigned locals that are never read and are not outputs.
pub fn unused_assignments(program: &Program, analysis: &Analysis) -> Vec<CompileError> {
    let mut warnings = Vec::new();
    for def in &program.definitions {
        let Some(summary) = analysis.get(&def.name.name) else {
            continue;
        };
        let mut reported = IndexSet::new();
        for stmt in &def.body {
            let Stmt::Assign { targets, .. } = stmt else {
                continue;
            };
            for target in targets {
                let name = target.name.as_str();
                let used = summary.state.contains(name)
                    || summary.outputs.iter().any(|o| o == name)
                    || def.is_param(name);
                if !used && reported.insert(name) {
                    warnings.push(CompileError::warning(
                        ErrorKind::UnusedValue,
                        target.span,
                        format!("'{}' is assigned in '{}' but never used", name, summary.name),
                    ));
                }
            }
        }
    }
    warnings
}
