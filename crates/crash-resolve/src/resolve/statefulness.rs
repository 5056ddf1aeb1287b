//! Statefulness resolution and dependency slot allocation.
//!
//! Definitions are visited callees first. A definition is stateful when it
//! has own state variables or calls at least one stateful definition. Each
//! call site whose callee is stateful gets its own slot; slot ids come from
//! one counter shared by the whole program, so two call sites never share a
//! slot even when they call the same circuit.

use super::analysis::Analysis;
use super::graph::Cycle;
use crate::error::{CompileError, ErrorKind};
use crate::ir::SlotId;
use serde::Serialize;

/// State slot for one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepSlot {
    pub id: SlotId,
    /// `_<callee>_<id>`
    pub name: String,
    pub callee: String,
    /// Position of the call in the caller's call-site list
    pub call_index: usize,
}

/// Fill in `stateful` and `dep_state` for every definition.
///
/// Returns definition names in the order they were resolved, callees
/// before callers. Unknown callees and call cycles fail before any
/// definition is marked.
pub fn resolve_statefulness(analysis: &mut Analysis) -> Result<Vec<String>, Vec<CompileError>> {
    let unknown = unknown_callee_errors(analysis);
    if !unknown.is_empty() {
        return Err(unknown);
    }

    let order: Vec<String> = analysis
        .graph
        .callee_first_order()
        .map_err(|cycle| vec![cycle_error(analysis, &cycle)])?
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut next_slot = 0u32;
    for name in &order {
        let Some(summary) = analysis.definitions.get(name) else {
            continue;
        };

        let mut dep_state = Vec::new();
        for (call_index, call) in summary.calls.iter().enumerate() {
            let callee_stateful = analysis
                .definitions
                .get(&call.callee)
                .is_some_and(|callee| callee.stateful);
            if callee_stateful {
                let id = SlotId(next_slot);
                next_slot += 1;
                dep_state.push(DepSlot {
                    id,
                    name: format!("_{}_{}", call.callee, id.0),
                    callee: call.callee.clone(),
                    call_index,
                });
            }
        }

        if let Some(summary) = analysis.definitions.get_mut(name) {
            summary.stateful = summary.has_own_state() || !dep_state.is_empty();
            tracing::debug!(
                circuit = %name,
                stateful = summary.stateful,
                slots = dep_state.len(),
                "resolved statefulness"
            );
            summary.dep_state = dep_state;
        }
    }

    Ok(order)
}

fn unknown_callee_errors(analysis: &Analysis) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for summary in analysis.definitions.values() {
        for call in &summary.calls {
            if !analysis.graph.contains(&call.callee) {
                errors.push(
                    CompileError::new(
                        ErrorKind::UndefinedName,
                        call.span,
                        format!(
                            "'{}' calls unknown circuit '{}'",
                            summary.name, call.callee
                        ),
                    )
                    .with_note(format!("no circuit named '{}' is defined", call.callee)),
                );
            }
        }
    }
    errors
}

/// Points at the call sites that close the loop, one label per step.
fn cycle_error(analysis: &Analysis, cycle: &Cycle) -> CompileError {
    let steps: Vec<_> = cycle
        .path
        .windows(2)
        .filter_map(|pair| {
            let caller = analysis.get(&pair[0])?;
            let call = caller.calls.iter().find(|c| c.callee == pair[1])?;
            Some((call.span, &pair[0], &pair[1]))
        })
        .collect();

    let primary = steps
        .first()
        .map(|(span, _, _)| *span)
        .or_else(|| {
            cycle
                .path
                .first()
                .and_then(|name| analysis.get(name))
                .map(|summary| summary.span)
        })
        .unwrap_or_default();

    let mut error = CompileError::new(
        ErrorKind::CyclicDependency,
        primary,
        format!("circuits call each other in a loop: {}", cycle.describe()),
    );
    for (span, caller, callee) in steps {
        error = error.with_label(span, format!("'{}' calls '{}' here", caller, callee));
    }
    error.with_note(
        "a circuit may not call itself, directly or through other circuits".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::analysis::analyze;
    use crash_lexer::tokenize;
    use crash_parser::parse_program_with_spans;

    fn resolve(source: &str) -> Result<Analysis, Vec<CompileError>> {
        let program = parse_program_with_spans(&tokenize(source).tokens, 0).unwrap();
        let mut analysis = analyze(&program)?;
        resolve_statefulness(&mut analysis)?;
        Ok(analysis)
    }

    fn stateful(analysis: &Analysis, name: &str) -> bool {
        analysis.get(name).unwrap().stateful
    }

    #[test]
    fn test_pure_definitions_stay_pure() {
        let analysis = resolve(
            "circuit and_gate(a, b) -> y { y = a & b } \
             circuit nand(a, b) -> y { y = !and_gate(a, b) }",
        )
        .unwrap();
        assert!(!stateful(&analysis, "and_gate"));
        assert!(!stateful(&analysis, "nand"));
        assert!(analysis.get("nand").unwrap().dep_state.is_empty());
    }

    #[test]
    fn test_statefulness_propagates_through_four_levels() {
        // Declared top-down so ordering has to do the work.
        let analysis = resolve(
            "circuit d4(x) -> y { y = d3(x) } \
             circuit d3(x) -> y { y = d2(x) } \
             circuit d2(x) -> y { y = d1(x) } \
             circuit d1(x) -> y { y = x ^ mem; mem = x } \
             circuit pure(x) -> y { y = x }",
        )
        .unwrap();
        for name in ["d1", "d2", "d3", "d4"] {
            assert!(stateful(&analysis, name), "{} should be stateful", name);
        }
        assert!(!stateful(&analysis, "pure"));
        for name in ["d2", "d3", "d4"] {
            let summary = analysis.get(name).unwrap();
            assert_eq!(summary.dep_state.len(), 1);
            assert!(summary.state.is_empty());
        }
    }

    #[test]
    fn test_slots_follow_call_site_order() {
        let analysis = resolve(
            "circuit mem(x) -> y { y = old; old = x } \
             circuit pure(x) -> y { y = x } \
             circuit top(a) -> y { y = mem(pure(a)) & pure(mem(a)) | mem(a) }",
        )
        .unwrap();
        let top = analysis.get("top").unwrap();
        // call sites: mem, pure, pure, mem, mem
        let indices: Vec<_> = top.dep_state.iter().map(|s| s.call_index).collect();
        assert_eq!(indices, vec![0, 3, 4]);
        assert!(top.dep_state.iter().all(|s| s.callee == "mem"));
        assert!(top.dep_state.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_slot_ids_are_globally_unique() {
        let analysis = resolve(
            "circuit mem(x) -> y { y = old; old = x } \
             circuit a(x) -> y { y = mem(x) & mem(x) } \
             circuit b(x) -> y { y = mem(x) | a(x) }",
        )
        .unwrap();
        let mut ids: Vec<_> = analysis
            .definitions
            .values()
            .flat_map(|s| s.dep_state.iter().map(|slot| slot.id))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, 4);

        let names: Vec<_> = analysis.get("a").unwrap().dep_state.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["_mem_0", "_mem_1"]);
    }

    #[test]
    fn test_self_call_is_rejected() {
        let errors = resolve("circuit f(x) -> y { y = f(x) }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::CyclicDependency);
        assert!(errors[0].message.ends_with("f → f"));
    }

    #[test]
    fn test_indirect_self_call_is_rejected() {
        let errors = resolve(
            "circuit a(x) -> y { y = b(x) } \
             circuit b(x) -> y { y = a(x) }",
        )
        .unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::CyclicDependency);
        assert!(errors[0].message.ends_with("a → b → a"));
        assert_eq!(errors[0].labels.len(), 2);
        assert_eq!(errors[0].labels[1].message, "'b' calls 'a' here");
    }

    #[test]
    fn test_unknown_callee_is_reported_at_call_site() {
        let source = "circuit f(a) -> y { y = ghost(a) }";
        let errors = resolve(source).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::UndefinedName);
        let span = errors[0].span;
        assert_eq!(&source[span.start as usize..span.end as usize], "ghost");
    }
}
