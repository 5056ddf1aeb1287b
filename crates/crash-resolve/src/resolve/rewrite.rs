//! Lowering to the state-threading IR.
//!
//! For each definition:
//!
//! 1. lay out locals: parameters, sorted state variables, temporaries
//! 2. for a stateful definition, open the body with `Unpack`
//! 3. lower statements in order, resolving callees to [`DefId`] and giving
//!    every call to a stateful callee the next dependency slot
//! 4. for a stateful definition, `Pack` the outgoing state
//! 5. return the declared outputs, plus the state when stateful
//!
//! Statements are never reordered. A pure definition keeps its parameter
//! list and output shape.

use super::analysis::{Analysis, DefinitionSummary};
use crate::error::{CompileError, ErrorKind};
use crate::ir::{self, CompiledDef, CompiledUnit, DefId, LocalId, SlotBinding, StateLayout};
use crash_ast::{Definition, Expr, ExprKind, Program, Stmt};
use indexmap::IndexMap;

/// Lower every definition of an analyzed and resolved program.
pub fn rewrite_program(
    program: &Program,
    analysis: &Analysis,
) -> Result<CompiledUnit, Vec<CompileError>> {
    let ids: IndexMap<&str, DefId> = program
        .definitions
        .iter()
        .enumerate()
        .map(|(index, def)| (def.name.name.as_str(), DefId(index as u32)))
        .collect();

    let mut definitions = Vec::with_capacity(program.definitions.len());
    let mut errors = Vec::new();
    for (index, def) in program.definitions.iter().enumerate() {
        let Some(summary) = analysis.get(&def.name.name) else {
            errors.push(CompileError::new(
                ErrorKind::Internal,
                def.name.span,
                format!("circuit '{}' was not analyzed", def.name.name),
            ));
            continue;
        };
        let rewriter = DefRewriter::new(analysis, &ids, summary);
        match rewriter.rewrite(DefId(index as u32), def) {
            Ok(compiled) => definitions.push(compiled),
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if errors.is_empty() {
        Ok(CompiledUnit::new(definitions))
    } else {
        Err(errors)
    }
}

struct DefRewriter<'a> {
    analysis: &'a Analysis,
    ids: &'a IndexMap<&'a str, DefId>,
    summary: &'a DefinitionSummary,
    locals: IndexMap<String, LocalId>,
    /// Position in `summary.calls` of the next call encountered
    call_index: usize,
    /// Next unused entry of `summary.dep_state`
    slot_cursor: usize,
    errors: Vec<CompileError>,
}

impl<'a> DefRewriter<'a> {
    fn new(
        analysis: &'a Analysis,
        ids: &'a IndexMap<&'a str, DefId>,
        summary: &'a DefinitionSummary,
    ) -> Self {
        let mut locals = IndexMap::new();
        let names = summary
            .params
            .iter()
            .chain(summary.state.iter())
            .chain(summary.assigned.iter());
        for name in names {
            let next = LocalId(locals.len() as u32);
            locals.entry(name.clone()).or_insert(next);
        }
        Self {
            analysis,
            ids,
            summary,
            locals,
            call_index: 0,
            slot_cursor: 0,
            errors: Vec::new(),
        }
    }

    fn rewrite(mut self, id: DefId, def: &Definition) -> Result<CompiledDef, Vec<CompileError>> {
        let stateful = self.summary.stateful;

        let mut outputs = Vec::with_capacity(def.outputs.len());
        for output in &def.outputs {
            match self.locals.get(&output.name) {
                Some(local) => outputs.push(*local),
                None => self.errors.push(
                    CompileError::new(
                        ErrorKind::UndefinedName,
                        output.span,
                        format!(
                            "output '{}' of circuit '{}' is never given a value",
                            output.name, def.name.name
                        ),
                    )
                    .with_note(format!("assign '{}' in the body", output.name)),
                ),
            }
        }

        let mut body = Vec::with_capacity(def.body.len() + 3);
        if stateful {
            body.push(ir::Stmt::Unpack);
        }
        for stmt in &def.body {
            body.push(self.rewrite_stmt(stmt));
        }
        if stateful {
            body.push(ir::Stmt::Pack);
        }
        body.push(ir::Stmt::Return {
            outputs,
            with_state: stateful,
        });

        if self.slot_cursor != self.summary.dep_state.len() {
            self.errors.push(CompileError::new(
                ErrorKind::Internal,
                def.name.span,
                format!(
                    "circuit '{}' has {} dependency slot(s) but {} stateful call(s)",
                    def.name.name,
                    self.summary.dep_state.len(),
                    self.slot_cursor
                ),
            ));
        }

        let layout = stateful.then(|| self.layout());
        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        tracing::trace!(circuit = %def.name.name, stateful, locals = self.locals.len(), "rewrote definition");
        Ok(CompiledDef {
            id,
            name: def.name.name.clone(),
            params: self.summary.params.clone(),
            outputs: self.summary.outputs.clone(),
            locals: self.locals.keys().cloned().collect(),
            layout,
            body,
            span: def.span,
        })
    }

    fn layout(&self) -> StateLayout {
        StateLayout {
            vars: self
                .summary
                .state
                .iter()
                .filter_map(|name| self.locals.get(name).copied())
                .collect(),
            slots: self
                .summary
                .dep_state
                .iter()
                .filter_map(|slot| {
                    Some(SlotBinding {
                        id: slot.id,
                        name: slot.name.clone(),
                        callee: *self.ids.get(slot.callee.as_str())?,
                    })
                })
                .collect(),
        }
    }

    fn rewrite_stmt(&mut self, stmt: &Stmt) -> ir::Stmt {
        match stmt {
            Stmt::Assign { targets, value, .. } => {
                let value = self.rewrite_expr(value, Some(targets.len()));
                let targets = targets
                    .iter()
                    .filter_map(|target| self.locals.get(&target.name).copied())
                    .collect();
                ir::Stmt::Assign { targets, value }
            }
            // A bare call may discard any number of outputs.
            Stmt::Expr(expr) => ir::Stmt::Eval(self.rewrite_expr(expr, None)),
        }
    }

    /// `expected` is the number of values the context consumes, `None`
    /// when the result is discarded.
    fn rewrite_expr(&mut self, expr: &Expr, expected: Option<usize>) -> ir::Expr {
        match &expr.kind {
            ExprKind::Literal(value) => ir::Expr::Const(*value),
            ExprKind::Name(name) => match self.locals.get(name) {
                Some(local) => ir::Expr::Local(*local),
                None => {
                    self.errors.push(CompileError::new(
                        ErrorKind::Internal,
                        expr.span,
                        format!("'{}' has no local slot", name),
                    ));
                    ir::Expr::Const(0)
                }
            },
            ExprKind::Unary { op, operand } => ir::Expr::Unary {
                op: *op,
                operand: Box::new(self.rewrite_expr(operand, Some(1))),
            },
            ExprKind::Binary { op, left, right } => ir::Expr::Binary {
                op: *op,
                left: Box::new(self.rewrite_expr(left, Some(1))),
                right: Box::new(self.rewrite_expr(right, Some(1))),
            },
            ExprKind::Call { callee, args } => {
                // Pre-order: this call is numbered before calls in its arguments.
                let call_index = self.call_index;
                self.call_index += 1;

                let (ids, analysis) = (self.ids, self.analysis);
                let target = ids
                    .get(callee.name.as_str())
                    .copied()
                    .zip(analysis.get(&callee.name));
                let Some((callee_id, callee_summary)) = target else {
                    self.errors.push(CompileError::new(
                        ErrorKind::UndefinedName,
                        callee.span,
                        format!("unknown circuit '{}'", callee.name),
                    ));
                    return ir::Expr::Const(0);
                };

                if args.len() != callee_summary.params.len() {
                    self.errors.push(
                        CompileError::new(
                            ErrorKind::WrongArgCount,
                            expr.span,
                            format!(
                                "'{}' takes {} argument(s) but {} were given",
                                callee.name,
                                callee_summary.params.len(),
                                args.len()
                            ),
                        )
                        .with_label(callee_summary.span, format!("'{}' defined here", callee.name)),
                    );
                }

                match expected {
                    Some(1) if callee_summary.outputs.len() != 1 => {
                        self.errors.push(CompileError::new(
                            ErrorKind::OutputMismatch,
                            expr.span,
                            format!(
                                "'{}' returns {} values where one is expected",
                                callee.name,
                                callee_summary.outputs.len()
                            ),
                        ));
                    }
                    Some(n) if n != callee_summary.outputs.len() => {
                        self.errors.push(CompileError::new(
                            ErrorKind::OutputMismatch,
                            expr.span,
                            format!(
                                "'{}' returns {} value(s) but {} targets are assigned",
                                callee.name,
                                callee_summary.outputs.len(),
                                n
                            ),
                        ));
                    }
                    _ => {}
                }

                let slot = if callee_summary.stateful {
                    self.take_slot(call_index, expr)
                } else {
                    None
                };

                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.rewrite_expr(arg, Some(1)));
                }

                ir::Expr::Call(ir::Call {
                    callee: callee_id,
                    args: lowered,
                    slot,
                    span: expr.span,
                })
            }
        }
    }

    /// Next dependency slot, which must belong to call `call_index`.
    fn take_slot(&mut self, call_index: usize, expr: &Expr) -> Option<usize> {
        match self.summary.dep_state.get(self.slot_cursor) {
            Some(slot) if slot.call_index == call_index => {
                let position = self.slot_cursor;
                self.slot_cursor += 1;
                Some(position)
            }
            _ => {
                self.errors.push(CompileError::new(
                    ErrorKind::Internal,
                    expr.span,
                    format!(
                        "no dependency slot allocated for call #{} in '{}'",
                        call_index, self.summary.name
                    ),
                ));
                None
            }
        }
    }
}
