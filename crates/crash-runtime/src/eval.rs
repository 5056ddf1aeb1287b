//! Interpreter for the state-threading IR.
//!
//! Each invocation gets a [`Frame`]: one value per local and the dependency
//! slots of the current definition. `Unpack` fills the frame from the
//! incoming state, `Pack` builds the outgoing state from it.

use crate::error::{Error, Result};
use crate::state::{State, Value};
use crash_resolve::ir::{Call, CompiledDef, CompiledUnit, Expr, StateLayout, Stmt};

struct Frame {
    locals: Vec<Value>,
    slots: Vec<Option<State>>,
}

/// Run `def` with `args` and an optional incoming state.
///
/// Arguments and state shape are checked before the body runs, so a
/// rejected call has no effect.
pub(crate) fn execute(
    unit: &CompiledUnit,
    def: &CompiledDef,
    args: &[Value],
    state: Option<State>,
) -> Result<(Vec<Value>, Option<State>)> {
    if args.len() != def.params.len() {
        return Err(Error::ArityMismatch {
            circuit: def.name.clone(),
            expected: def.params.len(),
            actual: args.len(),
        });
    }
    match (&def.layout, &state) {
        (None, Some(_)) => {
            return Err(Error::UnexpectedState {
                circuit: def.name.clone(),
            });
        }
        (Some(layout), Some(state)) if !state.fits(layout) => {
            return Err(Error::StateShape {
                circuit: def.name.clone(),
                message: format!(
                    "expected {} variable(s) and {} slot(s), got {} and {}",
                    layout.vars.len(),
                    layout.slots.len(),
                    state.vars.len(),
                    state.slots.len()
                ),
            });
        }
        _ => {}
    }

    let mut frame = Frame {
        locals: vec![0; def.locals.len()],
        slots: Vec::new(),
    };
    frame.locals[..args.len()].copy_from_slice(args);

    let mut incoming = state;
    let mut outgoing = None;

    for stmt in &def.body {
        match stmt {
            Stmt::Unpack => {
                let layout = layout_of(def)?;
                let state = incoming.take().unwrap_or_else(|| State::fresh(layout));
                for (local, value) in layout.vars.iter().zip(state.vars) {
                    frame.locals[local.index()] = value;
                }
                frame.slots = state.slots;
            }
            Stmt::Assign { targets, value } => {
                let values = match value {
                    Expr::Call(call) => eval_call(unit, def, &mut frame, call)?,
                    other => vec![eval(unit, def, &mut frame, other)?],
                };
                if values.len() != targets.len() {
                    return Err(Error::OutputArity {
                        circuit: def.name.clone(),
                        expected: targets.len(),
                        actual: values.len(),
                    });
                }
                for (local, value) in targets.iter().zip(values) {
                    frame.locals[local.index()] = value;
                }
            }
            Stmt::Eval(expr) => match expr {
                Expr::Call(call) => {
                    eval_call(unit, def, &mut frame, call)?;
                }
                other => {
                    eval(unit, def, &mut frame, other)?;
                }
            },
            Stmt::Pack => {
                let layout = layout_of(def)?;
                outgoing = Some(State {
                    vars: layout
                        .vars
                        .iter()
                        .map(|local| frame.locals[local.index()])
                        .collect(),
                    slots: std::mem::take(&mut frame.slots),
                });
            }
            Stmt::Return {
                outputs,
                with_state,
            } => {
                let values = outputs
                    .iter()
                    .map(|local| frame.locals[local.index()])
                    .collect();
                let state = if *with_state { outgoing.take() } else { None };
                return Ok((values, state));
            }
        }
    }

    Err(Error::Malformed {
        circuit: def.name.clone(),
        message: "body does not end in a return".to_string(),
    })
}

fn layout_of(def: &CompiledDef) -> Result<&StateLayout> {
    def.layout.as_ref().ok_or_else(|| Error::Malformed {
        circuit: def.name.clone(),
        message: "state statement in a stateless circuit".to_string(),
    })
}

fn eval(unit: &CompiledUnit, def: &CompiledDef, frame: &mut Frame, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Const(value) => Ok(*value),
        Expr::Local(local) => Ok(frame.locals[local.index()]),
        Expr::Unary { op, operand } => Ok(op.apply(eval(unit, def, frame, operand)?)),
        Expr::Binary { op, left, right } => {
            let left = eval(unit, def, frame, left)?;
            let right = eval(unit, def, frame, right)?;
            Ok(op.apply(left, right))
        }
        Expr::Call(call) => {
            let outputs = eval_call(unit, def, frame, call)?;
            match outputs.as_slice() {
                [value] => Ok(*value),
                _ => Err(Error::OutputArity {
                    circuit: def.name.clone(),
                    expected: 1,
                    actual: outputs.len(),
                }),
            }
        }
    }
}

/// Evaluate the arguments, run the callee with its slot state, and store
/// the callee's new state back into the slot.
fn eval_call(
    unit: &CompiledUnit,
    def: &CompiledDef,
    frame: &mut Frame,
    call: &Call,
) -> Result<Vec<Value>> {
    let callee = unit.get(call.callee).ok_or_else(|| Error::Unresolved {
        caller: def.name.clone(),
        callee: call.callee.0,
    })?;

    let mut args = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        args.push(eval(unit, def, frame, arg)?);
    }

    let Some(slot) = call.slot else {
        let (outputs, _) = execute(unit, callee, &args, None)?;
        return Ok(outputs);
    };

    let slot_state = frame
        .slots
        .get_mut(slot)
        .ok_or_else(|| Error::Malformed {
            circuit: def.name.clone(),
            message: format!("call to '{}' uses missing slot {}", callee.name, slot),
        })?
        .take();
    let (outputs, state) = execute(unit, callee, &args, slot_state)?;
    frame.slots[slot] = state;
    tracing::trace!(caller = %def.name, callee = %callee.name, slot, "threaded slot");
    Ok(outputs)
}
