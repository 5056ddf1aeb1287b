//! Compiled circuit registry.

use crate::error::{Error, Result};
use crate::eval;
use crate::state::{State, Value};
use crash_resolve::ir::{CompiledDef, CompiledUnit, Expr, Stmt};

/// Every circuit of one compilation, checked once at build time so that
/// invocations never meet a dangling callee.
#[derive(Debug, Clone)]
pub struct Registry {
    unit: CompiledUnit,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// One value per declared output
    pub outputs: Vec<Value>,
    /// Outgoing state, `Some` exactly for stateful circuits
    pub state: Option<State>,
}

/// Handle to one registered circuit.
#[derive(Debug, Clone, Copy)]
pub struct Circuit<'r> {
    registry: &'r Registry,
    def: &'r CompiledDef,
}

impl Registry {
    /// Check every callee and slot reference of `unit`.
    pub fn build(unit: CompiledUnit) -> Result<Self> {
        for def in &unit.definitions {
            if let Some(layout) = &def.layout {
                for binding in &layout.slots {
                    if unit.get(binding.callee).is_none() {
                        return Err(Error::Unresolved {
                            caller: def.name.clone(),
                            callee: binding.callee.0,
                        });
                    }
                }
            }
            for stmt in &def.body {
                match stmt {
                    Stmt::Assign { value, .. } | Stmt::Eval(value) => {
                        check_expr(&unit, def, value)?;
                    }
                    Stmt::Unpack | Stmt::Pack | Stmt::Return { .. } => {}
                }
            }
        }
        tracing::debug!(circuits = unit.len(), "registry built");
        Ok(Self { unit })
    }

    pub fn lookup(&self, name: &str) -> Option<Circuit<'_>> {
        self.unit.find(name).map(|def| Circuit {
            registry: self,
            def,
        })
    }

    /// Circuit names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.unit.definitions.iter().map(|def| def.name.as_str())
    }

    pub fn unit(&self) -> &CompiledUnit {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unit.is_empty()
    }
}

fn check_expr(unit: &CompiledUnit, def: &CompiledDef, expr: &Expr) -> Result<()> {
    match expr {
        Expr::Const(_) | Expr::Local(_) => Ok(()),
        Expr::Unary { operand, .. } => check_expr(unit, def, operand),
        Expr::Binary { left, right, .. } => {
            check_expr(unit, def, left)?;
            check_expr(unit, def, right)
        }
        Expr::Call(call) => {
            let Some(callee) = unit.get(call.callee) else {
                return Err(Error::Unresolved {
                    caller: def.name.clone(),
                    callee: call.callee.0,
                });
            };
            let slots = def.layout.as_ref().map_or(0, |layout| layout.slots.len());
            let slot_ok = match call.slot {
                Some(slot) => slot < slots && callee.is_stateful(),
                None => !callee.is_stateful(),
            };
            if !slot_ok {
                return Err(Error::Malformed {
                    circuit: def.name.clone(),
                    message: format!("call to '{}' has no valid state slot", callee.name),
                });
            }
            call.args.iter().try_for_each(|arg| check_expr(unit, def, arg))
        }
    }
}

impl<'r> Circuit<'r> {
    pub fn name(&self) -> &'r str {
        &self.def.name
    }

    pub fn params(&self) -> &'r [String] {
        &self.def.params
    }

    pub fn output_names(&self) -> &'r [String] {
        &self.def.outputs
    }

    pub fn is_stateful(&self) -> bool {
        self.def.is_stateful()
    }

    /// Run the circuit once.
    ///
    /// `inputs` are positional, one per parameter. A stateful circuit
    /// starts from fresh state when `state` is `None`; passing state to a
    /// stateless circuit is an error.
    pub fn invoke(&self, inputs: &[Value], state: Option<State>) -> Result<Invocation> {
        let (outputs, state) = eval::execute(&self.registry.unit, self.def, inputs, state)?;
        Ok(Invocation { outputs, state })
    }
}
