//! State-threading intermediate representation.
//!
//! The rewrite pass lowers each [`crash_ast::Definition`] into a
//! [`CompiledDef`] whose names are resolved to indices:
//!
//! - callees to [`DefId`] (position in the unit)
//! - parameters, state variables and temporaries to [`LocalId`]
//! - dependency state slots to positions in [`StateLayout::slots`]
//!
//! A stateful definition's body opens with [`Stmt::Unpack`], ends with
//! [`Stmt::Pack`], and its [`Stmt::Return`] carries the outgoing state.
//! Every call to a stateful callee names the slot it threads.

use crash_ast::{BinaryOp, Span, UnaryOp};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalId(pub u32);

/// Globally unique dependency state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotId(pub u32);

impl DefId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every rewritten definition of one compilation, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    pub definitions: Vec<CompiledDef>,
    symbols: IndexMap<String, DefId>,
}

impl CompiledUnit {
    pub fn new(definitions: Vec<CompiledDef>) -> Self {
        let symbols = definitions
            .iter()
            .map(|def| (def.name.clone(), def.id))
            .collect();
        Self {
            definitions,
            symbols,
        }
    }

    pub fn get(&self, id: DefId) -> Option<&CompiledDef> {
        self.definitions.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<&CompiledDef> {
        self.symbols.get(name).and_then(|id| self.get(*id))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Pseudo-source rendering of one definition.
    pub fn listing<'a>(&'a self, def: &'a CompiledDef) -> Listing<'a> {
        Listing { unit: self, def }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledDef {
    pub id: DefId,
    pub name: String,
    pub params: Vec<String>,
    /// Declared output names, the shape of the result tuple
    pub outputs: Vec<String>,
    /// Names of every local, indexed by [`LocalId`]. Parameters come first,
    /// then state variables in sorted order, then temporaries.
    pub locals: Vec<String>,
    /// `Some` exactly when the definition threads state.
    pub layout: Option<StateLayout>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl CompiledDef {
    pub fn is_stateful(&self) -> bool {
        self.layout.is_some()
    }

    pub fn local_name(&self, id: LocalId) -> &str {
        self.locals.get(id.index()).map_or("?", String::as_str)
    }
}

/// Shape of a stateful definition's state value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    /// Own state variables, sorted by name
    pub vars: Vec<LocalId>,
    /// Dependency slots in call-site order
    pub slots: Vec<SlotBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBinding {
    pub id: SlotId,
    /// `_<callee>_<n>`
    pub name: String,
    pub callee: DefId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Load own variables and slots from the incoming state, or zeros and
    /// empty slots when none was passed.
    Unpack,
    Assign { targets: Vec<LocalId>, value: Expr },
    Eval(Expr),
    /// Build the outgoing state from the current variables and slots.
    Pack,
    Return {
        outputs: Vec<LocalId>,
        with_state: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(i64),
    Local(LocalId),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: DefId,
    pub args: Vec<Expr>,
    /// Index into the caller's [`StateLayout::slots`] when the callee is
    /// stateful. The call reads the slot and writes the callee's new state
    /// back into it.
    pub slot: Option<usize>,
    pub span: Span,
}

/// Display adapter returned by [`CompiledUnit::listing`].
///
/// ```text
/// circuit counter(en, state = none) {
///     count, _toggle_0 = unpack(state, 0, none)
///     t = toggle(en, state = _toggle_0)
///     state = pack(count, _toggle_0)
///     return (count), state
/// }
/// ```
pub struct Listing<'a> {
    unit: &'a CompiledUnit,
    def: &'a CompiledDef,
}

impl Listing<'_> {
    fn locals(&self, ids: &[LocalId]) -> String {
        ids.iter()
            .map(|id| self.def.local_name(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Own variables then slot names, the order of the state tuple.
    fn state_names(&self, layout: &StateLayout) -> Vec<String> {
        layout
            .vars
            .iter()
            .map(|id| self.def.local_name(*id).to_string())
            .chain(layout.slots.iter().map(|slot| slot.name.clone()))
            .collect()
    }

    fn write_expr(&self, f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Local(id) => write!(f, "{}", self.def.local_name(*id)),
            Expr::Unary { op, operand } => {
                write!(f, "{}", op)?;
                self.write_operand(f, operand)
            }
            Expr::Binary { op, left, right } => {
                self.write_operand(f, left)?;
                write!(f, " {} ", op)?;
                self.write_operand(f, right)
            }
            Expr::Call(call) => {
                let callee = self.unit.get(call.callee).map_or("?", |d| d.name.as_str());
                write!(f, "{}(", callee)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.write_expr(f, arg)?;
                }
                if let Some(slot) = call.slot {
                    let name = self
                        .def
                        .layout
                        .as_ref()
                        .and_then(|layout| layout.slots.get(slot))
                        .map_or("?", |binding| binding.name.as_str());
                    if !call.args.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "state = {}", name)?;
                }
                write!(f, ")")
            }
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
        if matches!(expr, Expr::Binary { .. }) {
            write!(f, "(")?;
            self.write_expr(f, expr)?;
            write!(f, ")")
        } else {
            self.write_expr(f, expr)
        }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = self.def;
        let mut params = def.params.clone();
        if def.is_stateful() {
            params.push("state = none".to_string());
        }
        writeln!(f, "circuit {}({}) {{", def.name, params.join(", "))?;

        for stmt in &def.body {
            write!(f, "    ")?;
            match stmt {
                Stmt::Unpack => {
                    let layout = def.layout.as_ref().ok_or(fmt::Error)?;
                    let defaults = layout
                        .vars
                        .iter()
                        .map(|_| "0")
                        .chain(layout.slots.iter().map(|_| "none"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let names = self.state_names(layout).join(", ");
                    if names.is_empty() {
                        writeln!(f, "unpack(state)")?;
                    } else {
                        writeln!(f, "{} = unpack(state, {})", names, defaults)?;
                    }
                }
                Stmt::Assign { targets, value } => {
                    write!(f, "{} = ", self.locals(targets))?;
                    self.write_expr(f, value)?;
                    writeln!(f)?;
                }
                Stmt::Eval(expr) => {
                    self.write_expr(f, expr)?;
                    writeln!(f)?;
                }
                Stmt::Pack => {
                    let layout = def.layout.as_ref().ok_or(fmt::Error)?;
                    writeln!(f, "state = pack({})", self.state_names(layout).join(", "))?;
                }
                Stmt::Return {
                    outputs,
                    with_state,
                } => {
                    let outputs = self.locals(outputs);
                    match (*with_state, def.outputs.len()) {
                        (true, _) => writeln!(f, "return ({}), state", outputs)?,
                        (false, 1) => writeln!(f, "return {}", outputs)?,
                        (false, _) => writeln!(f, "return ({})", outputs)?,
                    }
                }
            }
        }
        write!(f, "}}")
    }
}
