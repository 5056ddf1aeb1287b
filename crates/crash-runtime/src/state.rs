//! Threaded circuit state.

use crash_resolve::ir::StateLayout;

/// Signal value. Booleans are `0` and `1`.
pub type Value = i64;

/// State of one stateful circuit invocation.
///
/// `vars` holds the circuit's own state variables in name order; `slots`
/// holds the state of each stateful call site in call order, `None` until
/// that call has run once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub vars: Vec<Value>,
    pub slots: Vec<Option<State>>,
}

impl State {
    /// All-zero variables and empty slots for `layout`.
    pub fn fresh(layout: &StateLayout) -> Self {
        Self {
            vars: vec![0; layout.vars.len()],
            slots: vec![None; layout.slots.len()],
        }
    }

    /// Whether the top level of this state has the shape of `layout`.
    pub fn fits(&self, layout: &StateLayout) -> bool {
        self.vars.len() == layout.vars.len() && self.slots.len() == layout.slots.len()
    }
}
