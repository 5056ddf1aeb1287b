//! Stabilization simulator.
//!
//! Holds one selected circuit, its input vector and its retained state.
//! Every run re-invokes the circuit with the same inputs, feeding each
//! invocation the state returned by the previous one, until two consecutive
//! results are equal (stable) or [`MAX_ITERATIONS`] results have been seen
//! without that happening (aborted).

use crate::error::{Error, Result};
use crate::registry::{Circuit, Registry};
use crate::state::{State, Value};
use indexmap::IndexMap;
use tracing::{debug, info, instrument};

/// Upper bound on distinct results per run.
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Selected, not run since
    Idle,
    Running,
    /// Last run reached a repeated result
    Stable,
    /// Last run hit the iteration cap; its outputs are the last ones seen
    Aborted,
}

/// One emitted result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Inputs, present on the first row of a run only
    pub inputs: Option<Vec<(String, Value)>>,
    pub outputs: Vec<(String, Value)>,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settle {
    pub rows: Vec<Row>,
    pub status: Status,
    /// Number of distinct results seen
    pub iterations: usize,
    /// Final outputs: the stable value, or the last value before aborting
    pub outputs: Vec<(String, Value)>,
}

struct Selection<'r> {
    circuit: Circuit<'r>,
    inputs: IndexMap<String, Value>,
    state: Option<State>,
}

pub struct Simulator<'r> {
    registry: &'r Registry,
    selection: Option<Selection<'r>>,
    status: Status,
}

impl<'r> Simulator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            selection: None,
            status: Status::Idle,
        }
    }

    /// Load `name` with all inputs at zero and no retained state.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let circuit = self
            .registry
            .lookup(name)
            .ok_or_else(|| Error::UnknownCircuit(name.to_string()))?;
        let inputs = circuit
            .params()
            .iter()
            .map(|param| (param.clone(), 0))
            .collect();
        self.selection = Some(Selection {
            circuit,
            inputs,
            state: None,
        });
        self.status = Status::Idle;
        info!(circuit = name, stateful = circuit.is_stateful(), "selected");
        Ok(())
    }

    pub fn selected(&self) -> Option<Circuit<'r>> {
        self.selection.as_ref().map(|s| s.circuit)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Current input vector in parameter order.
    pub fn inputs(&self) -> Vec<(String, Value)> {
        self.selection
            .as_ref()
            .map(|s| named(&s.inputs))
            .unwrap_or_default()
    }

    pub fn state(&self) -> Option<&State> {
        self.selection.as_ref().and_then(|s| s.state.as_ref())
    }

    /// Assign an input without running.
    pub fn set_input(&mut self, input: &str, value: Value) -> Result<()> {
        let slot = self.input_mut(input)?;
        *slot = value;
        Ok(())
    }

    /// Flip `input` between 0 and 1, then run.
    pub fn toggle(&mut self, input: &str) -> Result<Settle> {
        let slot = self.input_mut(input)?;
        *slot = if *slot == 0 { 1 } else { 0 };
        self.tick()
    }

    /// Run with the current inputs.
    #[instrument(skip(self), name = "settle")]
    pub fn tick(&mut self) -> Result<Settle> {
        let selection = self.selection.as_mut().ok_or(Error::NoSelection)?;
        let circuit = selection.circuit;
        let names = circuit.output_names();
        let values: Vec<Value> = selection.inputs.values().copied().collect();

        self.status = Status::Running;
        let mut rows = Vec::new();
        let mut previous: Option<Vec<Value>> = None;
        let mut iteration = 0;

        let status = loop {
            let invocation = match circuit.invoke(&values, selection.state.clone()) {
                Ok(invocation) => invocation,
                Err(err) => {
                    self.status = Status::Idle;
                    return Err(err);
                }
            };
            selection.state = invocation.state;

            if previous.as_ref() == Some(&invocation.outputs) {
                info!(circuit = circuit.name(), iterations = iteration, "stable");
                break Status::Stable;
            }

            debug!(iteration, outputs = ?invocation.outputs, "settling");
            rows.push(Row {
                inputs: (iteration == 0).then(|| named(&selection.inputs)),
                outputs: zip_names(names, &invocation.outputs),
            });
            previous = Some(invocation.outputs);
            iteration += 1;

            if iteration == MAX_ITERATIONS {
                info!(
                    circuit = circuit.name(),
                    iterations = iteration,
                    "did not stabilize"
                );
                break Status::Aborted;
            }
        };

        self.status = status;
        Ok(Settle {
            rows,
            status,
            iterations: iteration,
            outputs: previous
                .map(|values| zip_names(names, &values))
                .unwrap_or_default(),
        })
    }

    fn input_mut(&mut self, input: &str) -> Result<&mut Value> {
        let selection = self.selection.as_mut().ok_or(Error::NoSelection)?;
        let circuit = selection.circuit.name().to_string();
        selection
            .inputs
            .get_mut(input)
            .ok_or_else(|| Error::UnknownInput {
                circuit,
                input: input.to_string(),
            })
    }
}

fn named(values: &IndexMap<String, Value>) -> Vec<(String, Value)> {
    values.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

fn zip_names(names: &[String], values: &[Value]) -> Vec<(String, Value)> {
    names.iter().cloned().zip(values.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crash_resolve::compile_source;

    fn registry(source: &str) -> Registry {
        let result = compile_source("sim.crash", source);
        assert!(!result.has_errors(), "{}", result.format_diagnostics());
        Registry::build(result.compilation.unwrap().unit).unwrap()
    }

    const CIRCUITS: &str = "
        circuit and_gate(a, b) -> y { y = a & b }
        circuit nand(a, b) -> y { y = !and_gate(a, b) }
        circuit sr_latch(s, r) -> (q, nq) { q = !(r | nq); nq = !(s | q) }
        circuit osc() -> q { q = !q }
    ";

    fn pairs(items: &[(&str, Value)]) -> Vec<(String, Value)> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_nand_settles_in_one_iteration_per_toggle() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        sim.select("nand").unwrap();
        assert_eq!(sim.status(), Status::Idle);

        let first = sim.tick().unwrap();
        assert_eq!(first.status, Status::Stable);
        assert_eq!(first.iterations, 1);
        assert_eq!(first.outputs, pairs(&[("y", 1)]));
        assert_eq!(first.rows[0].inputs, Some(pairs(&[("a", 0), ("b", 0)])));

        let a = sim.toggle("a").unwrap();
        assert_eq!((a.status, a.iterations), (Status::Stable, 1));
        assert_eq!(a.outputs, pairs(&[("y", 1)]));

        let b = sim.toggle("b").unwrap();
        assert_eq!((b.status, b.iterations), (Status::Stable, 1));
        assert_eq!(b.outputs, pairs(&[("y", 0)]));
        assert_eq!(b.rows.len(), 1);
        assert_eq!(sim.inputs(), pairs(&[("a", 1), ("b", 1)]));
    }

    #[test]
    fn test_only_first_row_carries_inputs() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        sim.select("sr_latch").unwrap();
        sim.toggle("r").unwrap();
        sim.toggle("r").unwrap();
        // q and nq are both low for one pass before q rises
        let settle = sim.toggle("s").unwrap();
        assert_eq!(settle.status, Status::Stable);
        assert_eq!(settle.rows.len(), 2);
        assert_eq!(settle.rows[0].outputs, pairs(&[("q", 0), ("nq", 0)]));
        assert!(settle.rows[0].inputs.is_some());
        assert!(settle.rows[1..].iter().all(|row| row.inputs.is_none()));
        assert_eq!(settle.outputs, pairs(&[("q", 1), ("nq", 0)]));
    }

    #[test]
    fn test_latch_remembers_after_set_is_released() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        sim.select("sr_latch").unwrap();
        sim.toggle("r").unwrap();
        sim.toggle("r").unwrap();
        let reset_held = sim.tick().unwrap();
        assert_eq!(reset_held.outputs, pairs(&[("q", 0), ("nq", 1)]));

        sim.toggle("s").unwrap();
        let released = sim.toggle("s").unwrap();
        assert_eq!(released.outputs, pairs(&[("q", 1), ("nq", 0)]));
    }

    #[test]
    fn test_carried_state_matches_fresh_start() {
        let registry = registry(CIRCUITS);

        let mut carried = Simulator::new(&registry);
        carried.select("sr_latch").unwrap();
        carried.toggle("r").unwrap();
        carried.toggle("r").unwrap();
        let carried = carried.toggle("s").unwrap();

        let mut fresh = Simulator::new(&registry);
        fresh.select("sr_latch").unwrap();
        fresh.set_input("s", 1).unwrap();
        let fresh = fresh.tick().unwrap();

        assert_eq!(carried.status, Status::Stable);
        assert_eq!(carried.outputs, fresh.outputs);
    }

    #[test]
    fn test_oscillator_aborts_at_cap() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        sim.select("osc").unwrap();
        let settle = sim.tick().unwrap();
        assert_eq!(settle.status, Status::Aborted);
        assert_eq!(settle.iterations, MAX_ITERATIONS);
        assert_eq!(settle.rows.len(), MAX_ITERATIONS);
        assert_eq!(sim.status(), Status::Aborted);
        // 1, 0, 1, ... so the hundredth result is 0
        assert_eq!(settle.outputs, pairs(&[("q", 0)]));

        // Still usable after aborting.
        assert_eq!(sim.tick().unwrap().status, Status::Aborted);
    }

    #[test]
    fn test_select_resets_state_and_inputs() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        sim.select("sr_latch").unwrap();
        sim.toggle("s").unwrap();
        assert!(sim.state().is_some());

        sim.select("sr_latch").unwrap();
        assert!(sim.state().is_none());
        assert_eq!(sim.inputs(), pairs(&[("s", 0), ("r", 0)]));
        assert_eq!(sim.status(), Status::Idle);
    }

    #[test]
    fn test_errors() {
        let registry = registry(CIRCUITS);
        let mut sim = Simulator::new(&registry);
        assert_eq!(sim.tick().unwrap_err(), Error::NoSelection);
        assert_eq!(
            sim.select("nope").unwrap_err(),
            Error::UnknownCircuit("nope".into())
        );
        sim.select("nand").unwrap();
        assert!(matches!(
            sim.toggle("z").unwrap_err(),
            Error::UnknownInput { .. }
        ));
        assert_eq!(sim.inputs(), pairs(&[("a", 0), ("b", 0)]));
    }
}
