//! Integration test harness for crash.
//!
//! Runs the whole pipeline from source text: Parse → Analyze → Resolve →
//! Rewrite → Register → Simulate.

use crash_resolve::{Compilation, CompileError, compile_source};
use crash_runtime::{Invocation, Registry, Settle, Simulator, State, Value};

/// Compiled source plus a registry to run it.
pub struct TestHarness {
    compilation: Compilation,
    registry: Registry,
}

impl TestHarness {
    /// Compile `source`.
    ///
    /// # Panics
    ///
    /// Panics with rendered diagnostics if compilation fails.
    pub fn from_source(source: &str) -> Self {
        let result = compile_source("test.crash", source);
        if result.has_errors() {
            panic!("compilation failed:\n{}", result.format_diagnostics());
        }
        let compilation = result
            .compilation
            .expect("successful compilation has output");
        let registry =
            Registry::build(compilation.unit.clone()).expect("compiled unit should register");
        Self {
            compilation,
            registry,
        }
    }

    /// Compile `source` and return its errors.
    ///
    /// # Panics
    ///
    /// Panics if compilation succeeds.
    pub fn compile_errors(source: &str) -> Vec<CompileError> {
        let result = compile_source("test.crash", source);
        assert!(result.has_errors(), "expected compilation to fail");
        result.errors().cloned().collect()
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_stateful(&self, circuit: &str) -> bool {
        self.registry
            .lookup(circuit)
            .unwrap_or_else(|| panic!("no circuit '{}'", circuit))
            .is_stateful()
    }

    /// Call a circuit once.
    pub fn invoke(&self, circuit: &str, inputs: &[Value], state: Option<State>) -> Invocation {
        self.registry
            .lookup(circuit)
            .unwrap_or_else(|| panic!("no circuit '{}'", circuit))
            .invoke(inputs, state)
            .unwrap_or_else(|e| panic!("invoking '{}' failed: {}", circuit, e))
    }

    /// Simulator with `circuit` selected.
    pub fn simulator(&self, circuit: &str) -> Simulator<'_> {
        let mut sim = Simulator::new(&self.registry);
        sim.select(circuit)
            .unwrap_or_else(|e| panic!("selecting '{}' failed: {}", circuit, e));
        sim
    }

    /// Select `circuit`, set `inputs`, run once.
    pub fn settle(&self, circuit: &str, inputs: &[(&str, Value)]) -> Settle {
        let mut sim = self.simulator(circuit);
        for (name, value) in inputs {
            sim.set_input(name, *value)
                .unwrap_or_else(|e| panic!("setting '{}' failed: {}", name, e));
        }
        sim.tick().expect("run should succeed")
    }
}

/// Value of output `name` in a settle result.
pub fn output(settle: &Settle, name: &str) -> Value {
    settle
        .outputs
        .iter()
        .find(|(output, _)| output == name)
        .map(|(_, value)| *value)
        .unwrap_or_else(|| panic!("no output '{}'", name))
}
