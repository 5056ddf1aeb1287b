//! End-to-end tests: source text through the simulator.

use crash_resolve::ErrorKind;
use crash_runtime::{MAX_ITERATIONS, State, Status};
use crash_tests::{TestHarness, output};

const GATES: &str = include_str!("../../../demos/gates.crash");
const LATCHES: &str = include_str!("../../../demos/latches.crash");
const COUNTER: &str = include_str!("../../../demos/counter.crash");

/// y=1 for {0,0}, y=0 for {1,1}; each toggle settles after one result.
#[test]
fn test_nand_toggle_scenario() {
    let harness = TestHarness::from_source(GATES);
    let mut sim = harness.simulator("nand");

    let a = sim.toggle("a").unwrap();
    assert_eq!((a.status, a.iterations), (Status::Stable, 1));
    assert_eq!(output(&a, "y"), 1);

    let b = sim.toggle("b").unwrap();
    assert_eq!((b.status, b.iterations), (Status::Stable, 1));
    assert_eq!(output(&b, "y"), 0);

    assert_eq!(output(&harness.settle("nand", &[]), "y"), 1);
}

#[test]
fn test_gates_are_pure_and_keep_their_signatures() {
    let harness = TestHarness::from_source(GATES);
    for name in ["and_gate", "or_gate", "nand", "xor_gate", "half_adder"] {
        assert!(!harness.is_stateful(name), "{} should be pure", name);
    }
    let adder = harness.registry().lookup("half_adder").unwrap();
    assert_eq!(adder.params(), &["a".to_string(), "b".to_string()]);
    assert_eq!(adder.output_names(), &["sum".to_string(), "carry".to_string()]);

    for (a, b, sum, carry) in [(0, 0, 0, 0), (0, 1, 1, 0), (1, 0, 1, 0), (1, 1, 0, 1)] {
        let result = harness.invoke("half_adder", &[a, b], None);
        assert_eq!(result.outputs, vec![sum, carry]);
        assert!(result.state.is_none());
    }
}

#[test]
fn test_counter_starts_at_zero_and_round_trips_forced_state() {
    let harness = TestHarness::from_source(COUNTER);
    let first = harness.invoke("hold", &[], None);
    assert_eq!(first.outputs, vec![0]);

    let forced = State {
        vars: vec![42],
        slots: vec![],
    };
    let again = harness.invoke("hold", &[], Some(forced.clone()));
    assert_eq!(again.outputs, vec![42]);
    assert_eq!(again.state, Some(forced));
}

#[test]
fn test_counter_advances_once_per_run() {
    let harness = TestHarness::from_source(COUNTER);
    let mut sim = harness.simulator("counter");

    let first = sim.toggle("en").unwrap();
    assert_eq!(first.status, Status::Stable);
    assert_eq!(output(&first, "count"), 1);

    assert_eq!(output(&sim.tick().unwrap(), "count"), 2);
    assert_eq!(output(&sim.tick().unwrap(), "count"), 3);

    // Disabled: the count holds.
    let held = sim.toggle("en").unwrap();
    assert_eq!(output(&held, "count"), 3);
}

#[test]
fn test_statefulness_propagates_through_the_call_graph() {
    let harness = TestHarness::from_source(&format!("{}\n{}", LATCHES, COUNTER));
    assert!(harness.is_stateful("sr_latch"));
    assert!(harness.is_stateful("d_latch"));
    assert!(harness.is_stateful("toggle"));
    assert!(harness.is_stateful("counter"));

    let d_latch = harness.compilation().analysis.get("d_latch").unwrap();
    assert!(d_latch.state.is_empty());
    assert_eq!(d_latch.dep_state.len(), 1);
    assert_eq!(d_latch.dep_state[0].callee, "sr_latch");
}

#[test]
fn test_d_latch_holds_when_disabled() {
    let harness = TestHarness::from_source(LATCHES);
    let mut sim = harness.simulator("d_latch");

    sim.set_input("d", 1).unwrap();
    let stored = sim.toggle("en").unwrap();
    assert_eq!(output(&stored, "q"), 1);

    let held = sim.toggle("en").unwrap();
    assert_eq!(output(&held, "q"), 1);

    let ignored = sim.toggle("d").unwrap();
    assert_eq!(output(&ignored, "q"), 1);
    assert_eq!(output(&ignored, "nq"), 0);
}

#[test]
fn test_carrying_state_matches_a_fresh_start() {
    let harness = TestHarness::from_source(LATCHES);

    let mut carried = harness.simulator("d_latch");
    carried.toggle("en").unwrap();
    carried.toggle("d").unwrap();
    let carried = carried.tick().unwrap();

    let fresh = harness.settle("d_latch", &[("d", 1), ("en", 1)]);
    assert_eq!(carried.status, Status::Stable);
    assert_eq!(carried.outputs, fresh.outputs);
}

#[test]
fn test_ring_aborts_at_iteration_cap() {
    let harness = TestHarness::from_source(LATCHES);
    let settle = harness.settle("ring", &[]);
    assert_eq!(settle.status, Status::Aborted);
    assert_eq!(settle.iterations, MAX_ITERATIONS);
    assert_eq!(settle.rows.len(), 100);
}

#[test]
fn test_recursion_is_rejected_before_rewriting() {
    let direct = TestHarness::compile_errors("circuit f(x) -> y { y = f(x) }");
    assert_eq!(direct[0].kind, ErrorKind::CyclicDependency);

    let indirect = TestHarness::compile_errors(
        "circuit ping(x) -> y { y = pong(x) }
         circuit pong(x) -> y { y = ping(x) }",
    );
    assert_eq!(indirect.len(), 1);
    assert_eq!(indirect[0].kind, ErrorKind::CyclicDependency);
    assert!(indirect[0].message.contains("ping → pong → ping"));
}

#[test]
fn test_unknown_callee_fails_compilation() {
    let errors = TestHarness::compile_errors("circuit f(a) -> y { y = missing(a) }");
    assert_eq!(errors[0].kind, ErrorKind::UndefinedName);
}

#[test]
fn test_slot_names_are_unique_across_definitions() {
    let harness = TestHarness::from_source(&format!(
        "{}\ncircuit pair(en) -> (a, b) {{ a = counter(en); b = counter(!en) }}",
        COUNTER
    ));
    let analysis = &harness.compilation().analysis;
    let names: Vec<_> = analysis
        .definitions
        .values()
        .flat_map(|s| s.dep_state.iter().map(|slot| slot.name.clone()))
        .collect();
    assert_eq!(names, vec!["_toggle_0", "_counter_1", "_counter_2"]);

    let pair = harness.invoke("pair", &[1], None);
    assert_eq!(pair.outputs, vec![1, 0]);
    let state = pair.state.unwrap();
    assert_eq!(state.slots.len(), 2);
    assert!(state.slots.iter().all(Option::is_some));
}

#[test]
fn test_console_drives_demo_latch() {
    use crash_run::console::{Console, Outcome};

    let harness = TestHarness::from_source(LATCHES);
    let mut console = Console::new(harness.registry());
    let mut say = |line: &str| match console.handle_line(line) {
        Outcome::Print(text) => text,
        Outcome::Quit => panic!("unexpected quit"),
    };

    assert_eq!(say("@sr_latch"), "Loaded: sr_latch\n{s=0, r=0} -> {...}");
    assert_eq!(say("s"), "{s=1, r=0} -> {q=1, nq=0}");
    // Releasing set keeps the stored bit.
    assert_eq!(say("s"), "{s=0, r=0} -> {q=1, nq=0}");
    assert_eq!(say("r=1"), "{s=0, r=1} -> {q=0, nq=1}");
}

#[test]
fn test_cli_commands_on_demo_file() {
    use std::io::Write;

    let mut file = tempfile::Builder::new().suffix(".crash").tempfile().unwrap();
    file.write_all(COUNTER.as_bytes()).unwrap();

    let check = crash_run::commands::check(file.path()).unwrap();
    assert!(check.contains("counter(en) -> (count)  [stateful]"));
    assert!(check.ends_with("ok: 3 circuit(s), 3 stateful"));

    let listing = crash_run::commands::compile(file.path()).unwrap();
    assert!(listing.contains("count = count + toggle(en, state = _toggle_0)"));

    let json: serde_json::Value =
        serde_json::from_str(&crash_run::commands::analyze(file.path()).unwrap()).unwrap();
    assert_eq!(json["definitions"]["counter"]["stateful"], true);
    assert_eq!(json["definitions"]["counter"]["state"][0], "count");
}
