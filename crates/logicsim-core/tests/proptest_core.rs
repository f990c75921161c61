//! Property-based tests for the LogicSim core.
//!
//! Uses proptest to generate random circuits and edit sequences, then
//! verifies structural invariants and step semantics hold.

use logicsim_core::component::ComponentKind;
use logicsim_core::engine::Simulator;
use logicsim_core::id::*;
use logicsim_core::test_utils::*;
use logicsim_core::validation::{check_graph, validate_determinism};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_kind() -> impl Strategy<Value = ComponentKind> {
    (0..ComponentKind::ALL.len()).prop_map(|i| ComponentKind::ALL[i])
}

/// A circuit description: component kinds, (source, target) index pairs and
/// which components to activate before stepping.
#[derive(Debug, Clone)]
struct CircuitPlan {
    kinds: Vec<ComponentKind>,
    links: Vec<(usize, usize)>,
    toggles: Vec<usize>,
}

fn arb_circuit(max_components: usize) -> impl Strategy<Value = CircuitPlan> {
    (
        proptest::collection::vec(arb_kind(), 1..=max_components),
        proptest::collection::vec((0..64usize, 0..64usize), 0..=max_components * 2),
        proptest::collection::vec(0..64usize, 0..8),
    )
        .prop_map(|(kinds, links, toggles)| CircuitPlan {
            kinds,
            links,
            toggles,
        })
}

/// Build `plan`, inserting components and connections in forward or reverse
/// order. Returns ids indexed like `plan.kinds`.
fn build(plan: &CircuitPlan, reverse: bool) -> (Simulator, Vec<ComponentId>) {
    let mut sim = new_sim();
    let n = plan.kinds.len();
    let mut ids = vec![None; n];

    let order: Vec<usize> = if reverse {
        (0..n).rev().collect()
    } else {
        (0..n).collect()
    };
    for &i in &order {
        ids[i] = Some(add(&mut sim, plan.kinds[i]));
    }
    let ids: Vec<ComponentId> = ids.into_iter().flatten().collect();

    let mut links: Vec<(usize, usize)> = plan
        .links
        .iter()
        .map(|&(a, b)| (a % n, b % n))
        .filter(|&(a, b)| plan.kinds[a].output_count() > 0 && plan.kinds[b].input_count() > 0)
        .collect();
    if reverse {
        links.reverse();
    }
    for (a, b) in links {
        connect(&mut sim, ids[a], ids[b]);
    }

    for &t in &plan.toggles {
        let id = ids[t % n];
        if plan.kinds[t % n].is_interactive() {
            sim.activate(id).unwrap();
        }
    }

    (sim, ids)
}

/// Edit operations for mutation-safety testing.
#[derive(Debug, Clone)]
enum EditOp {
    Add(ComponentKind),
    Remove(usize),
    Connect {
        from: usize,
        output: usize,
        to: usize,
        input: usize,
    },
    Disconnect {
        from: usize,
        to: usize,
        input: usize,
    },
    Activate(usize),
    Step,
}

fn arb_edit_sequence(max_ops: usize) -> impl Strategy<Value = Vec<EditOp>> {
    proptest::collection::vec(
        prop_oneof![
            arb_kind().prop_map(EditOp::Add),
            (0..50usize).prop_map(EditOp::Remove),
            (0..50usize, 0..2usize, 0..50usize, 0..2usize).prop_map(|(from, output, to, input)| {
                EditOp::Connect {
                    from,
                    output,
                    to,
                    input,
                }
            }),
            (0..50usize, 0..50usize, 0..2usize)
                .prop_map(|(from, to, input)| EditOp::Disconnect { from, to, input }),
            (0..50usize).prop_map(EditOp::Activate),
            Just(EditOp::Step),
        ],
        1..=max_ops,
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Any edit sequence leaves the graph structurally sound. Invalid edits
    /// are rejected without panicking.
    #[test]
    fn edits_keep_graph_consistent(ops in arb_edit_sequence(120)) {
        let mut sim = new_sim();
        // Includes removed ids on purpose, so stale handles get exercised.
        let mut ids: Vec<ComponentId> = Vec::new();

        for op in ops {
            match op {
                EditOp::Add(kind) => ids.push(add(&mut sim, kind)),
                EditOp::Remove(i) if !ids.is_empty() => {
                    sim.remove_component(ids[i % ids.len()]);
                }
                EditOp::Connect { from, output, to, input } if !ids.is_empty() => {
                    let (a, b) = (ids[from % ids.len()], ids[to % ids.len()]);
                    let before = sim.graph().connection_count();
                    let result = sim.graph_mut().connect(a, output, b, input, Vec::new());
                    let expected = if result.is_ok() { before + 1 } else { before };
                    prop_assert_eq!(sim.graph().connection_count(), expected);
                }
                EditOp::Disconnect { from, to, input } if !ids.is_empty() => {
                    let (a, b) = (ids[from % ids.len()], ids[to % ids.len()]);
                    if let Ok(wire) = sim.graph().output_wire(a, 0) {
                        let _ = sim.graph_mut().disconnect(wire, b, input);
                        prop_assert!(sim
                            .graph()
                            .wire(wire)
                            .unwrap()
                            .connections()
                            .iter()
                            .all(|c| !c.targets(b, input)));
                    }
                }
                EditOp::Activate(i) if !ids.is_empty() => {
                    let id = ids[i % ids.len()];
                    let interactive = sim
                        .graph()
                        .component(id)
                        .is_some_and(|c| c.is_interactive());
                    prop_assert_eq!(sim.activate(id).is_ok(), interactive);
                }
                EditOp::Step => {
                    sim.step();
                }
                _ => {}
            }
            let violations = check_graph(sim.graph());
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }
    }

    /// The outcome of a step does not depend on the order components and
    /// connections were inserted in.
    #[test]
    fn insertion_order_does_not_matter(plan in arb_circuit(24), steps in 1..30usize) {
        let (mut forward, f_ids) = build(&plan, false);
        let (mut backward, b_ids) = build(&plan, true);

        for _ in 0..steps {
            forward.step();
            backward.step();
            for i in 0..plan.kinds.len() {
                prop_assert_eq!(lit(&forward, f_ids[i]), lit(&backward, b_ids[i]));
                if plan.kinds[i].output_count() > 0 {
                    prop_assert_eq!(out(&forward, f_ids[i]), out(&backward, b_ids[i]));
                }
            }
        }
    }

    /// Two identical builds produce identical hashes after every step.
    #[test]
    fn deterministic_simulation(plan in arb_circuit(30), steps in 1..40u64) {
        let (mut a, _) = build(&plan, false);
        let (mut b, _) = build(&plan, false);
        for _ in 0..steps {
            a.step();
            b.step();
            prop_assert_eq!(a.state_hash(), b.state_hash());
        }
    }

    /// Serialize round-trip: a restored simulator continues in lockstep.
    #[test]
    fn serialize_round_trip(plan in arb_circuit(30), warmup in 0..10u64) {
        let (mut sim, _) = build(&plan, false);
        sim.run(warmup);

        let data = sim.serialize().expect("serialize should succeed");
        let mut restored = Simulator::deserialize(&data).expect("deserialize should succeed");
        prop_assert_eq!(restored.state_hash(), sim.state_hash());
        prop_assert!(check_graph(restored.graph()).is_empty());

        sim.run(5);
        restored.run(5);
        prop_assert_eq!(restored.state_hash(), sim.state_hash());

        let result = validate_determinism(&data, 10).expect("snapshot is valid");
        prop_assert!(result.is_deterministic);
    }

    /// Removing any component leaves no reference to it anywhere.
    #[test]
    fn removal_cleans_up(plan in arb_circuit(20), victim in 0..64usize) {
        let (mut sim, ids) = build(&plan, false);
        sim.run(2);
        let victim = ids[victim % ids.len()];
        prop_assert!(sim.remove_component(victim));

        for (_, wire) in sim.graph().wires() {
            prop_assert_ne!(wire.source(), victim);
            prop_assert!(wire.connections().iter().all(|c| c.component != victim));
        }
        prop_assert!(check_graph(sim.graph()).is_empty());
        sim.step();
    }
}
