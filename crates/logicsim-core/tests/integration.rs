//! Integration tests for the LogicSim core.
//!
//! These tests exercise end-to-end behavior through the public API: building
//! circuits, stepping, activation, removal, commands, events and persistence.

use logicsim_core::command_queue::{Command, CommandOutcome, CommandQueue};
use logicsim_core::component::ComponentKind;
use logicsim_core::engine::Simulator;
use logicsim_core::event::{Event, EventKind};
use logicsim_core::graph::{CircuitGraph, GraphError};
use logicsim_core::id::*;
use logicsim_core::sim::SimulationStrategy;
use logicsim_core::test_utils::*;
use logicsim_core::validation::check_graph;

// ===========================================================================
// Test 1: Input -> NOT -> Lamp
// ===========================================================================

#[test]
fn inverter_lights_lamp_after_two_steps() {
    let (mut sim, input, _not, lamp) = input_not_lamp();
    assert!(!lit(&sim, input));

    sim.step();
    assert!(!lit(&sim, lamp), "one step is not enough");
    sim.step();
    assert!(lit(&sim, lamp));

    // Stable from here on.
    for _ in 0..10 {
        sim.step();
        assert!(lit(&sim, lamp));
    }
}

// ===========================================================================
// Test 2: activation is visible only after the next step
// ===========================================================================

#[test]
fn activation_waits_for_next_step() {
    let mut sim = new_sim();
    let switch = add(&mut sim, ComponentKind::Switch);
    let lamp = add(&mut sim, ComponentKind::Lamp);
    connect(&mut sim, switch, lamp);

    sim.activate(switch).unwrap();
    assert!(lit(&sim, switch));
    assert_eq!(sim.graph().component(switch).unwrap().name(), "ON");
    assert!(!out(&sim, switch), "wire must not change before a step");

    sim.step();
    assert!(out(&sim, switch));

    sim.activate(switch).unwrap();
    assert_eq!(sim.graph().component(switch).unwrap().name(), "OFF");
    assert!(out(&sim, switch));
    sim.step();
    assert!(!out(&sim, switch));
}

// ===========================================================================
// Test 3: delay property
// ===========================================================================

#[test]
fn not_gate_output_follows_input_one_step_later() {
    let mut sim = new_sim();
    let input = add(&mut sim, ComponentKind::Input);
    let not = add(&mut sim, ComponentKind::NotGate);
    connect(&mut sim, input, not);

    sim.run(2);
    assert!(out(&sim, not));

    sim.activate(input).unwrap();
    sim.step();
    // Input wire is now high; NOT has not seen it yet.
    assert!(out(&sim, input));
    assert!(out(&sim, not));
    sim.step();
    assert!(!out(&sim, not));
}

// ===========================================================================
// Test 4: fan-out and fan-in
// ===========================================================================

#[test]
fn fan_out_broadcasts_in_one_step() {
    let mut sim = new_sim();
    let input = add(&mut sim, ComponentKind::Input);
    let diodes: Vec<_> = (0..8).map(|_| add(&mut sim, ComponentKind::Diode)).collect();
    for &d in &diodes {
        connect(&mut sim, input, d);
    }

    sim.activate(input).unwrap();
    sim.step();
    assert!(diodes.iter().all(|&d| !out(&sim, d)));
    sim.step();
    assert!(diodes.iter().all(|&d| out(&sim, d)));
}

#[test]
fn fan_in_any_high_driver_wins() {
    let mut sim = new_sim();
    let inputs: Vec<_> = (0..3).map(|_| add(&mut sim, ComponentKind::Input)).collect();
    let not = add(&mut sim, ComponentKind::NotGate);
    for &i in &inputs {
        connect(&mut sim, i, not);
    }

    sim.run(2);
    assert!(out(&sim, not), "no driver high");

    sim.activate(inputs[1]).unwrap();
    sim.run(2);
    assert!(!out(&sim, not), "one driver high");
    assert!(sim.graph().input_value(not, 0).unwrap());

    sim.activate(inputs[1]).unwrap();
    sim.run(2);
    assert!(out(&sim, not));
}

#[test]
fn output_component_lights_like_lamp() {
    let mut sim = new_sim();
    let input = add(&mut sim, ComponentKind::Input);
    let output = add(&mut sim, ComponentKind::Output);
    connect(&mut sim, input, output);
    sim.activate(input).unwrap();
    sim.run(2);
    assert!(lit(&sim, output));
}

#[test]
fn unconnected_indicators_stay_dark() {
    let mut sim = new_sim();
    let lamp = add(&mut sim, ComponentKind::Lamp);
    let output = add(&mut sim, ComponentKind::Output);
    let diode = add(&mut sim, ComponentKind::Diode);
    sim.run(5);
    assert!(!lit(&sim, lamp));
    assert!(!lit(&sim, output));
    assert!(!out(&sim, diode));
}

// ===========================================================================
// Test 5: feedback
// ===========================================================================

#[test]
fn odd_ring_oscillates_even_ring_holds() {
    let mut sim = new_sim();
    let odd = ring_oscillator(&mut sim, 3);
    let even = ring_oscillator(&mut sim, 4);

    let mut odd_history = Vec::new();
    let mut even_history = Vec::new();
    for _ in 0..24 {
        sim.step();
        odd_history.push(out(&sim, odd[0]));
        even_history.push(out(&sim, even[0]));
    }
    // An odd ring never settles.
    assert!(odd_history.windows(2).any(|w| w[0] != w[1]));
    assert!(odd_history[12..].windows(2).any(|w| w[0] != w[1]));
    // A ring of N gates started all-low repeats with period 2.
    assert_eq!(even_history[20..], even_history[18..22]);
}

#[test]
fn not_gate_display_mirrors_output() {
    let mut sim = new_sim();
    let not = add(&mut sim, ComponentKind::NotGate);
    connect(&mut sim, not, not);
    let mut previous = out(&sim, not);
    for step in 0..6 {
        sim.step();
        let current = out(&sim, not);
        assert_ne!(current, previous, "output must flip on step {step}");
        assert_eq!(lit(&sim, not), current);
        previous = current;
    }
}

// ===========================================================================
// Test 6: removal cleanup
// ===========================================================================

#[test]
fn removal_leaves_no_references() {
    let mut sim = new_sim();
    let input = add(&mut sim, ComponentKind::Input);
    let middle = add(&mut sim, ComponentKind::Diode);
    let lamps: Vec<_> = (0..3).map(|_| add(&mut sim, ComponentKind::Lamp)).collect();
    let feed = connect(&mut sim, input, middle);
    let drive = connect(&mut sim, middle, middle);
    for &l in &lamps {
        connect(&mut sim, middle, l);
    }

    assert!(sim.remove_component(middle));
    assert!(!sim.remove_component(middle));

    let graph = sim.graph();
    assert!(!graph.contains_wire(drive));
    assert!(graph.wire(feed).unwrap().connections().is_empty());
    for &l in &lamps {
        assert!(graph.input_wires(l, 0).unwrap().is_empty());
    }
    for (_, wire) in graph.wires() {
        assert!(wire.connections().iter().all(|c| c.component != middle));
        assert_ne!(wire.source(), middle);
    }
    assert!(check_graph(graph).is_empty());

    // Still steps fine.
    sim.run(3);
}

#[test]
fn bulk_delete_skips_protected() {
    let mut sim = new_sim();
    let (a, b, c) = (
        add(&mut sim, ComponentKind::Input),
        add(&mut sim, ComponentKind::NotGate),
        add(&mut sim, ComponentKind::Lamp),
    );
    connect(&mut sim, a, b);
    connect(&mut sim, b, c);
    sim.graph_mut().component_mut(c).unwrap().set_protected(true);

    let kept = sim.graph_mut().remove_components(&[a, b, c]);
    assert_eq!(kept, vec![c]);
    assert_eq!(sim.graph().component_count(), 1);
    assert!(sim.graph().input_wires(c, 0).unwrap().is_empty());
    assert!(check_graph(sim.graph()).is_empty());
}

// ===========================================================================
// Test 7: rejected mutations change nothing
// ===========================================================================

#[test]
fn bad_pin_index_is_rejected_atomically() {
    let (mut sim, input, not, lamp) = input_not_lamp();
    let before = sim.graph().clone();

    let err = sim
        .graph_mut()
        .connect(input, 0, lamp, 7, Vec::new())
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::InvalidInputPin {
            component: lamp,
            index: 7,
            count: 1
        }
    );
    let wire = sim.graph().output_wire(not, 0).unwrap();
    assert!(sim.graph_mut().disconnect(wire, lamp, 3).is_err());

    assert!(sim.graph().components().eq(before.components()));
    assert!(sim.graph().wires().eq(before.wires()));
}

#[test]
fn disconnecting_nothing_is_a_noop() {
    let (mut sim, input, _, lamp) = input_not_lamp();
    let wire = sim.graph().output_wire(input, 0).unwrap();
    let before = sim.graph().clone();
    assert_eq!(sim.graph_mut().disconnect(wire, lamp, 0).unwrap(), 0);
    assert!(sim.graph().components().eq(before.components()));
    assert!(sim.graph().wires().eq(before.wires()));
}

// ===========================================================================
// Test 8: commands and events
// ===========================================================================

#[test]
fn editing_session_through_commands() {
    let mut sim = new_sim();
    let mut queue = CommandQueue::with_max_history(16);

    queue.push(Command::AddComponent {
        kind: ComponentKind::Input,
        position: Position::new(0, 0),
        name: Some("A".into()),
        protected: false,
    });
    queue.push(Command::AddComponent {
        kind: ComponentKind::Lamp,
        position: Position::new(8, 0),
        name: None,
        protected: false,
    });
    let ids: Vec<ComponentId> = sim
        .apply_commands(&mut queue)
        .into_iter()
        .filter_map(|r| match r {
            Ok(CommandOutcome::Added(id)) => Some(id),
            _ => None,
        })
        .collect();
    let (input, lamp) = (ids[0], ids[1]);

    queue.push(Command::Connect {
        source: input,
        output: 0,
        target: lamp,
        input: 0,
        path: vec![Waypoint::new(4, 0), Waypoint::new(4, 1)],
    });
    queue.push(Command::Activate { component: input });
    sim.apply_commands(&mut queue);
    sim.run(2);
    assert!(lit(&sim, lamp));

    sim.step();
    queue.push(Command::RemoveComponent { component: input });
    sim.apply_commands(&mut queue);
    sim.run(2);
    assert!(!lit(&sim, lamp));

    assert_eq!(queue.history().len(), 5);
    assert_eq!(queue.history()[4].0, 3);

    let kinds: Vec<EventKind> = sim.events().map(Event::kind).collect();
    assert!(kinds.contains(&EventKind::Connected));
    assert!(kinds.contains(&EventKind::ComponentRemoved));
    let lamp_events: Vec<(bool, u64)> = sim
        .events()
        .filter_map(|e| match *e {
            Event::LitChanged { component, lit, tick } if component == lamp => Some((lit, tick)),
            _ => None,
        })
        .collect();
    assert_eq!(lamp_events, vec![(true, 2), (false, 4)]);
}

// ===========================================================================
// Test 9: persistence
// ===========================================================================

#[test]
fn snapshot_round_trip_mid_oscillation() {
    let mut sim = new_sim();
    let ring = ring_oscillator(&mut sim, 5);
    let input = add(&mut sim, ComponentKind::Input);
    let chain = not_chain(&mut sim, input, 3);
    sim.activate(input).unwrap();
    sim.run(4);

    let mut restored = Simulator::deserialize(&sim.serialize().unwrap()).unwrap();
    for _ in 0..15 {
        sim.step();
        restored.step();
        for &id in ring.iter().chain(&chain) {
            assert_eq!(out(&sim, id), out(&restored, id));
        }
    }
    assert_eq!(sim.state_hash(), restored.state_hash());
}

#[test]
fn graph_round_trips_through_json() {
    let (mut sim, input, not, lamp) = input_not_lamp();
    sim.graph_mut()
        .move_component(lamp, Position::new(12, -3))
        .unwrap();
    sim.activate(input).unwrap();
    sim.run(3);

    let json = serde_json::to_string(sim.graph()).unwrap();
    let graph: CircuitGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(graph.component_count(), 3);
    assert_eq!(graph.component(lamp).unwrap().position(), Position::new(12, -3));
    assert_eq!(graph.component(not).unwrap().kind(), ComponentKind::NotGate);
    assert_eq!(
        graph.output_value(input, 0).unwrap(),
        sim.graph().output_value(input, 0).unwrap()
    );
    assert!(check_graph(&graph).is_empty());

    let mut reloaded = Simulator::with_graph(SimulationStrategy::Tick, graph).unwrap();
    reloaded.run(3);
    sim.run(3);
    assert_eq!(lit(&reloaded, lamp), lit(&sim, lamp));
}

// ===========================================================================
// Test 10: delta strategy
// ===========================================================================

#[test]
fn delta_strategy_runs_whole_steps() {
    let mut sim = Simulator::new(SimulationStrategy::Delta { fixed_timestep: 10 });
    let not = add(&mut sim, ComponentKind::NotGate);
    connect(&mut sim, not, not);

    let mut steps = 0;
    for _ in 0..25 {
        steps += sim.advance(4).steps_run;
    }
    assert_eq!(steps, 10);
    assert_eq!(sim.tick(), 10);
    assert_eq!(sim.sim_state.accumulator, 0);
    // Even number of flips: back to the first step's value.
    assert!(!out(&sim, not));
}
