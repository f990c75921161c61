//! Save/load example: snapshot round-trip.
//!
//! Builds a small circuit, runs it, serializes the simulator to bytes,
//! restores it into a new simulator and checks both stay in lockstep.
//!
//! Run with: `cargo run -p logicsim-core --example save_load`

use logicsim_core::command_queue::{Command, CommandOutcome, CommandQueue};
use logicsim_core::component::ComponentKind;
use logicsim_core::engine::Simulator;
use logicsim_core::id::*;
use logicsim_core::sim::SimulationStrategy;
use logicsim_core::validation::{check_graph, diff_simulators, validate_determinism};

fn main() {
    // --- Step 1: Build through the command queue ---

    let mut sim = Simulator::new(SimulationStrategy::Delta { fixed_timestep: 16 });
    let mut queue = CommandQueue::new();
    for (kind, x) in [
        (ComponentKind::Input, 0),
        (ComponentKind::NotGate, 6),
        (ComponentKind::NotGate, 12),
        (ComponentKind::Output, 18),
    ] {
        queue.push(Command::AddComponent {
            kind,
            position: Position::new(x, 0),
            name: None,
            protected: kind == ComponentKind::Input,
        });
    }
    let ids: Vec<ComponentId> = sim
        .apply_commands(&mut queue)
        .into_iter()
        .filter_map(|result| match result {
            Ok(CommandOutcome::Added(id)) => Some(id),
            _ => None,
        })
        .collect();

    for pair in ids.windows(2) {
        queue.push(Command::Connect {
            source: pair[0],
            output: 0,
            target: pair[1],
            input: 0,
            path: Vec::new(),
        });
    }
    queue.push(Command::Activate { component: ids[0] });
    for result in sim.apply_commands(&mut queue) {
        if let Err(err) = result {
            eprintln!("edit rejected: {err}");
        }
    }

    // ~10 frames at 60 Hz, in milliseconds.
    for _ in 0..10 {
        sim.advance(17);
    }
    println!("Ran to tick {} (hash {:016x})", sim.tick(), sim.state_hash());

    // --- Step 2: Save and restore ---

    let data = match sim.serialize() {
        Ok(data) => data,
        Err(err) => {
            eprintln!("serialize failed: {err}");
            return;
        }
    };
    println!("Snapshot: {} bytes", data.len());

    let mut restored = match Simulator::deserialize(&data) {
        Ok(restored) => restored,
        Err(err) => {
            eprintln!("deserialize failed: {err}");
            return;
        }
    };
    println!(
        "Restored at tick {}, structural violations: {}",
        restored.tick(),
        check_graph(restored.graph()).len()
    );

    // --- Step 3: Compare ---

    for _ in 0..5 {
        sim.step();
        restored.step();
    }
    let diff = diff_simulators(&sim, &restored);
    println!("Identical after 5 more steps: {}", diff.is_identical);

    match validate_determinism(&data, 50) {
        Ok(result) => println!("Deterministic over 50 steps: {}", result.is_deterministic),
        Err(err) => eprintln!("determinism check failed: {err}"),
    }

    let output = ids[ids.len() - 1];
    let lit = sim
        .graph()
        .component(output)
        .map(|c| c.is_lit())
        .unwrap_or(false);
    println!("Output is {}", if lit { "lit" } else { "dark" });
}
