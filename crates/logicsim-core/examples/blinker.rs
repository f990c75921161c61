//! Blinker example: a NOT gate wired to itself drives a lamp.
//!
//! Shows the one-step delay per component: the gate flips every step, and
//! the lamp follows one step behind. A switch gates a second lamp through a
//! diode.
//!
//! Run with: `cargo run -p logicsim-core --example blinker`

use logicsim_core::component::ComponentKind;
use logicsim_core::engine::Simulator;
use logicsim_core::graph::GraphError;
use logicsim_core::id::*;
use logicsim_core::sim::SimulationStrategy;

fn main() -> Result<(), GraphError> {
    let mut sim = Simulator::new(SimulationStrategy::Tick);

    // --- Build: NOT (self loop) -> Lamp, Switch -> Diode -> Lamp ---

    let graph = sim.graph_mut();
    let not = graph.add_component(ComponentKind::NotGate, Position::new(0, 0));
    let blink = graph.add_component(ComponentKind::Lamp, Position::new(6, 0));
    let switch = graph.add_component(ComponentKind::Switch, Position::new(0, 3));
    let diode = graph.add_component(ComponentKind::Diode, Position::new(4, 3));
    let status = graph.add_named_component(ComponentKind::Lamp, Position::new(10, 3), "STATUS");

    // The self loop is routed around the gate's top edge.
    graph.connect(
        not,
        0,
        not,
        0,
        vec![
            Waypoint::new(4, 0),
            Waypoint::new(4, -1),
            Waypoint::new(-1, -1),
            Waypoint::new(-1, 0),
        ],
    )?;
    graph.connect(not, 0, blink, 0, Vec::new())?;
    graph.connect(switch, 0, diode, 0, Vec::new())?;
    graph.connect(diode, 0, status, 0, Vec::new())?;

    // --- Run ---

    println!("tick | NOT | blink | switch | status");
    println!("-----+-----+-------+--------+-------");
    for tick in 1..=12 {
        if tick == 4 || tick == 9 {
            sim.activate(switch)?;
        }
        sim.step();

        let g = sim.graph();
        let lit = |id| g.component(id).map(|c| c.is_lit()).unwrap_or(false);
        let switch_name = g.component(switch).map(|c| c.name()).unwrap_or("?");
        println!(
            "{:>4} | {:>3} | {:>5} | {:>6} | {:>6}",
            sim.tick(),
            u8::from(g.output_value(not, 0)?),
            if lit(blink) { "*" } else { "." },
            switch_name,
            if lit(status) { "*" } else { "." },
        );
    }

    Ok(())
}
