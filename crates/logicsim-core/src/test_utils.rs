//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature). Circuits built here go straight into the graph and
//! record no edit events.

use crate::component::ComponentKind;
use crate::engine::Simulator;
use crate::id::*;
use crate::sim::SimulationStrategy;

// ===========================================================================
// Simulator setup
// ===========================================================================

pub fn new_sim() -> Simulator {
    Simulator::new(SimulationStrategy::Tick)
}

/// Add a component, laid out in a column so positions stay distinct.
pub fn add(sim: &mut Simulator, kind: ComponentKind) -> ComponentId {
    let row = sim.graph().component_count() as i32;
    sim.graph_mut().add_component(kind, Position::new(0, row * 2))
}

/// Connect output 0 of `from` to input 0 of `to`.
pub fn connect(sim: &mut Simulator, from: ComponentId, to: ComponentId) -> WireId {
    sim.graph_mut()
        .connect(from, 0, to, 0, Vec::new())
        .unwrap()
}

// ===========================================================================
// Queries
// ===========================================================================

/// Committed value of output 0.
pub fn out(sim: &Simulator, component: ComponentId) -> bool {
    sim.graph().output_value(component, 0).unwrap()
}

/// Display state of a component.
pub fn lit(sim: &Simulator, component: ComponentId) -> bool {
    sim.graph()
        .component(component)
        .map(|c| c.is_lit())
        .unwrap_or(false)
}

// ===========================================================================
// Circuits
// ===========================================================================

/// Input -> NOT -> Lamp. Returns `(sim, input, not, lamp)`.
pub fn input_not_lamp() -> (Simulator, ComponentId, ComponentId, ComponentId) {
    let mut sim = new_sim();
    let input = add(&mut sim, ComponentKind::Input);
    let not = add(&mut sim, ComponentKind::NotGate);
    let lamp = add(&mut sim, ComponentKind::Lamp);
    connect(&mut sim, input, not);
    connect(&mut sim, not, lamp);
    (sim, input, not, lamp)
}

fn chain(sim: &mut Simulator, source: ComponentId, kind: ComponentKind, len: usize) -> Vec<ComponentId> {
    let mut prev = source;
    (0..len)
        .map(|_| {
            let next = add(sim, kind);
            connect(sim, prev, next);
            prev = next;
            next
        })
        .collect()
}

/// `len` diodes in series fed by `source`.
pub fn diode_chain(sim: &mut Simulator, source: ComponentId, len: usize) -> Vec<ComponentId> {
    chain(sim, source, ComponentKind::Diode, len)
}

/// `len` NOT gates in series fed by `source`.
pub fn not_chain(sim: &mut Simulator, source: ComponentId, len: usize) -> Vec<ComponentId> {
    chain(sim, source, ComponentKind::NotGate, len)
}

/// A closed ring of `len` NOT gates. Odd lengths oscillate forever.
pub fn ring_oscillator(sim: &mut Simulator, len: usize) -> Vec<ComponentId> {
    let gates: Vec<ComponentId> = (0..len).map(|_| add(sim, ComponentKind::NotGate)).collect();
    for i in 0..len {
        connect(sim, gates[i], gates[(i + 1) % len]);
    }
    gates
}
