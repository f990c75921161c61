//! LogicSim Core -- a synchronous digital-logic circuit simulator.
//!
//! The crate models a circuit as components (inputs, switches, NOT gates,
//! diodes, lamps, outputs) whose output pins own wires, and advances it in
//! discrete, globally synchronous steps.
//!
//! # Two-Phase Step
//!
//! Each call to [`engine::Simulator::step`] advances the circuit by one tick:
//!
//! 1. **Evaluate** -- Every component computes its next outputs from the
//!    *committed* values of the wires feeding its inputs. Results go to each
//!    wire's pending slot only.
//! 2. **Commit** -- Every wire publishes its pending value, then display
//!    state (`lit`) is refreshed.
//! 3. **Bookkeeping** -- Increment the tick counter and compute the state hash.
//!
//! A signal therefore crosses exactly one component per step, and the result
//! of a step never depends on the order components are visited in.
//!
//! # Wiring
//!
//! Components and wires live in `SlotMap` arenas and refer to each other by
//! key. Connecting registers the wire -> pin link and the pin -> wire
//! back-reference together; disconnecting and removing drop both together:
//!
//! ```rust,ignore
//! let input = sim.graph_mut().add_component(ComponentKind::Input, Position::new(0, 0));
//! let lamp = sim.graph_mut().add_component(ComponentKind::Lamp, Position::new(6, 0));
//! let wire = sim.graph_mut().connect(input, 0, lamp, 0, Vec::new())?;
//! sim.activate(input)?;
//! sim.step();
//! sim.step();
//! ```
//!
//! # Key Types
//!
//! - [`engine::Simulator`] -- Owns the circuit and runs the step.
//! - [`graph::CircuitGraph`] -- Components, wires and the mutation API.
//! - [`component::ComponentKind`] -- The closed set of component variants.
//! - [`gate`] -- Per-variant evaluation rules and the fan-in OR.
//! - [`command_queue::CommandQueue`] -- Edits submitted between steps.
//! - [`event::EventBuffer`] -- Ring buffer of simulation and edit events.
//! - [`serialize`] -- Versioned snapshots via bitcode.
//! - [`validation`] -- Structural invariant checks and determinism tooling.

pub mod command_queue;
pub mod component;
pub mod engine;
pub mod event;
pub mod gate;
pub mod graph;
pub mod id;
pub mod serialize;
pub mod sim;
pub mod validation;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
