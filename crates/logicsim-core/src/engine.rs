use std::collections::BTreeSet;

use slotmap::Key;

use crate::command_queue::{Command, CommandOutcome, CommandQueue};
use crate::component::ComponentKind;
use crate::event::{Event, EventBuffer, EventKind};
use crate::gate::{self, Evaluation};
use crate::graph::{CircuitGraph, GraphError};
use crate::id::*;
use crate::sim::{AdvanceResult, SimState, SimulationStrategy, StateHash, Ticks};
use crate::validation::check_graph;

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Owns a circuit and advances it in synchronous two-phase steps.
///
/// Each step evaluates every component against the committed wire values
/// (writing only pending slots), then commits every wire and refreshes
/// display state. No component ever observes a value produced in the same
/// step, so results do not depend on evaluation order.
#[derive(Debug)]
pub struct Simulator {
    pub(crate) graph: CircuitGraph,

    pub(crate) strategy: SimulationStrategy,

    pub sim_state: SimState,

    /// The most recently computed state hash.
    pub(crate) last_state_hash: u64,

    pub(crate) events: EventBuffer,

    /// Event kinds that are never recorded.
    pub(crate) suppressed: BTreeSet<EventKind>,
}

impl Simulator {
    /// Create a simulator with an empty circuit.
    pub fn new(strategy: SimulationStrategy) -> Self {
        Self::from_parts(strategy, CircuitGraph::new())
    }

    /// Create a simulator around an existing circuit. Wire values are taken
    /// as they are; the tick counter starts at zero.
    ///
    /// The circuit must pass [`check_graph`]; otherwise the violations are
    /// returned as [`GraphError::Inconsistent`].
    pub fn with_graph(
        strategy: SimulationStrategy,
        graph: CircuitGraph,
    ) -> Result<Self, GraphError> {
        let violations = check_graph(&graph);
        if !violations.is_empty() {
            return Err(GraphError::Inconsistent(violations));
        }
        Ok(Self::from_parts(strategy, graph))
    }

    fn from_parts(strategy: SimulationStrategy, graph: CircuitGraph) -> Self {
        let mut sim = Self {
            graph,
            strategy,
            sim_state: SimState::new(),
            last_state_hash: 0,
            events: EventBuffer::default(),
            suppressed: BTreeSet::new(),
        };
        sim.last_state_hash = sim.compute_state_hash();
        sim
    }

    /// Create a simulator whose event buffer holds at most `capacity` events.
    pub fn with_event_capacity(strategy: SimulationStrategy, capacity: usize) -> Self {
        let mut sim = Self::new(strategy);
        sim.events = EventBuffer::new(capacity);
        sim
    }

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    /// Direct access to the circuit. Edits made here are not recorded as
    /// events; use [`apply_commands`](Self::apply_commands) for that.
    pub fn graph_mut(&mut self) -> &mut CircuitGraph {
        &mut self.graph
    }

    pub fn strategy(&self) -> &SimulationStrategy {
        &self.strategy
    }

    /// Number of completed steps.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Toggle an input or switch. The new level reaches its output wire on
    /// the next step.
    pub fn activate(&mut self, component: ComponentId) -> Result<(), GraphError> {
        self.graph.activate(component)?;
        self.emit(Event::Activated {
            component,
            tick: self.sim_state.tick,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Event system
    // -----------------------------------------------------------------------

    /// Stop recording events of `kind`.
    pub fn suppress_event(&mut self, kind: EventKind) {
        self.suppressed.insert(kind);
    }

    pub fn unsuppress_event(&mut self, kind: EventKind) {
        self.suppressed.remove(&kind);
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }

    /// Remove and return all recorded events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Events lost because the buffer was full.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped_count()
    }

    fn emit(&mut self, event: Event) {
        if !self.suppressed.contains(&event.kind()) {
            self.events.push(event);
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply every queued command, in submission order. A rejected command
    /// leaves the circuit unchanged and does not stop the ones after it.
    pub fn apply_commands(
        &mut self,
        queue: &mut CommandQueue,
    ) -> Vec<Result<CommandOutcome, GraphError>> {
        queue
            .drain(self.sim_state.tick)
            .into_iter()
            .map(|command| {
                let result = self.apply_command(command);
                if let Err(err) = &result {
                    log::warn!("rejected command at tick {}: {err}", self.sim_state.tick);
                }
                result
            })
            .collect()
    }

    /// Apply a single edit immediately, recording the matching event.
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, GraphError> {
        let tick = self.sim_state.tick;
        match command {
            Command::AddComponent {
                kind,
                position,
                name,
                protected,
            } => {
                let component = self.add_component(kind, position);
                if let Some(c) = self.graph.component_mut(component) {
                    if let Some(name) = name {
                        c.set_name(name);
                    }
                    c.set_protected(protected);
                }
                Ok(CommandOutcome::Added(component))
            }
            Command::RemoveComponent { component } => {
                Ok(CommandOutcome::Removed(self.remove_component(component)))
            }
            Command::Connect {
                source,
                output,
                target,
                input,
                path,
            } => {
                let wire = self.graph.connect(source, output, target, input, path)?;
                self.emit(Event::Connected {
                    wire,
                    component: target,
                    input,
                    tick,
                });
                Ok(CommandOutcome::Connected(wire))
            }
            Command::Disconnect {
                wire,
                target,
                input,
            } => {
                let removed = self.graph.disconnect(wire, target, input)?;
                if removed > 0 {
                    self.emit(Event::Disconnected {
                        wire,
                        component: target,
                        input,
                        tick,
                    });
                }
                Ok(CommandOutcome::Disconnected(removed))
            }
            Command::Activate { component } => {
                self.activate(component)?;
                Ok(CommandOutcome::Applied)
            }
            Command::Move {
                component,
                position,
            } => {
                self.graph.move_component(component, position)?;
                Ok(CommandOutcome::Applied)
            }
            Command::Rename { component, name } => {
                self.graph
                    .component_mut(component)
                    .ok_or(GraphError::ComponentNotFound(component))?
                    .set_name(name);
                Ok(CommandOutcome::Applied)
            }
        }
    }

    /// Add a component and record `ComponentAdded`.
    pub fn add_component(&mut self, kind: ComponentKind, position: Position) -> ComponentId {
        let component = self.graph.add_component(kind, position);
        self.emit(Event::ComponentAdded {
            component,
            kind,
            tick: self.sim_state.tick,
        });
        component
    }

    /// Remove a component and record `ComponentRemoved`. Returns `false` if
    /// it was already gone.
    pub fn remove_component(&mut self, component: ComponentId) -> bool {
        if self.graph.remove_component(component).is_none() {
            return false;
        }
        self.emit(Event::ComponentRemoved {
            component,
            tick: self.sim_state.tick,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance the simulation according to the configured strategy.
    ///
    /// - **Tick mode**: `dt` is ignored; exactly one step runs.
    /// - **Delta mode**: `dt` is accumulated; as many fixed steps run as fit.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        let mut result = AdvanceResult::default();

        match self.strategy.clone() {
            SimulationStrategy::Tick => {
                self.step_internal(&mut result);
            }
            SimulationStrategy::Delta { fixed_timestep } => {
                self.sim_state.accumulator += dt;
                let step_size = fixed_timestep.max(1);
                while self.sim_state.accumulator >= step_size {
                    self.sim_state.accumulator -= step_size;
                    self.step_internal(&mut result);
                }
            }
        }

        result
    }

    /// Run exactly one step, regardless of strategy.
    pub fn step(&mut self) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        self.step_internal(&mut result);
        result
    }

    /// Run `n` steps.
    pub fn run(&mut self, n: u64) -> AdvanceResult {
        let mut total = AdvanceResult::default();
        for _ in 0..n {
            let r = self.step();
            total.steps_run += r.steps_run;
            total.wires_changed += r.wires_changed;
            total.lit_changed += r.lit_changed;
        }
        total
    }

    // -----------------------------------------------------------------------
    // Internal: single step
    // -----------------------------------------------------------------------

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        // Phase 1: Evaluate -- every component reads committed values only.
        self.phase_evaluate();

        // Phase 2: Commit -- pending becomes current, display state refreshes.
        self.phase_commit(result);

        // Phase 3: Bookkeeping -- tick counter and state hash.
        self.phase_bookkeeping();

        result.steps_run += 1;
    }

    fn phase_evaluate(&mut self) {
        for (id, evaluation) in self.evaluate_all() {
            self.graph.stage(id, evaluation);
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all(&self) -> Vec<(ComponentId, Evaluation)> {
        let wires = self.graph.wire_arena();
        self.graph
            .components()
            .map(|(id, c)| (id, gate::evaluate(c, wires)))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all(&self) -> Vec<(ComponentId, Evaluation)> {
        use rayon::prelude::*;

        let wires = self.graph.wire_arena();
        let components: Vec<_> = self.graph.components().collect();
        components
            .par_iter()
            .map(|&(id, c)| (id, gate::evaluate(c, wires)))
            .collect()
    }

    fn phase_commit(&mut self, result: &mut AdvanceResult) {
        let tick = self.sim_state.tick + 1;
        let outcome = self.graph.commit();

        result.wires_changed += outcome.wires.len();
        result.lit_changed += outcome.lit.len();

        for (wire, value) in outcome.wires {
            self.emit(Event::WireChanged { wire, value, tick });
        }
        for (component, lit) in outcome.lit {
            self.emit(Event::LitChanged {
                component,
                lit,
                tick,
            });
        }
    }

    fn phase_bookkeeping(&mut self) {
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        log::trace!(
            "tick {} hash {:016x}",
            self.sim_state.tick,
            self.last_state_hash
        );
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// The hash computed at the end of the most recent step (or at
    /// construction).
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Hash the full circuit state: tick, components, wire values and
    /// topology, in slot order.
    pub fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        for (id, component) in self.graph.components() {
            hasher.write_u64(id.data().as_ffi());
            hasher.write_str(component.kind().type_name());
            hasher.write_str(component.name());
            hasher.write_i32(component.position().x);
            hasher.write_i32(component.position().y);
            hasher.write_bool(component.is_protected());
            hasher.write_bool(component.is_lit());
            hasher.write_bool(component.pending_lit);
            for pin in component.inputs() {
                hasher.write_u64(pin.wires().len() as u64);
                for wire in pin.wires() {
                    hasher.write_u64(wire.data().as_ffi());
                }
            }
        }

        for (id, wire) in self.graph.wires() {
            hasher.write_u64(id.data().as_ffi());
            hasher.write_u64(wire.source().data().as_ffi());
            hasher.write_u64(wire.output_index() as u64);
            hasher.write_bool(wire.current());
            hasher.write_bool(wire.next());
            hasher.write_u64(wire.connections().len() as u64);
            for conn in wire.connections() {
                hasher.write_u64(conn.component.data().as_ffi());
                hasher.write_u64(conn.input as u64);
                hasher.write_u64(conn.path.len() as u64);
                for point in &conn.path {
                    hasher.write_i32(point.x);
                    hasher.write_i32(point.y);
                }
            }
        }

        hasher.finish()
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulationStrategy::Tick)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
