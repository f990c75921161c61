use crate::component::{Component, ComponentKind, DisplayRule};
use crate::gate::{self, Evaluation};
use crate::id::*;
use crate::validation::Violation;
use crate::wire::{Connection, Wire};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("component not found: {0:?}")]
    ComponentNotFound(ComponentId),
    #[error("wire not found: {0:?}")]
    WireNotFound(WireId),
    #[error("invalid input pin {index} on {component:?} (has {count})")]
    InvalidInputPin {
        component: ComponentId,
        index: usize,
        count: usize,
    },
    #[error("invalid output pin {index} on {component:?} (has {count})")]
    InvalidOutputPin {
        component: ComponentId,
        index: usize,
        count: usize,
    },
    #[error("component {0:?} cannot be activated")]
    NotInteractive(ComponentId),
    #[error("circuit has {} structural violation(s), first: {:?}", .0.len(), .0.first())]
    Inconsistent(Vec<Violation>),
}

// ---------------------------------------------------------------------------
// Commit outcome
// ---------------------------------------------------------------------------

/// What changed during a commit, in slot order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Wires whose committed value flipped, with the new value.
    pub wires: Vec<(WireId, bool)>,
    /// Components whose display state flipped, with the new state.
    pub lit: Vec<(ComponentId, bool)>,
}

// ---------------------------------------------------------------------------
// CircuitGraph
// ---------------------------------------------------------------------------

/// The circuit: components and the wires owned by their output pins.
///
/// Both live in `SlotMap` arenas and refer to each other only by key, so
/// feedback loops in the circuit never become ownership cycles. The
/// wire -> input-pin connection list and the input-pin -> wire back-reference
/// list are only ever changed together, by [`connect_wire`],
/// [`disconnect`] and [`remove_component`].
///
/// [`connect_wire`]: CircuitGraph::connect_wire
/// [`disconnect`]: CircuitGraph::disconnect
/// [`remove_component`]: CircuitGraph::remove_component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitGraph {
    components: SlotMap<ComponentId, Component>,
    wires: SlotMap<WireId, Wire>,
}

impl CircuitGraph {
    /// Create a new, empty circuit.
    pub fn new() -> Self {
        Self {
            components: SlotMap::with_key(),
            wires: SlotMap::with_key(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a component of the given kind. One wire is created per output
    /// pin; all wires start low.
    pub fn add_component(&mut self, kind: ComponentKind, position: Position) -> ComponentId {
        let wires = &mut self.wires;
        let id = self.components.insert_with_key(|id| {
            let output_wires = (0..kind.output_count())
                .map(|index| wires.insert(Wire::new(id, index)))
                .collect();
            Component::new(kind, position, output_wires)
        });
        log::debug!("added {} {:?} at ({}, {})", kind.type_name(), id, position.x, position.y);
        id
    }

    /// Insert a component with a custom display name.
    pub fn add_named_component(
        &mut self,
        kind: ComponentKind,
        position: Position,
        name: impl Into<String>,
    ) -> ComponentId {
        let id = self.add_component(kind, position);
        if let Some(component) = self.components.get_mut(id) {
            component.name = name.into();
        }
        id
    }

    /// Connect output pin `output` of `source` to input pin `input` of
    /// `target`. Returns the source pin's wire.
    pub fn connect(
        &mut self,
        source: ComponentId,
        output: usize,
        target: ComponentId,
        input: usize,
        path: Vec<Waypoint>,
    ) -> Result<WireId, GraphError> {
        let wire = self.output_wire(source, output)?;
        self.connect_wire(wire, target, input, path)?;
        Ok(wire)
    }

    /// Register a new connection from `wire` to input pin `input` of
    /// `target`, together with its back-reference on that pin.
    ///
    /// Cycles are allowed. On error nothing is changed.
    pub fn connect_wire(
        &mut self,
        wire: WireId,
        target: ComponentId,
        input: usize,
        path: Vec<Waypoint>,
    ) -> Result<(), GraphError> {
        let Some(wire_data) = self.wires.get_mut(wire) else {
            return Err(GraphError::WireNotFound(wire));
        };
        let Some(component) = self.components.get_mut(target) else {
            return Err(GraphError::ComponentNotFound(target));
        };
        let count = component.inputs.len();
        let Some(pin) = component.inputs.get_mut(input) else {
            return Err(GraphError::InvalidInputPin {
                component: target,
                index: input,
                count,
            });
        };

        pin.wires.push(wire);
        wire_data.connections.push(Connection {
            component: target,
            input,
            path,
        });
        log::debug!("connected {wire:?} -> {target:?}[{input}]");
        Ok(())
    }

    /// Remove every connection between `wire` and input pin `input` of
    /// `target`, along with the matching back-references. Returns how many
    /// connections were removed.
    ///
    /// Removing something that is not there is a no-op, including an unknown
    /// wire or target. An out-of-range `input` on an existing target is an
    /// error.
    pub fn disconnect(
        &mut self,
        wire: WireId,
        target: ComponentId,
        input: usize,
    ) -> Result<usize, GraphError> {
        if let Some(component) = self.components.get(target) {
            if input >= component.inputs.len() {
                return Err(GraphError::InvalidInputPin {
                    component: target,
                    index: input,
                    count: component.inputs.len(),
                });
            }
        }
        let removed = self.detach(wire, target, input);
        if removed > 0 {
            log::debug!("disconnected {wire:?} -> {target:?}[{input}] ({removed} connections)");
        }
        Ok(removed)
    }

    /// Drop both sides of every `wire` -> `target[input]` connection.
    fn detach(&mut self, wire: WireId, target: ComponentId, input: usize) -> usize {
        let removed = self
            .wires
            .get_mut(wire)
            .map(|w| w.remove_connections_to(target, input))
            .unwrap_or(0);
        if let Some(pin) = self
            .components
            .get_mut(target)
            .and_then(|c| c.inputs.get_mut(input))
        {
            pin.wires.retain(|&w| w != wire);
        }
        removed
    }

    /// Remove a component: detach every wire feeding its inputs, destroy the
    /// wires owned by its outputs, then drop it. Returns the removed
    /// component, or `None` if it was already gone.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Component> {
        let component = self.components.get(id)?;

        let feeding: Vec<(WireId, usize)> = component
            .inputs
            .iter()
            .enumerate()
            .flat_map(|(index, pin)| pin.wires.iter().map(move |&w| (w, index)))
            .collect();
        let owned: Vec<WireId> = component.outputs.iter().map(|pin| pin.wire).collect();

        for (wire, index) in feeding {
            self.detach(wire, id, index);
        }
        for wire in owned {
            self.destroy_wire(wire);
        }

        let removed = self.components.remove(id);
        log::debug!("removed {id:?}");
        removed
    }

    /// Remove a wire and every back-reference to it.
    fn destroy_wire(&mut self, wire: WireId) {
        let Some(data) = self.wires.remove(wire) else {
            return;
        };
        for conn in &data.connections {
            if let Some(pin) = self
                .components
                .get_mut(conn.component)
                .and_then(|c| c.inputs.get_mut(conn.input))
            {
                pin.wires.retain(|&w| w != wire);
            }
        }
    }

    /// Remove every listed component that is not protected. Returns the
    /// protected ones that were kept.
    pub fn remove_components(&mut self, ids: &[ComponentId]) -> Vec<ComponentId> {
        let mut kept = Vec::new();
        for &id in ids {
            match self.components.get(id) {
                Some(c) if c.protected => kept.push(id),
                Some(_) => {
                    self.remove_component(id);
                }
                None => {}
            }
        }
        kept
    }

    /// Flip the toggle state of an interactive component. Its output wire
    /// changes on the next step, not now.
    pub fn activate(&mut self, id: ComponentId) -> Result<(), GraphError> {
        let component = self
            .components
            .get_mut(id)
            .ok_or(GraphError::ComponentNotFound(id))?;
        if !component.activate() {
            return Err(GraphError::NotInteractive(id));
        }
        log::debug!("activated {id:?} (now {})", component.lit);
        Ok(())
    }

    /// Move a component on the canvas. Has no effect on simulation.
    pub fn move_component(&mut self, id: ComponentId, position: Position) -> Result<(), GraphError> {
        let component = self
            .components
            .get_mut(id)
            .ok_or(GraphError::ComponentNotFound(id))?;
        component.position = position;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Two-phase step support
    // -----------------------------------------------------------------------

    /// Evaluate one component against the committed wire values.
    pub fn evaluate(&self, id: ComponentId) -> Option<Evaluation> {
        self.components
            .get(id)
            .map(|c| gate::evaluate(c, &self.wires))
    }

    /// Write an evaluation into the pending slots of `id`'s wires. Committed
    /// values are untouched.
    pub(crate) fn stage(&mut self, id: ComponentId, evaluation: Evaluation) {
        let Some(component) = self.components.get_mut(id) else {
            return;
        };
        for (pin, value) in component.outputs.iter().zip(evaluation.outputs) {
            if let Some(wire) = self.wires.get_mut(pin.wire) {
                wire.next = value;
            }
        }
        if let Some(lit) = evaluation.lit {
            component.pending_lit = lit;
        }
    }

    /// Publish every pending wire value, then refresh display state from the
    /// newly committed values.
    pub(crate) fn commit(&mut self) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();

        for (id, wire) in self.wires.iter_mut() {
            if wire.commit() {
                outcome.wires.push((id, wire.current));
            }
        }

        for (id, component) in self.components.iter_mut() {
            let lit = match component.kind.display_rule() {
                DisplayRule::Toggle => component.lit,
                DisplayRule::Latched => component.pending_lit,
                DisplayRule::MirrorOutput => component
                    .outputs
                    .first()
                    .and_then(|pin| self.wires.get(pin.wire))
                    .is_some_and(Wire::current),
            };
            if lit != component.lit {
                component.lit = lit;
                outcome.lit.push((id, lit));
            }
        }

        outcome
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Mutable access for name, position, protection and toggle state.
    /// Pin wiring stays private to the graph.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id)
    }

    /// The wire owned by output pin `index` of `component`.
    pub fn output_wire(&self, component: ComponentId, index: usize) -> Result<WireId, GraphError> {
        let c = self
            .components
            .get(component)
            .ok_or(GraphError::ComponentNotFound(component))?;
        c.outputs
            .get(index)
            .map(|pin| pin.wire)
            .ok_or(GraphError::InvalidOutputPin {
                component,
                index,
                count: c.outputs.len(),
            })
    }

    /// Wires driving input pin `index` of `component`.
    pub fn input_wires(&self, component: ComponentId, index: usize) -> Result<&[WireId], GraphError> {
        let c = self
            .components
            .get(component)
            .ok_or(GraphError::ComponentNotFound(component))?;
        c.inputs
            .get(index)
            .map(|pin| pin.wires.as_slice())
            .ok_or(GraphError::InvalidInputPin {
                component,
                index,
                count: c.inputs.len(),
            })
    }

    /// The level seen by input pin `index`: OR of its drivers' committed values.
    pub fn input_value(&self, component: ComponentId, index: usize) -> Result<bool, GraphError> {
        let drivers = self.input_wires(component, index)?;
        Ok(gate::fan_in(drivers, &self.wires))
    }

    /// Committed value of output pin `index` of `component`.
    pub fn output_value(&self, component: ComponentId, index: usize) -> Result<bool, GraphError> {
        let wire = self.output_wire(component, index)?;
        self.wires
            .get(wire)
            .map(Wire::current)
            .ok_or(GraphError::WireNotFound(wire))
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Total number of connections across all wires.
    pub fn connection_count(&self) -> usize {
        self.wires.values().map(|w| w.connections.len()).sum()
    }

    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn contains_wire(&self, id: WireId) -> bool {
        self.wires.contains_key(id)
    }

    /// Iterate over all components in slot order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter()
    }

    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.keys()
    }

    /// Iterate over all wires in slot order.
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter()
    }

    pub(crate) fn wire_arena(&self) -> &SlotMap<WireId, Wire> {
        &self.wires
    }
}

// ===========================================================================
// Tests
// ===========================================================================
