//! Wires: one output pin's broadcast to any number of input pins.

use serde::{Deserialize, Serialize};

use crate::id::{ComponentId, Waypoint};

/// One registration of a wire onto a target input pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The component owning the target input pin.
    pub component: ComponentId,
    /// Index of the target input pin on `component`.
    pub input: usize,
    /// Routing points between the source pin and the target pin.
    pub path: Vec<Waypoint>,
}

impl Connection {
    /// Whether this connection lands on the given input pin.
    pub fn targets(&self, component: ComponentId, input: usize) -> bool {
        self.component == component && self.input == input
    }
}

/// The double-buffered signal carried from one output pin to its fan-out.
///
/// `current` is the committed value every reader sees; `next` is written
/// during the evaluate phase and copied into `current` on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub(crate) source: ComponentId,
    pub(crate) output: usize,
    pub(crate) connections: Vec<Connection>,
    pub(crate) current: bool,
    pub(crate) next: bool,
}

impl Wire {
    pub(crate) fn new(source: ComponentId, output: usize) -> Self {
        Self {
            source,
            output,
            connections: Vec::new(),
            current: false,
            next: false,
        }
    }

    /// The component owning this wire's output pin. Never changes.
    pub fn source(&self) -> ComponentId {
        self.source
    }

    /// Index of the owning output pin on [`source`](Self::source).
    pub fn output_index(&self) -> usize {
        self.output
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Committed value.
    pub fn current(&self) -> bool {
        self.current
    }

    /// Pending value from the latest evaluate phase.
    pub fn next(&self) -> bool {
        self.next
    }

    /// Number of connections landing on the given input pin.
    pub fn connection_count_to(&self, component: ComponentId, input: usize) -> usize {
        self.connections
            .iter()
            .filter(|c| c.targets(component, input))
            .count()
    }

    /// Drop every connection to the given input pin. Returns how many went.
    pub(crate) fn remove_connections_to(&mut self, component: ComponentId, input: usize) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.targets(component, input));
        before - self.connections.len()
    }

    /// Publish the pending value. Returns true if the committed value changed.
    pub(crate) fn commit(&mut self) -> bool {
        let changed = self.current != self.next;
        self.current = self.next;
        changed
    }
}
