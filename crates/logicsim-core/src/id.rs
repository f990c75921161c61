use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a component (input, gate, lamp, ...) in the circuit graph.
    pub struct ComponentId;

    /// Identifies a wire: the broadcast channel owned by one output pin.
    pub struct WireId;
}

/// Grid position of a component's top-left pin row on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A routing point along a connection. Purely cosmetic: the simulator
/// stores waypoints for rendering and saving but never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: i32,
    pub y: i32,
}

impl Waypoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
