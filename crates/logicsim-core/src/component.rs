//! Components and their pins.
//!
//! A [`Component`] is created by [`CircuitGraph::add_component`] with a pin
//! layout fixed by its [`ComponentKind`]. Pin wiring is private to the crate:
//! only the graph's connect/disconnect/remove operations touch it, so the
//! wire <-> input-pin back-references can never drift apart.
//!
//! [`CircuitGraph::add_component`]: crate::graph::CircuitGraph::add_component

use serde::{Deserialize, Serialize};

use crate::id::{Position, WireId};

// ---------------------------------------------------------------------------
// Component kind
// ---------------------------------------------------------------------------

/// The variant tag of a component. Selects its pin layout, evaluation rule
/// and display rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Toggleable source with one output.
    Input,
    /// Indicator with one input.
    Output,
    /// Toggleable source whose name tracks its state ("ON"/"OFF").
    Switch,
    /// Inverter: output is high unless some driver of its input is high.
    NotGate,
    /// Buffer: output is high iff some driver of its input is high.
    Diode,
    /// Indicator with one input.
    Lamp,
}

/// How a component's `lit` display state is refreshed on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRule {
    /// `lit` is the toggle state, changed only by activation.
    Toggle,
    /// `lit` takes the value latched during the evaluate phase.
    Latched,
    /// `lit` mirrors the committed value of output 0.
    MirrorOutput,
}

impl ComponentKind {
    /// Every built-in kind, in declaration order.
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Input,
        ComponentKind::Output,
        ComponentKind::Switch,
        ComponentKind::NotGate,
        ComponentKind::Diode,
        ComponentKind::Lamp,
    ];

    /// Stable identifier, suitable for save files.
    pub fn type_name(self) -> &'static str {
        match self {
            ComponentKind::Input => "Input",
            ComponentKind::Output => "Output",
            ComponentKind::Switch => "Switch",
            ComponentKind::NotGate => "NotGate",
            ComponentKind::Diode => "Diode",
            ComponentKind::Lamp => "Lamp",
        }
    }

    /// Inverse of [`type_name`](Self::type_name).
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    /// Names of the input pins, in pin order.
    pub fn input_names(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Input | ComponentKind::Switch => &[],
            ComponentKind::Output => &["Output"],
            ComponentKind::NotGate | ComponentKind::Diode | ComponentKind::Lamp => &["In"],
        }
    }

    /// Names of the output pins, in pin order.
    pub fn output_names(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Input => &["Input"],
            ComponentKind::Switch | ComponentKind::NotGate | ComponentKind::Diode => &["Out"],
            ComponentKind::Output | ComponentKind::Lamp => &[],
        }
    }

    pub fn input_count(self) -> usize {
        self.input_names().len()
    }

    pub fn output_count(self) -> usize {
        self.output_names().len()
    }

    /// Name given to a freshly created component of this kind.
    pub fn default_name(self) -> &'static str {
        match self {
            ComponentKind::Input => "Input",
            ComponentKind::Output => "Output",
            ComponentKind::Switch => "OFF",
            ComponentKind::NotGate => "NOT",
            ComponentKind::Diode => "DIODE",
            ComponentKind::Lamp => "LAMP",
        }
    }

    /// Footprint on the canvas grid as `(width, height)`.
    pub fn size(self) -> (u32, u32) {
        match self {
            ComponentKind::Switch => (3, 1),
            _ => (4, 1),
        }
    }

    /// Whether [`Component::activate`] does anything for this kind.
    pub fn is_interactive(self) -> bool {
        matches!(self, ComponentKind::Input | ComponentKind::Switch)
    }

    pub fn display_rule(self) -> DisplayRule {
        match self {
            ComponentKind::Input | ComponentKind::Switch => DisplayRule::Toggle,
            ComponentKind::Output | ComponentKind::Lamp => DisplayRule::Latched,
            ComponentKind::NotGate | ComponentKind::Diode => DisplayRule::MirrorOutput,
        }
    }
}

// ---------------------------------------------------------------------------
// Pins
// ---------------------------------------------------------------------------

/// An input pin: the ordered list of wires driving it. A wire appears once
/// per connection it has to this pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPin {
    pub(crate) wires: Vec<WireId>,
}

impl InputPin {
    /// Wires currently driving this pin.
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    pub fn is_driven(&self) -> bool {
        !self.wires.is_empty()
    }
}

/// An output pin. Owns exactly one wire for the lifetime of its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPin {
    pub(crate) wire: WireId,
}

impl OutputPin {
    pub fn wire(&self) -> WireId {
        self.wire
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A node in the circuit graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) kind: ComponentKind,
    pub(crate) position: Position,
    pub(crate) inputs: Vec<InputPin>,
    pub(crate) outputs: Vec<OutputPin>,
    pub(crate) protected: bool,
    /// Display state. For toggleable kinds this is also the toggle state.
    pub(crate) lit: bool,
    /// Display value computed during evaluate, published on commit.
    pub(crate) pending_lit: bool,
}

impl Component {
    /// Build a component whose output pins own the given wires.
    pub(crate) fn new(kind: ComponentKind, position: Position, output_wires: Vec<WireId>) -> Self {
        debug_assert_eq!(output_wires.len(), kind.output_count());
        Self {
            name: kind.default_name().to_string(),
            kind,
            position,
            inputs: vec![InputPin::default(); kind.input_count()],
            outputs: output_wires
                .into_iter()
                .map(|wire| OutputPin { wire })
                .collect(),
            protected: false,
            lit: false,
            pending_lit: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Footprint on the canvas grid as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        self.kind.size()
    }

    pub fn inputs(&self) -> &[InputPin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPin] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&InputPin> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&OutputPin> {
        self.outputs.get(index)
    }

    /// Protected components are skipped by bulk deletion.
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn is_interactive(&self) -> bool {
        self.kind.is_interactive()
    }

    /// Flip the toggle state of an interactive component. The output wire
    /// only picks the new state up on the next evaluate phase.
    ///
    /// Returns `false` (and does nothing) for non-interactive kinds.
    pub(crate) fn activate(&mut self) -> bool {
        if !self.kind.is_interactive() {
            return false;
        }
        self.lit = !self.lit;
        if self.kind == ComponentKind::Switch {
            self.name = if self.lit { "ON" } else { "OFF" }.to_string();
        }
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================
