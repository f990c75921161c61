//! Evaluation rules for each component kind.
//!
//! Every rule is a pure function of the *committed* values feeding the
//! component's input pins (plus the toggle state for interactive kinds).
//! Multiple drivers on one input pin are combined by [`fan_in`], the single
//! place where that policy lives.

use slotmap::SlotMap;

use crate::component::{Component, ComponentKind};
use crate::id::WireId;
use crate::wire::Wire;

/// Output of the evaluate phase for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Next value for each output wire, in output-pin order.
    pub outputs: Vec<bool>,
    /// Display value to publish on commit, for kinds that latch one.
    pub lit: Option<bool>,
}

/// Logical OR over the committed values of `drivers`.
///
/// An undriven pin reads low. Ids that no longer resolve also read low.
pub fn fan_in(drivers: &[WireId], wires: &SlotMap<WireId, Wire>) -> bool {
    drivers
        .iter()
        .any(|&id| wires.get(id).is_some_and(Wire::current))
}

/// Apply `kind`'s rule to already-combined input levels.
///
/// `toggled` is the component's toggle state; only interactive kinds read it.
/// Missing inputs read low, so a rule never fails.
pub fn rule(kind: ComponentKind, inputs: &[bool], toggled: bool) -> Evaluation {
    let a = inputs.first().copied().unwrap_or(false);
    match kind {
        ComponentKind::Input | ComponentKind::Switch => Evaluation {
            outputs: vec![toggled],
            lit: None,
        },
        ComponentKind::Output | ComponentKind::Lamp => Evaluation {
            outputs: Vec::new(),
            lit: Some(a),
        },
        ComponentKind::NotGate => Evaluation {
            outputs: vec![!a],
            lit: None,
        },
        ComponentKind::Diode => Evaluation {
            outputs: vec![a],
            lit: None,
        },
    }
}

/// Evaluate one component against the committed wire values.
pub fn evaluate(component: &Component, wires: &SlotMap<WireId, Wire>) -> Evaluation {
    let inputs: Vec<bool> = component
        .inputs()
        .iter()
        .map(|pin| fan_in(pin.wires(), wires))
        .collect();
    rule(component.kind(), &inputs, component.is_lit())
}

// ===========================================================================
// Tests
// ===========================================================================
