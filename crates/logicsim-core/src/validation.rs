//! Structural checks and determinism tooling.
//!
//! [`check_graph`] verifies that a circuit's cross references are consistent.
//! [`diff_simulators`] and [`validate_determinism`] compare two runs and
//! point at the first place they diverge.

use std::collections::BTreeMap;

use crate::engine::Simulator;
use crate::graph::CircuitGraph;
use crate::id::{ComponentId, WireId};
use crate::serialize::DeserializeError;

// ---------------------------------------------------------------------------
// Structural violations
// ---------------------------------------------------------------------------

/// A broken structural invariant found by [`check_graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The component's pin counts differ from its kind's layout.
    PinCountMismatch {
        component: ComponentId,
        inputs: usize,
        outputs: usize,
    },
    /// An output pin refers to a wire that does not exist.
    MissingOwnedWire {
        component: ComponentId,
        output: usize,
        wire: WireId,
    },
    /// A wire does not name the output pin that owns it as its source.
    WrongSource {
        wire: WireId,
        component: ComponentId,
        output: usize,
    },
    /// A wire whose source pin does not own it.
    OrphanWire(WireId),
    /// A connection targets a missing component or an out-of-range pin.
    DanglingConnection {
        wire: WireId,
        component: ComponentId,
        input: usize,
    },
    /// An input pin lists a wire that does not exist.
    DanglingInput {
        component: ComponentId,
        input: usize,
        wire: WireId,
    },
    /// The wire's connection list and the pin's back-references disagree on
    /// how many times `wire` drives `component[input]`.
    Asymmetric {
        wire: WireId,
        component: ComponentId,
        input: usize,
        connections: usize,
        back_refs: usize,
    },
}

/// Check every cross reference in `graph`. An empty result means the graph
/// is consistent.
pub fn check_graph(graph: &CircuitGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    // (wire, component, input) -> (connections on the wire, back-refs on the pin)
    let mut links: BTreeMap<(WireId, ComponentId, usize), (usize, usize)> = BTreeMap::new();

    for (id, component) in graph.components() {
        let kind = component.kind();
        if component.inputs().len() != kind.input_count()
            || component.outputs().len() != kind.output_count()
        {
            violations.push(Violation::PinCountMismatch {
                component: id,
                inputs: component.inputs().len(),
                outputs: component.outputs().len(),
            });
        }

        for (output, pin) in component.outputs().iter().enumerate() {
            match graph.wire(pin.wire()) {
                None => violations.push(Violation::MissingOwnedWire {
                    component: id,
                    output,
                    wire: pin.wire(),
                }),
                Some(w) if w.source() != id || w.output_index() != output => {
                    violations.push(Violation::WrongSource {
                        wire: pin.wire(),
                        component: id,
                        output,
                    })
                }
                Some(_) => {}
            }
        }

        for (input, pin) in component.inputs().iter().enumerate() {
            for &wire in pin.wires() {
                if !graph.contains_wire(wire) {
                    violations.push(Violation::DanglingInput {
                        component: id,
                        input,
                        wire,
                    });
                }
                links.entry((wire, id, input)).or_default().1 += 1;
            }
        }
    }

    for (wire_id, wire) in graph.wires() {
        let owned = graph
            .component(wire.source())
            .and_then(|c| c.output(wire.output_index()))
            .is_some_and(|pin| pin.wire() == wire_id);
        if !owned {
            violations.push(Violation::OrphanWire(wire_id));
        }

        for conn in wire.connections() {
            let valid = graph
                .component(conn.component)
                .is_some_and(|c| conn.input < c.inputs().len());
            if !valid {
                violations.push(Violation::DanglingConnection {
                    wire: wire_id,
                    component: conn.component,
                    input: conn.input,
                });
            }
            links
                .entry((wire_id, conn.component, conn.input))
                .or_default()
                .0 += 1;
        }
    }

    for ((wire, component, input), (connections, back_refs)) in links {
        if connections != back_refs {
            violations.push(Violation::Asymmetric {
                wire,
                component,
                input,
                connections,
                back_refs,
            });
        }
    }

    violations
}

// ---------------------------------------------------------------------------
// State diff types
// ---------------------------------------------------------------------------

/// Difference between two simulators at the component level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentDiff {
    OnlyInA(ComponentId),
    OnlyInB(ComponentId),
    /// Present in both with different state. `description` lists the
    /// differing fields.
    StateMismatch {
        component: ComponentId,
        description: String,
    },
}

/// Difference between two simulators at the wire level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireDiff {
    OnlyInA(WireId),
    OnlyInB(WireId),
    StateMismatch { wire: WireId, description: String },
}

/// Full state diff between two simulators.
#[derive(Debug, Clone)]
pub struct StateDiff {
    pub is_identical: bool,
    pub tick_matches: bool,
    pub component_diffs: Vec<ComponentDiff>,
    pub wire_diffs: Vec<WireDiff>,
}

// ---------------------------------------------------------------------------
// Full diff
// ---------------------------------------------------------------------------

/// Compute a detailed diff between two simulators. Ids are compared as-is,
/// so this is meant for two copies of the same circuit (e.g. two peers, or
/// a simulator and its restored snapshot).
pub fn diff_simulators(a: &Simulator, b: &Simulator) -> StateDiff {
    let ga = a.graph();
    let gb = b.graph();
    let mut component_diffs = Vec::new();
    let mut wire_diffs = Vec::new();

    for (id, ca) in ga.components() {
        let Some(cb) = gb.component(id) else {
            component_diffs.push(ComponentDiff::OnlyInA(id));
            continue;
        };
        let mut mismatches = Vec::new();
        if ca.kind() != cb.kind() {
            mismatches.push("kind");
        }
        if ca.name() != cb.name() {
            mismatches.push("name");
        }
        if ca.position() != cb.position() {
            mismatches.push("position");
        }
        if ca.is_protected() != cb.is_protected() {
            mismatches.push("protected");
        }
        if ca.is_lit() != cb.is_lit() {
            mismatches.push("lit");
        }
        if ca.inputs() != cb.inputs() {
            mismatches.push("inputs");
        }
        if ca.outputs() != cb.outputs() {
            mismatches.push("outputs");
        }
        if !mismatches.is_empty() {
            component_diffs.push(ComponentDiff::StateMismatch {
                component: id,
                description: mismatches.join(", "),
            });
        }
    }
    for id in gb.component_ids() {
        if !ga.contains_component(id) {
            component_diffs.push(ComponentDiff::OnlyInB(id));
        }
    }

    for (id, wa) in ga.wires() {
        let Some(wb) = gb.wire(id) else {
            wire_diffs.push(WireDiff::OnlyInA(id));
            continue;
        };
        let mut mismatches = Vec::new();
        if wa.source() != wb.source() || wa.output_index() != wb.output_index() {
            mismatches.push("source");
        }
        if wa.current() != wb.current() {
            mismatches.push("current");
        }
        if wa.next() != wb.next() {
            mismatches.push("next");
        }
        if wa.connections() != wb.connections() {
            mismatches.push("connections");
        }
        if !mismatches.is_empty() {
            wire_diffs.push(WireDiff::StateMismatch {
                wire: id,
                description: mismatches.join(", "),
            });
        }
    }
    for (id, _) in gb.wires() {
        if !ga.contains_wire(id) {
            wire_diffs.push(WireDiff::OnlyInB(id));
        }
    }

    let tick_matches = a.tick() == b.tick();
    StateDiff {
        is_identical: tick_matches && component_diffs.is_empty() && wire_diffs.is_empty(),
        tick_matches,
        component_diffs,
        wire_diffs,
    }
}

// ---------------------------------------------------------------------------
// Determinism validation
// ---------------------------------------------------------------------------

/// Result of a determinism validation run.
#[derive(Debug)]
pub struct DeterminismResult {
    pub is_deterministic: bool,
    /// Tick at which divergence was first detected (if any).
    pub divergence_tick: Option<u64>,
    /// (tick, hash_run1, hash_run2) for each step.
    pub hash_log: Vec<(u64, u64, u64)>,
}

/// Restore `snapshot_data` twice, step both copies `steps` times and compare
/// their state hashes after every step.
pub fn validate_determinism(
    snapshot_data: &[u8],
    steps: u64,
) -> Result<DeterminismResult, DeserializeError> {
    let mut sim_a = Simulator::deserialize(snapshot_data)?;
    let mut sim_b = Simulator::deserialize(snapshot_data)?;

    let mut hash_log = Vec::new();
    let mut divergence_tick = None;

    for _ in 0..steps {
        sim_a.step();
        sim_b.step();

        let hash_a = sim_a.state_hash();
        let hash_b = sim_b.state_hash();
        let tick = sim_a.tick();

        hash_log.push((tick, hash_a, hash_b));

        if hash_a != hash_b && divergence_tick.is_none() {
            divergence_tick = Some(tick);
        }
    }

    Ok(DeterminismResult {
        is_deterministic: divergence_tick.is_none(),
        divergence_tick,
        hash_log,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
