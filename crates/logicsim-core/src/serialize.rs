//! Binary snapshots of a simulator.
//!
//! A snapshot is the circuit, strategy and counters wrapped in a versioned
//! header and encoded with `bitcode`. Recorded events and event suppression
//! are not part of a snapshot; a restored simulator starts with an empty
//! buffer.

use crate::engine::Simulator;
use crate::event::EventBuffer;
use crate::graph::CircuitGraph;
use crate::sim::{SimState, SimulationStrategy};
use crate::validation::{Violation, check_graph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a circuit snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x1061_C001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot circuit has {} structural violation(s), first: {:?}", .0.len(), .0.first())]
    Inconsistent(Vec<Violation>),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header stored at the front of every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode a snapshot and return only its header, without validating it.
///
/// bitcode has no partial decoding, so this decodes the whole payload.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: SimulatorSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Serializable simulator state
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SimulatorSnapshot {
    pub(crate) header: SnapshotHeader,
    pub(crate) graph: CircuitGraph,
    pub(crate) strategy: SimulationStrategy,
    pub(crate) sim_state: SimState,
    pub(crate) last_state_hash: u64,
}

impl Simulator {
    /// Encode the simulator as a versioned binary snapshot.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = SimulatorSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            graph: self.graph.clone(),
            strategy: self.strategy.clone(),
            sim_state: self.sim_state.clone(),
            last_state_hash: self.last_state_hash,
        };

        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore a simulator from [`serialize`](Self::serialize) output.
    ///
    /// The header is checked before anything is rebuilt; a bad magic number
    /// or version is an error, never a panic. A circuit whose cross
    /// references disagree is rejected as well. Steps taken after restoring
    /// match the steps the original would have taken.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: SimulatorSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;

        snapshot.header.validate()?;

        let violations = check_graph(&snapshot.graph);
        if !violations.is_empty() {
            return Err(DeserializeError::Inconsistent(violations));
        }

        log::debug!(
            "restored snapshot at tick {} ({} components)",
            snapshot.header.tick,
            snapshot.graph.component_count()
        );

        Ok(Simulator {
            graph: snapshot.graph,
            strategy: snapshot.strategy,
            sim_state: snapshot.sim_state,
            last_state_hash: snapshot.last_state_hash,
            events: EventBuffer::default(),
            suppressed: BTreeSet::new(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
