//! Stepping strategy, tick counter and state hashing.
//!
//! A [`Simulator`](crate::engine::Simulator) always advances in whole
//! evaluate+commit steps. The [`SimulationStrategy`] only decides how many
//! steps one `advance()` call runs.

use serde::{Deserialize, Serialize};

/// Simulation time, counted in steps.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Simulation strategy
// ---------------------------------------------------------------------------

/// How the simulator turns driver calls into steps. Chosen at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStrategy {
    /// Every `advance()` runs exactly one step. Suits a driver that calls
    /// once per frame.
    Tick,

    /// `advance(dt)` adds `dt` to an accumulator and runs one step per
    /// `fixed_timestep` that fits, keeping the remainder for next time.
    Delta {
        /// Driver time units per step. Zero is treated as one.
        fixed_timestep: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Counters owned by the simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of completed steps.
    pub tick: Ticks,
    /// Unspent driver time in delta mode. Always zero in tick mode.
    pub accumulator: Ticks,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Summary of one `Simulator::advance()` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Steps actually run.
    pub steps_run: u64,
    /// Committed wire values that flipped, summed over all steps run.
    pub wires_changed: usize,
    /// Display states that flipped, summed over all steps run.
    pub lit_changed: usize,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) accumulator used to fingerprint circuit state.
/// Not cryptographic; only for spotting divergence between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
