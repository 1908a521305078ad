//! Simulation clock state and the determinism hash.
//!
//! The simulator runs on a fixed timestep. Hosts feed elapsed time through
//! `advance(dt)`; the accumulator here carries whatever does not fill a
//! whole tick into the next call.

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle of the transport simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimPhase {
    /// No segments have been derived from a graph yet.
    #[default]
    Uninitialized,
    /// Segments mirror the graph; ticks may run.
    Ready,
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock state tracked by the simulator.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    /// Ticks run so far.
    pub tick: Ticks,
    /// Elapsed time not yet consumed by a whole tick.
    pub accumulator: Fixed64,
    /// Ticks since the last periodic spawn, with the fractional carry.
    pub spawn_accumulator: Fixed64,
    pub phase: SimPhase,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of an `advance()` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of fixed ticks actually executed.
    pub steps_run: u64,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
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

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
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
