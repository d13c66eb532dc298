//! Simulation configuration, strategy and state types.
//!
//! The engine is parameterized by a [`SimulationStrategy`] that determines how
//! time advances. All strategies execute the same tick pipeline; they differ
//! only in how many ticks run per `advance()` call and how long each one is.

use crate::fixed::{Fixed64, Ticks, f64_to_fixed64, pi};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable constants of the simulation. All lengths are in pixels, all
/// times in seconds, all angles in radians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Length of one fixed tick. The default (1/64 s) is exact in Q32.32 so
    /// timers hit their thresholds on the expected tick.
    pub timestep: Fixed64,
    /// Width and height of one tile.
    pub tile_size: Fixed64,
    /// Belt speed.
    pub item_speed: Fixed64,
    /// Items closer than this to the centre of an accepting entity's tile
    /// are absorbed into its input.
    pub intake_radius: Fixed64,
    /// Minimum gap between items on a belt. Zero lets items overlap.
    pub belt_spacing: Fixed64,
    /// Search radius for loose items around an inserter's pickup tile.
    pub pickup_radius: Fixed64,
    /// Inserter arm angular speed.
    pub arm_speed: Fixed64,
    /// Angular distance at which a swinging arm counts as arrived.
    pub arm_tolerance: Fixed64,
    /// Seconds a drill needs per unit of ore.
    pub mining_rate: Fixed64,
    /// Nominal capacity given to new entity inventories.
    pub inventory_capacity: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: f64_to_fixed64(1.0 / 64.0),
            tile_size: Fixed64::from_num(32),
            item_speed: Fixed64::from_num(64),
            intake_radius: Fixed64::from_num(16),
            belt_spacing: Fixed64::ZERO,
            pickup_radius: Fixed64::from_num(10),
            arm_speed: pi() * Fixed64::from_num(2),
            arm_tolerance: f64_to_fixed64(0.1),
            mining_rate: Fixed64::from_num(1),
            inventory_capacity: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation strategy
// ---------------------------------------------------------------------------

/// How the engine advances time. Chosen at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationStrategy {
    /// One fixed tick per `advance()` call, whatever the elapsed time.
    #[default]
    Tick,

    /// Real-time mode. Elapsed time is accumulated and as many fixed ticks
    /// run as fit, carrying the remainder forward.
    Delta,

    /// One tick per `advance()` call whose length is the elapsed time.
    /// Frame-rate dependent; kept for parity with wall-clock driven loops.
    Variable,
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable simulation state tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of ticks executed so far.
    pub tick: Ticks,

    /// Total simulated seconds.
    pub elapsed: Fixed64,

    /// Unspent wall time in delta mode.
    pub accumulator: Fixed64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of an `Engine::advance()` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of ticks actually executed.
    pub steps_run: u64,
    /// Items that entered the world during these ticks.
    pub items_spawned: u32,
    /// Items that left the world during these ticks.
    pub items_removed: u32,
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

    pub fn write_u32(&mut self, v: u32) {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.tick, 0);
        assert_eq!(state.accumulator, Fixed64::ZERO);
    }

    #[test]
    fn default_config_values() {
        let config = SimConfig::default();
        assert_eq!(config.timestep * Fixed64::from_num(64), Fixed64::from_num(1));
        assert_eq!(config.tile_size, Fixed64::from_num(32));
        assert_eq!(config.belt_spacing, Fixed64::ZERO);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_fixed64(Fixed64::from_num(7));
        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_fixed64(Fixed64::from_num(7));
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_u32(2);
        let mut h2 = StateHash::new();
        h2.write_u32(2);
        h2.write_u32(1);
        assert_ne!(h1.finish(), h2.finish());
    }
}
