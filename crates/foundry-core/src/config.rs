//! Configuration for the grid, the simulator and the tile set.
//!
//! Values are plain `f64` so config files stay readable; the simulator
//! converts them to [`Fixed64`] once at construction.

use crate::fixed::{Fixed64, f64_to_fixed64, f64_to_fixed64_floor};
use crate::id::ItemTypeId;
use foundry_spatial::{GridConfig, TileDefinition, TileKind, TileRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest accepted tick length, belt speed and cell size.
pub const MIN_POSITIVE: f64 = 0.01;
/// Accepted range for item spacing, in belt lengths.
pub const SPACING_RANGE: (f64, f64) = (0.05, 0.9);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick delta {0} is below 0.01")]
    TickDeltaTooSmall(f64),
    #[error("belt speed {0} is below 0.01")]
    BeltSpeedTooSmall(f64),
    #[error("minimum spacing {0} is outside [0.05, 0.9]")]
    SpacingOutOfRange(f64),
    #[error("spawn interval {0} is negative")]
    NegativeSpawnInterval(f64),
    #[error("spawn burst must be at least 1")]
    EmptySpawnBurst,
    #[error("cell size {0} is below 0.01")]
    CellSizeTooSmall(f64),
    #[error("grid size {width}x{height} must be at least 1x1")]
    EmptyGrid { width: u32, height: u32 },
    #[error("tile kind {0:?} is defined more than once")]
    DuplicateTile(TileKind),
    #[error("tile kind {0:?} has an empty footprint")]
    EmptyFootprint(TileKind),
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Periodic item injection at the first segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Simulated seconds between spawn attempts.
    pub interval: f64,
    /// Attempts per interval. Extra attempts are usually blocked by spacing.
    pub burst: u32,
    pub item_type: ItemTypeId,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval: 0.25,
            burst: 1,
            item_type: ItemTypeId(0),
        }
    }
}

/// Transport simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Length of one fixed tick, in seconds.
    pub tick_delta: f64,
    /// Belt lengths travelled per second.
    pub belt_speed: f64,
    /// Minimum gap between consecutive items, in belt lengths.
    pub min_spacing: f64,
    /// Height above the belt at which items are presented.
    pub item_height: f64,
    /// `None` disables periodic spawning.
    pub spawn: Option<SpawnConfig>,
    /// Ring buffer capacity per event kind.
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_delta: 0.02,
            belt_speed: 2.0,
            min_spacing: 0.25,
            item_height: 0.1,
            spawn: Some(SpawnConfig::default()),
            event_capacity: 256,
        }
    }
}

impl SimConfig {
    /// The default parameters with spawning switched off.
    pub fn without_spawn() -> Self {
        Self {
            spawn: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_delta >= MIN_POSITIVE) {
            return Err(ConfigError::TickDeltaTooSmall(self.tick_delta));
        }
        if !(self.belt_speed >= MIN_POSITIVE) {
            return Err(ConfigError::BeltSpeedTooSmall(self.belt_speed));
        }
        let (lo, hi) = SPACING_RANGE;
        if !(lo..=hi).contains(&self.min_spacing) {
            return Err(ConfigError::SpacingOutOfRange(self.min_spacing));
        }
        if let Some(spawn) = &self.spawn {
            if !(spawn.interval >= 0.0) {
                return Err(ConfigError::NegativeSpawnInterval(spawn.interval));
            }
            if spawn.burst == 0 {
                return Err(ConfigError::EmptySpawnBurst);
            }
        }
        Ok(())
    }

    pub(crate) fn params(&self) -> TickParams {
        TickParams {
            tick_delta: f64_to_fixed64_floor(self.tick_delta),
            travel: f64_to_fixed64(self.belt_speed * self.tick_delta),
            min_spacing: f64_to_fixed64(self.min_spacing),
            spawn_every: self
                .spawn
                .as_ref()
                .map(|s| f64_to_fixed64(s.interval / self.tick_delta)),
        }
    }
}

/// Fixed-point copies of the values the tick loop reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickParams {
    /// Rounded down so whole ticks never outrun host time.
    pub tick_delta: Fixed64,
    /// Belt lengths covered per tick.
    pub travel: Fixed64,
    pub min_spacing: Fixed64,
    /// Spawn interval measured in ticks, so the timer cannot drift against
    /// the tick count.
    pub spawn_every: Option<Fixed64>,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

pub fn validate_grid(grid: &GridConfig) -> Result<(), ConfigError> {
    if !(grid.cell_size >= MIN_POSITIVE) {
        return Err(ConfigError::CellSizeTooSmall(grid.cell_size));
    }
    if grid.grid_width == 0 || grid.grid_height == 0 {
        return Err(ConfigError::EmptyGrid {
            width: grid.grid_width,
            height: grid.grid_height,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Everything needed to construct a [`Factory`](crate::factory::Factory).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub grid: GridConfig,
    pub sim: SimConfig,
    /// Footprint definitions. Empty means the built-in set.
    pub tiles: Vec<TileDefinition>,
}

impl FactoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_grid(&self.grid)?;
        self.sim.validate()?;

        let mut seen = BTreeSet::new();
        for tile in &self.tiles {
            if !seen.insert(tile.kind) {
                return Err(ConfigError::DuplicateTile(tile.kind));
            }
            if tile.footprint.is_empty() {
                return Err(ConfigError::EmptyFootprint(tile.kind));
            }
        }
        Ok(())
    }

    /// The tile registry described by `tiles`.
    pub fn registry(&self) -> TileRegistry {
        if self.tiles.is_empty() {
            TileRegistry::with_defaults()
        } else {
            TileRegistry::from_definitions(self.tiles.iter().cloned())
        }
    }
}
