//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use foundry_spatial::{GridConfig, GridPosition, OccupancyIndex, Rotation, TileKind, TileRegistry};

use crate::config::{FactoryConfig, SimConfig};
use crate::fixed::Fixed64;
use crate::id::ItemTypeId;
use crate::network::{BELT_LAYER, BeltNetwork};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Item types
// ===========================================================================

pub fn ore() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn plate() -> ItemTypeId {
    ItemTypeId(1)
}

// ===========================================================================
// Configs
// ===========================================================================

/// Default grid with bounds enforcement off.
pub fn open_grid() -> GridConfig {
    GridConfig {
        enforce_bounds: false,
        ..GridConfig::default()
    }
}

/// Unbounded grid, default tiles, no periodic spawning.
pub fn quiet_config() -> FactoryConfig {
    FactoryConfig {
        grid: open_grid(),
        sim: SimConfig::without_spawn(),
        tiles: Vec::new(),
    }
}

// ===========================================================================
// Layouts
// ===========================================================================

/// Lay `len` single-cell belts starting at `start`, each facing along
/// `rotation`, and build the graph over them.
pub fn belt_line(start: GridPosition, len: u32, rotation: Rotation) -> (OccupancyIndex, BeltNetwork) {
    let mut index = OccupancyIndex::new(open_grid(), TileRegistry::with_defaults());
    let mut cell = start;
    for _ in 0..len {
        index
            .place(cell, TileKind::Single, BELT_LAYER, rotation)
            .expect("belt line cells are free");
        cell = cell.step(rotation.facing());
    }
    let mut network = BeltNetwork::new();
    network.rebuild_all(&index);
    (index, network)
}

/// Cells of a closed square loop of side `side` with its lower-left corner at
/// `origin`, paired with the rotation that keeps items circulating clockwise.
pub fn loop_cells(origin: GridPosition, side: i32) -> Vec<(GridPosition, Rotation)> {
    let mut out = Vec::new();
    let last = side - 1;
    // Bottom row runs west, left column north, top row east, right column south.
    for x in 1..=last {
        out.push((GridPosition::new(origin.x + x, origin.y), Rotation::West));
    }
    for y in 0..last {
        out.push((GridPosition::new(origin.x, origin.y + y), Rotation::North));
    }
    for x in 0..last {
        out.push((GridPosition::new(origin.x + x, origin.y + last), Rotation::East));
    }
    for y in 1..=last {
        out.push((GridPosition::new(origin.x + last, origin.y + y), Rotation::South));
    }
    out
}
