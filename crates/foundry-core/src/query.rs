//! Read-only views of transport state for rendering and telemetry.
//!
//! All types are owned copies; nothing here borrows simulator storage.

use foundry_spatial::{Direction, GridConfig, GridPosition, Rotation, WorldPoint};

use crate::fixed::{Fixed64, fixed64_to_f64};
use crate::id::{ItemId, ItemTypeId};
use crate::transport::TransportSim;

// ---------------------------------------------------------------------------
// Item snapshot
// ---------------------------------------------------------------------------

/// One live item with the segment it rides on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub item_type: ItemTypeId,
    /// Cell of the item's segment.
    pub cell: GridPosition,
    pub position: Fixed64,
    /// Facing direction of the segment.
    pub direction: Direction,
}

/// Every live item, in segment (x, y) order and ascending position within a
/// segment.
pub fn item_snapshots(sim: &TransportSim) -> Vec<ItemSnapshot> {
    let mut out = Vec::with_capacity(sim.item_count());
    for segment in sim.segments() {
        for &id in &segment.items {
            let Some(item) = sim.item(id) else {
                continue;
            };
            out.push(ItemSnapshot {
                id,
                item_type: item.item_type,
                cell: segment.cell,
                position: item.position,
                direction: segment.direction,
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// World placement
// ---------------------------------------------------------------------------

/// Where a host should draw an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTransform {
    pub position: WorldPoint,
    /// Rotation about the vertical axis, matching the belt's rotation.
    pub yaw_degrees: f64,
}

/// Place an item along its belt: position 0.5 is the cell centre, 0 and 1
/// are the entry and exit edges.
pub fn item_transform(grid: &GridConfig, item: &ItemSnapshot, height: f64) -> ItemTransform {
    let center = grid.grid_to_world_center(item.cell, height);
    let (dx, dz) = item.direction.offset();
    let along = (fixed64_to_f64(item.position) - 0.5) * grid.cell_size;
    ItemTransform {
        position: WorldPoint::new(
            center.x + f64::from(dx) * along,
            center.y,
            center.z + f64::from(dz) * along,
        ),
        yaw_degrees: f64::from(rotation_of(item.direction).degrees()),
    }
}

fn rotation_of(direction: Direction) -> Rotation {
    match direction {
        Direction::North => Rotation::North,
        Direction::East => Rotation::East,
        Direction::South => Rotation::South,
        Direction::West => Rotation::West,
    }
}
