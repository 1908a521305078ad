//! Grid configuration and grid <-> world coordinate mapping.
//!
//! The grid lies on the world's horizontal X/Z plane; world Y is height.
//! Grid `x` maps to world X and grid `y` maps to world Z. Cell `grid_origin`
//! is centred on `world_origin`.

use crate::GridPosition;
use serde::{Deserialize, Serialize};

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned world-space box given by centre and full size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBox {
    pub center: WorldPoint,
    pub size: WorldPoint,
}

/// The enforced placement rectangle, in cells. `origin` is inclusive,
/// `origin + size` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    pub origin: GridPosition,
    pub width: u32,
    pub height: u32,
}

impl GridBounds {
    pub fn new(origin: GridPosition, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    pub fn contains(&self, cell: GridPosition) -> bool {
        let dx = i64::from(cell.x) - i64::from(self.origin.x);
        let dy = i64::from(cell.y) - i64::from(self.origin.y);
        (0..i64::from(self.width)).contains(&dx) && (0..i64::from(self.height)).contains(&dy)
    }
}

/// Static grid configuration. Owned by the index; never mutated by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World position of the centre of cell `grid_origin`.
    pub world_origin: WorldPoint,
    /// First cell of the enforced rectangle.
    pub grid_origin: GridPosition,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Edge length of one cell in world units.
    pub cell_size: f64,
    /// When false, placements may extend past the rectangle.
    pub enforce_bounds: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            world_origin: WorldPoint::default(),
            grid_origin: GridPosition::new(0, 0),
            grid_width: 16,
            grid_height: 16,
            cell_size: 1.0,
            enforce_bounds: true,
        }
    }
}

impl GridConfig {
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_origin, self.grid_width, self.grid_height)
    }

    /// World position of the centre of `cell`, lifted by `height`.
    pub fn grid_to_world_center(&self, cell: GridPosition, height: f64) -> WorldPoint {
        WorldPoint {
            x: self.world_origin.x + f64::from(cell.x - self.grid_origin.x) * self.cell_size,
            y: self.world_origin.y + height,
            z: self.world_origin.z + f64::from(cell.y - self.grid_origin.y) * self.cell_size,
        }
    }

    /// The cell whose centre is nearest to `point`. Halfway values round to
    /// even.
    pub fn world_to_grid(&self, point: WorldPoint) -> GridPosition {
        let rx = (point.x - self.world_origin.x) / self.cell_size;
        let rz = (point.z - self.world_origin.z) / self.cell_size;
        GridPosition::new(
            rx.round_ties_even() as i32 + self.grid_origin.x,
            rz.round_ties_even() as i32 + self.grid_origin.y,
        )
    }

    /// World-space box covering the enforced rectangle, flat at `height`.
    pub fn world_bounds(&self, height: f64) -> WorldBox {
        let size_x = f64::from(self.grid_width) * self.cell_size;
        let size_z = f64::from(self.grid_height) * self.cell_size;
        let half_cell = 0.5 * self.cell_size;
        WorldBox {
            center: WorldPoint {
                x: self.world_origin.x - half_cell + size_x * 0.5,
                y: height,
                z: self.world_origin.z - half_cell + size_z * 0.5,
            },
            size: WorldPoint::new(size_x, 0.0, size_z),
        }
    }
}
