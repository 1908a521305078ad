//! Adjacency graph over belt tiles.
//!
//! One [`BeltTile`] per belt-layer occupant, keyed by the occupant's origin
//! cell. Neighbor links are stored as optional cell keys into the same map,
//! so removing a tile never leaves a dangling reference: the local rebuild
//! that follows every change clears stale keys on the former neighbors.
//!
//! Tiles are linked by origin cell only. A multi-cell belt occupant is still a
//! single node whose neighbors are the four cells around its origin.

use std::collections::BTreeMap;

use foundry_spatial::{Direction, GridPosition, Layer, OccupancyIndex, Occupant, Rotation};

/// The layer whose occupants become graph nodes.
pub const BELT_LAYER: Layer = Layer::Belt;

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// A node in the belt graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeltTile {
    cell: GridPosition,
    rotation: Rotation,
    /// Indexed by [`Direction::index`].
    neighbors: [Option<GridPosition>; 4],
}

impl BeltTile {
    fn new(cell: GridPosition, rotation: Rotation) -> Self {
        Self {
            cell,
            rotation,
            neighbors: [None; 4],
        }
    }

    pub fn cell(&self) -> GridPosition {
        self.cell
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// The facing direction, derived from the rotation.
    pub fn direction(&self) -> Direction {
        self.rotation.facing()
    }

    pub fn neighbor(&self, dir: Direction) -> Option<GridPosition> {
        self.neighbors[dir.index()]
    }

    /// The neighbor feeding into this tile (opposite its facing).
    pub fn input(&self) -> Option<GridPosition> {
        self.neighbor(self.direction().opposite())
    }

    /// The neighbor this tile feeds into.
    pub fn output(&self) -> Option<GridPosition> {
        self.neighbor(self.direction())
    }

    pub fn north(&self) -> Option<GridPosition> {
        self.neighbor(Direction::North)
    }

    pub fn east(&self) -> Option<GridPosition> {
        self.neighbor(Direction::East)
    }

    pub fn south(&self) -> Option<GridPosition> {
        self.neighbor(Direction::South)
    }

    pub fn west(&self) -> Option<GridPosition> {
        self.neighbor(Direction::West)
    }

    /// All present links as `(direction, neighbor cell)`.
    pub fn links(&self) -> impl Iterator<Item = (Direction, GridPosition)> + '_ {
        Direction::all()
            .into_iter()
            .filter_map(|dir| self.neighbor(dir).map(|cell| (dir, cell)))
    }
}

// ---------------------------------------------------------------------------
// BeltNetwork
// ---------------------------------------------------------------------------

/// Belt tiles keyed by origin cell, with symmetric cardinal links.
#[derive(Debug, Default)]
pub struct BeltNetwork {
    tiles: BTreeMap<GridPosition, BeltTile>,
}

impl BeltNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Mutation --

    /// Create or replace the tile for a belt occupant and relink around it.
    /// Returns `None` for occupants on any other layer.
    pub fn add_or_update(&mut self, occupant: &Occupant) -> Option<&BeltTile> {
        if occupant.layer != BELT_LAYER {
            return None;
        }
        let cell = occupant.origin;
        self.tiles
            .insert(cell, BeltTile::new(cell, occupant.rotation));
        self.refresh_around(cell);
        self.tiles.get(&cell)
    }

    /// Delete the tile at `cell`. Returns whether one existed.
    pub fn remove_at(&mut self, cell: GridPosition) -> bool {
        let removed = self.tiles.remove(&cell).is_some();
        if removed {
            self.refresh_around(cell);
        }
        removed
    }

    /// Discard every tile and rebuild from the index's belt occupants.
    pub fn rebuild_all(&mut self, index: &OccupancyIndex) {
        self.tiles.clear();
        for occupant in index.occupants(BELT_LAYER) {
            self.tiles
                .insert(occupant.origin, BeltTile::new(occupant.origin, occupant.rotation));
        }
        let cells: Vec<GridPosition> = self.tiles.keys().copied().collect();
        for cell in cells {
            self.refresh_tile(cell);
        }
        log::debug!("belt network rebuilt with {} tiles", self.tiles.len());
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    // -- Queries --

    pub fn tile(&self, cell: GridPosition) -> Option<&BeltTile> {
        self.tiles.get(&cell)
    }

    pub fn contains(&self, cell: GridPosition) -> bool {
        self.tiles.contains_key(&cell)
    }

    /// Tiles in (x, y) order.
    pub fn tiles(&self) -> impl Iterator<Item = &BeltTile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    // -- Internal --

    /// Recompute links for `cell` and its four cardinal neighbors.
    fn refresh_around(&mut self, cell: GridPosition) {
        self.refresh_tile(cell);
        for dir in Direction::all() {
            self.refresh_tile(cell.step(dir));
        }
    }

    /// Clear and recompute one tile's links, writing the reverse link on each
    /// neighbor found. A vacant cell is a no-op.
    fn refresh_tile(&mut self, cell: GridPosition) {
        if !self.tiles.contains_key(&cell) {
            return;
        }
        let mut neighbors = [None; 4];
        for dir in Direction::all() {
            let other = cell.step(dir);
            if let Some(tile) = self.tiles.get_mut(&other) {
                tile.neighbors[dir.opposite().index()] = Some(cell);
                neighbors[dir.index()] = Some(other);
            }
        }
        if let Some(tile) = self.tiles.get_mut(&cell) {
            tile.neighbors = neighbors;
        }
    }
}
