//! Spatial occupancy index for tile placement on a layered 2D grid.
//!
//! Each layer holds multi-cell occupants whose footprints never overlap.
//! The index is the single writer of grid state and answers free/occupied
//! queries by cell or by origin. It emits no notifications; callers forward
//! changes to whatever depends on it.

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::collections::BTreeMap;
use std::ops::Add;

pub mod coords;
pub mod tiles;

pub use coords::{GridBounds, GridConfig, WorldBox, WorldPoint};
pub use tiles::{TileDefinition, TileKind, TileRegistry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position on the 2D grid.
///
/// Ordering is by `x`, then `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

impl Add for GridPosition {
    type Output = GridPosition;

    fn add(self, rhs: GridPosition) -> GridPosition {
        GridPosition::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Rotation of a placed tile, in 90 degree steps clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// All four rotation values.
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::North,
            Rotation::East,
            Rotation::South,
            Rotation::West,
        ]
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn rotate_ccw(self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::East => Rotation::North,
            Rotation::South => Rotation::East,
            Rotation::West => Rotation::South,
        }
    }

    /// Yaw in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::North => 0,
            Rotation::East => 90,
            Rotation::South => 180,
            Rotation::West => 270,
        }
    }

    /// Rotate a footprint offset. Four applications of any rotation
    /// return the original offset.
    pub fn apply(self, offset: GridPosition) -> GridPosition {
        let GridPosition { x, y } = offset;
        match self {
            Rotation::North => GridPosition::new(x, y),
            Rotation::East => GridPosition::new(y, -x),
            Rotation::South => GridPosition::new(-x, -y),
            Rotation::West => GridPosition::new(-y, x),
        }
    }

    /// The cardinal direction a tile with this rotation faces.
    pub fn facing(self) -> Direction {
        match self {
            Rotation::North => Direction::North,
            Rotation::East => Direction::East,
            Rotation::South => Direction::South,
            Rotation::West => Direction::West,
        }
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction. North is +y.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Stable array index, North = 0 clockwise.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Independent placement layers. Occupants only collide within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Belt,
    Machine,
    Decor,
}

const LAYER_COUNT: usize = 3;

impl Layer {
    pub fn all() -> [Layer; LAYER_COUNT] {
        [Layer::Belt, Layer::Machine, Layer::Decor]
    }

    fn index(self) -> usize {
        self as usize
    }
}

new_key_type! {
    /// Identifies a live occupant in the index.
    pub struct OccupantId;
}

/// An immutable placement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub id: OccupantId,
    pub kind: TileKind,
    pub layer: Layer,
    pub origin: GridPosition,
    pub rotation: Rotation,
    /// Absolute cells covered, computed once at placement.
    pub cells: Vec<GridPosition>,
}

/// Errors from spatial operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("cell {cell:?} is outside the grid bounds")]
    OutOfBounds { cell: GridPosition },
    #[error("cell {cell:?} is already occupied")]
    Blocked { cell: GridPosition },
    #[error("no footprint definition registered for {0:?}")]
    UnknownKind(TileKind),
    #[error("no occupant at {0:?}")]
    NotFound(GridPosition),
}

// ---------------------------------------------------------------------------
// OccupancyIndex
// ---------------------------------------------------------------------------

/// Per-layer views over live occupants.
#[derive(Debug, Default)]
struct LayerMap {
    /// origin -> occupant
    by_origin: BTreeMap<GridPosition, OccupantId>,
    /// every covered cell -> occupant
    by_cell: BTreeMap<GridPosition, OccupantId>,
}

/// The source of truth for what occupies which cell on which layer.
///
/// Maintains, per layer:
/// - `by_origin`: anchor cell -> occupant
/// - `by_cell`: every footprint cell -> occupant
///
/// The `by_cell` key set is always the union of live footprints on that
/// layer, and no two occupants on a layer share a cell.
#[derive(Debug)]
pub struct OccupancyIndex {
    config: GridConfig,
    registry: TileRegistry,
    occupants: SlotMap<OccupantId, Occupant>,
    layers: [LayerMap; LAYER_COUNT],
}

impl OccupancyIndex {
    pub fn new(config: GridConfig, registry: TileRegistry) -> Self {
        Self {
            config,
            registry,
            occupants: SlotMap::with_key(),
            layers: Default::default(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn bounds(&self) -> GridBounds {
        self.config.bounds()
    }

    // -- Placement --

    /// Place a tile with its origin at `origin`.
    ///
    /// Nothing is registered unless every footprint cell passes the bounds
    /// and occupancy checks.
    pub fn place(
        &mut self,
        origin: GridPosition,
        kind: TileKind,
        layer: Layer,
        rotation: Rotation,
    ) -> Result<&Occupant, SpatialError> {
        let cells = self.footprint(origin, kind, rotation)?;
        self.check_area(&cells, layer)?;

        let id = self.occupants.insert_with_key(|id| Occupant {
            id,
            kind,
            layer,
            origin,
            rotation,
            cells,
        });
        let map = &mut self.layers[layer.index()];
        map.by_origin.insert(origin, id);
        for &cell in &self.occupants[id].cells {
            map.by_cell.insert(cell, id);
        }

        Ok(&self.occupants[id])
    }

    /// Check if a tile could be placed, without placing it.
    pub fn can_place(
        &self,
        origin: GridPosition,
        kind: TileKind,
        layer: Layer,
        rotation: Rotation,
    ) -> bool {
        self.footprint(origin, kind, rotation)
            .and_then(|cells| self.check_area(&cells, layer))
            .is_ok()
    }

    /// Remove the occupant anchored at `origin`.
    pub fn remove(&mut self, origin: GridPosition, layer: Layer) -> Result<Occupant, SpatialError> {
        let map = &mut self.layers[layer.index()];
        let id = map
            .by_origin
            .remove(&origin)
            .ok_or(SpatialError::NotFound(origin))?;
        let occupant = self
            .occupants
            .remove(id)
            .ok_or(SpatialError::NotFound(origin))?;
        for cell in &occupant.cells {
            map.by_cell.remove(cell);
        }
        Ok(occupant)
    }

    /// Remove whichever occupant covers `cell`.
    pub fn remove_at_cell(
        &mut self,
        cell: GridPosition,
        layer: Layer,
    ) -> Result<Occupant, SpatialError> {
        let origin = self
            .occupant_at_cell(cell, layer)
            .map(|occupant| occupant.origin)
            .ok_or(SpatialError::NotFound(cell))?;
        self.remove(origin, layer)
    }

    /// Remove every occupant on `layer`.
    pub fn clear_layer(&mut self, layer: Layer) {
        let map = std::mem::take(&mut self.layers[layer.index()]);
        for id in map.by_origin.into_values() {
            self.occupants.remove(id);
        }
    }

    pub fn clear_all(&mut self) {
        for layer in Layer::all() {
            self.clear_layer(layer);
        }
    }

    // -- Point queries --

    /// Whether `cell` is in bounds (when enforced) and unoccupied on `layer`.
    pub fn is_cell_free(&self, cell: GridPosition, layer: Layer) -> bool {
        if self.config.enforce_bounds && !self.bounds().contains(cell) {
            return false;
        }
        !self.is_occupied(cell, layer)
    }

    pub fn is_occupied(&self, cell: GridPosition, layer: Layer) -> bool {
        self.layers[layer.index()].by_cell.contains_key(&cell)
    }

    pub fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(id)
    }

    pub fn occupant_at_origin(&self, origin: GridPosition, layer: Layer) -> Option<&Occupant> {
        let id = *self.layers[layer.index()].by_origin.get(&origin)?;
        self.occupants.get(id)
    }

    pub fn occupant_at_cell(&self, cell: GridPosition, layer: Layer) -> Option<&Occupant> {
        let id = *self.layers[layer.index()].by_cell.get(&cell)?;
        self.occupants.get(id)
    }

    // -- Enumeration --

    /// Occupants on `layer`, ordered by origin.
    pub fn occupants(&self, layer: Layer) -> impl Iterator<Item = &Occupant> {
        self.layers[layer.index()]
            .by_origin
            .values()
            .filter_map(|&id| self.occupants.get(id))
    }

    /// Every occupied cell on `layer` with the occupant covering it.
    pub fn occupied_cells(&self, layer: Layer) -> impl Iterator<Item = (GridPosition, &Occupant)> {
        self.layers[layer.index()]
            .by_cell
            .iter()
            .filter_map(|(&cell, &id)| self.occupants.get(id).map(|occupant| (cell, occupant)))
    }

    // -- Stats --

    /// Number of live occupants on `layer`.
    pub fn occupant_count(&self, layer: Layer) -> usize {
        self.layers[layer.index()].by_origin.len()
    }

    /// Number of occupied cells on `layer`.
    pub fn cell_count(&self, layer: Layer) -> usize {
        self.layers[layer.index()].by_cell.len()
    }

    // -- Internal --

    fn footprint(
        &self,
        origin: GridPosition,
        kind: TileKind,
        rotation: Rotation,
    ) -> Result<Vec<GridPosition>, SpatialError> {
        let Some(definition) = self.registry.get(kind) else {
            log::warn!("no tile definition registered for {kind:?}");
            return Err(SpatialError::UnknownKind(kind));
        };
        Ok(definition.cells(origin, rotation))
    }

    fn check_area(&self, cells: &[GridPosition], layer: Layer) -> Result<(), SpatialError> {
        let bounds = self.bounds();
        let taken = &self.layers[layer.index()].by_cell;
        for &cell in cells {
            if self.config.enforce_bounds && !bounds.contains(cell) {
                return Err(SpatialError::OutOfBounds { cell });
            }
            if taken.contains_key(&cell) {
                return Err(SpatialError::Blocked { cell });
            }
        }
        Ok(())
    }
}
