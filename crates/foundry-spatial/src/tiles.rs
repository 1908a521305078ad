//! Tile kinds and the registry of their canonical footprints.
//!
//! A footprint definition is a list of cell offsets relative to the tile's
//! origin, expressed for the `North` rotation. Placement rotates the offsets
//! with [`Rotation::apply`](crate::Rotation::apply) and translates them by the
//! origin.

use crate::{GridPosition, Rotation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Tile kinds
// ---------------------------------------------------------------------------

/// The shape family of a placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    /// One cell.
    Single,
    /// Two cells in a row.
    Line,
    /// A 2x2 square.
    Block2x2,
    /// Three cells forming an L.
    CornerL,
}

impl TileKind {
    /// All tile kinds.
    pub fn all() -> [TileKind; 4] {
        [
            TileKind::Single,
            TileKind::Line,
            TileKind::Block2x2,
            TileKind::CornerL,
        ]
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Footprint definition for one tile kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub kind: TileKind,
    /// Offsets from the origin, unrotated.
    pub footprint: Vec<GridPosition>,
}

impl TileDefinition {
    pub fn new(kind: TileKind, footprint: Vec<GridPosition>) -> Self {
        Self { kind, footprint }
    }

    /// Offsets after applying `rotation`.
    pub fn rotated_offsets(&self, rotation: Rotation) -> impl Iterator<Item = GridPosition> + '_ {
        self.footprint.iter().map(move |&offset| rotation.apply(offset))
    }

    /// Absolute cells covered when anchored at `origin` with `rotation`.
    pub fn cells(&self, origin: GridPosition, rotation: Rotation) -> Vec<GridPosition> {
        self.rotated_offsets(rotation)
            .map(|offset| origin + offset)
            .collect()
    }

    /// The built-in definitions for every [`TileKind`].
    pub fn default_set() -> Vec<TileDefinition> {
        let p = GridPosition::new;
        vec![
            TileDefinition::new(TileKind::Single, vec![p(0, 0)]),
            TileDefinition::new(TileKind::Line, vec![p(0, 0), p(1, 0)]),
            TileDefinition::new(
                TileKind::Block2x2,
                vec![p(0, 0), p(1, 0), p(0, 1), p(1, 1)],
            ),
            TileDefinition::new(TileKind::CornerL, vec![p(0, 0), p(1, 0), p(0, 1)]),
        ]
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Lookup from tile kind to footprint definition.
///
/// Built once and handed to the [`OccupancyIndex`](crate::OccupancyIndex);
/// later definitions for the same kind replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TileRegistry {
    definitions: BTreeMap<TileKind, TileDefinition>,
}

impl TileRegistry {
    /// An empty registry. Every placement against it fails with
    /// `UnknownKind` until definitions are registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding [`TileDefinition::default_set`].
    pub fn with_defaults() -> Self {
        Self::from_definitions(TileDefinition::default_set())
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = TileDefinition>) -> Self {
        let mut registry = Self::empty();
        for definition in definitions {
            registry.register(definition);
        }
        registry
    }

    /// Register or replace the definition for `definition.kind`.
    pub fn register(&mut self, definition: TileDefinition) {
        self.definitions.insert(definition.kind, definition);
    }

    pub fn get(&self, kind: TileKind) -> Option<&TileDefinition> {
        self.definitions.get(&kind)
    }

    pub fn contains(&self, kind: TileKind) -> bool {
        self.definitions.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDefinition> {
        self.definitions.values()
    }
}
