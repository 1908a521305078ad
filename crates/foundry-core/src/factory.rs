//! The composition root: index, belt graph and simulator behind one API.
//!
//! Every mutation goes index first, then graph, then simulator, and completes
//! before the call returns. Since all mutations take `&mut self`, nothing can
//! change the belts while a step is running.

use foundry_spatial::{
    GridPosition, Layer, OccupancyIndex, Occupant, Rotation, SpatialError, TileKind,
};

use crate::config::{ConfigError, FactoryConfig};
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::{ItemId, ItemTypeId};
use crate::network::{BELT_LAYER, BeltNetwork};
use crate::query::{ItemSnapshot, ItemTransform, item_snapshots, item_transform};
use crate::sim::AdvanceResult;
use crate::transport::{TransportError, TransportSim};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug)]
pub struct Factory {
    index: OccupancyIndex,
    network: BeltNetwork,
    sim: TransportSim,
    item_height: f64,
}

impl Factory {
    pub fn new(config: FactoryConfig) -> Result<Self, FactoryError> {
        config.validate()?;
        let index = OccupancyIndex::new(config.grid.clone(), config.registry());
        let item_height = config.sim.item_height;
        let sim = TransportSim::new(config.sim)?;
        log::info!(
            "factory grid {}x{} at {:?}, bounds {}",
            config.grid.grid_width,
            config.grid.grid_height,
            config.grid.grid_origin,
            if config.grid.enforce_bounds { "on" } else { "off" }
        );
        Ok(Self {
            index,
            network: BeltNetwork::new(),
            sim,
            item_height,
        })
    }

    /// Derive the graph and segments from whatever the index holds.
    pub fn initialize(&mut self) {
        self.network.rebuild_all(&self.index);
        self.sim.rebuild_segments(&self.network);
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    pub fn can_place(
        &self,
        origin: GridPosition,
        kind: TileKind,
        layer: Layer,
        rotation: Rotation,
    ) -> bool {
        self.index.can_place(origin, kind, layer, rotation)
    }

    pub fn place(
        &mut self,
        origin: GridPosition,
        kind: TileKind,
        layer: Layer,
        rotation: Rotation,
    ) -> Result<Occupant, FactoryError> {
        let occupant = self.index.place(origin, kind, layer, rotation)?.clone();
        if occupant.layer == BELT_LAYER {
            self.network.add_or_update(&occupant);
            self.sim.on_belt_placed(&occupant, &self.network);
        }
        Ok(occupant)
    }

    /// Remove the occupant whose origin is `origin`.
    pub fn remove(&mut self, origin: GridPosition, layer: Layer) -> Result<Occupant, FactoryError> {
        let occupant = self.index.remove(origin, layer)?;
        self.after_removal(&occupant);
        Ok(occupant)
    }

    /// Remove whichever occupant covers `cell`.
    pub fn remove_at_cell(
        &mut self,
        cell: GridPosition,
        layer: Layer,
    ) -> Result<Occupant, FactoryError> {
        let occupant = self.index.remove_at_cell(cell, layer)?;
        self.after_removal(&occupant);
        Ok(occupant)
    }

    fn after_removal(&mut self, occupant: &Occupant) {
        if occupant.layer == BELT_LAYER {
            self.network.remove_at(occupant.origin);
            self.sim.on_belt_removed(occupant.origin, &self.network);
        }
    }

    pub fn clear_layer(&mut self, layer: Layer) {
        self.index.clear_layer(layer);
        if layer == BELT_LAYER {
            self.initialize();
        }
    }

    pub fn clear_all(&mut self) {
        self.index.clear_all();
        self.initialize();
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    pub fn advance(&mut self, dt: Fixed64) -> AdvanceResult {
        self.sim.advance(dt)
    }

    /// [`advance`](Self::advance) for hosts whose clock runs in `f64` seconds.
    pub fn advance_seconds(&mut self, dt: f64) -> AdvanceResult {
        self.sim.advance(f64_to_fixed64(dt))
    }

    pub fn step(&mut self) -> AdvanceResult {
        self.sim.step()
    }

    pub fn spawn_item(
        &mut self,
        cell: GridPosition,
        item_type: ItemTypeId,
    ) -> Result<ItemId, FactoryError> {
        Ok(self.sim.spawn_item(cell, item_type)?)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn items(&self) -> Vec<ItemSnapshot> {
        item_snapshots(&self.sim)
    }

    pub fn item_world_transform(&self, item: &ItemSnapshot) -> ItemTransform {
        item_transform(self.index.config(), item, self.item_height)
    }

    pub fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    pub fn network(&self) -> &BeltNetwork {
        &self.network
    }

    pub fn sim(&self) -> &TransportSim {
        &self.sim
    }

    /// Simulator access for pausing, presenters and event listeners.
    pub fn sim_mut(&mut self) -> &mut TransportSim {
        &mut self.sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPhase;
    use crate::test_utils::*;

    fn factory() -> Factory {
        Factory::new(quiet_config()).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = quiet_config();
        config.sim.tick_delta = 0.0;
        assert!(matches!(
            Factory::new(config),
            Err(FactoryError::Config(ConfigError::TickDeltaTooSmall(_)))
        ));
    }

    #[test]
    fn belt_placement_reaches_graph_and_sim() {
        let mut f = factory();
        assert_eq!(f.sim().phase(), SimPhase::Uninitialized);
        f.place(GridPosition::new(0, 0), TileKind::Single, Layer::Belt, Rotation::East)
            .unwrap();
        assert!(f.network().contains(GridPosition::new(0, 0)));
        assert!(f.sim().segment(GridPosition::new(0, 0)).is_some());
        assert_eq!(f.sim().phase(), SimPhase::Ready);
    }

    #[test]
    fn machine_placement_skips_graph() {
        let mut f = factory();
        f.place(GridPosition::new(0, 0), TileKind::Block2x2, Layer::Machine, Rotation::North)
            .unwrap();
        assert!(f.network().is_empty());
        assert_eq!(f.sim().segments().count(), 0);
    }

    #[test]
    fn spatial_errors_pass_through() {
        let mut f = Factory::new(FactoryConfig::default()).unwrap();
        let err = f
            .place(GridPosition::new(15, 0), TileKind::Line, Layer::Belt, Rotation::North)
            .unwrap_err();
        assert_eq!(
            err,
            FactoryError::Spatial(SpatialError::OutOfBounds {
                cell: GridPosition::new(16, 0)
            })
        );
        assert!(f.network().is_empty());
        assert!(matches!(
            f.remove(GridPosition::new(3, 3), Layer::Belt),
            Err(FactoryError::Spatial(SpatialError::NotFound(_)))
        ));
    }

    #[test]
    fn remove_at_cell_resolves_origin() {
        let mut f = factory();
        f.place(GridPosition::new(0, 0), TileKind::Line, Layer::Belt, Rotation::North)
            .unwrap();
        let id = f.spawn_item(GridPosition::new(0, 0), ore()).unwrap();

        let removed = f.remove_at_cell(GridPosition::new(1, 0), Layer::Belt).unwrap();
        assert_eq!(removed.origin, GridPosition::new(0, 0));
        assert!(f.network().is_empty());
        assert!(f.sim().item(id).is_none());
    }

    #[test]
    fn clear_layer_resyncs_belts() {
        let mut f = factory();
        for x in 0..3 {
            f.place(GridPosition::new(x, 0), TileKind::Single, Layer::Belt, Rotation::East)
                .unwrap();
        }
        f.spawn_item(GridPosition::new(1, 0), ore()).unwrap();
        f.place(GridPosition::new(0, 5), TileKind::Single, Layer::Decor, Rotation::North)
            .unwrap();

        f.clear_layer(Layer::Decor);
        assert_eq!(f.items().len(), 1);

        f.clear_layer(Layer::Belt);
        assert!(f.items().is_empty());
        assert!(f.network().is_empty());
    }

    #[test]
    fn world_transform_uses_item_height() {
        let mut f = factory();
        f.place(GridPosition::new(0, 0), TileKind::Single, Layer::Belt, Rotation::North)
            .unwrap();
        f.spawn_item(GridPosition::new(0, 0), ore()).unwrap();
        let snap = f.items().remove(0);
        let t = f.item_world_transform(&snap);
        assert_eq!(t.position.y, 0.1);
        assert_eq!(t.position.z, -0.5);
        assert_eq!(t.yaw_degrees, 0.0);
    }
}
