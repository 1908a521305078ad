//! Placement example: footprints, rotation, bounds and layers.
//!
//! Places each built-in tile kind at every rotation on an 8x8 grid and
//! prints the covered cells, then shows the errors for out-of-bounds and
//! overlapping placements.
//!
//! Run with: `cargo run -p foundry-examples --example placement`

use foundry_spatial::{
    GridConfig, GridPosition, Layer, OccupancyIndex, Rotation, TileKind, TileRegistry, WorldPoint,
};

fn main() {
    let grid = GridConfig {
        grid_width: 8,
        grid_height: 8,
        ..GridConfig::default()
    };
    let mut index = OccupancyIndex::new(grid, TileRegistry::with_defaults());
    let origin = GridPosition::new(4, 4);

    for kind in TileKind::all() {
        let mut rotation = Rotation::North;
        for _ in 0..4 {
            match index.place(origin, kind, Layer::Decor, rotation) {
                Ok(occupant) => {
                    println!("{kind:?} {rotation:?}: {:?}", occupant.cells);
                }
                Err(err) => println!("{kind:?} {rotation:?}: {err}"),
            }
            let _ = index.remove(origin, Layer::Decor);
            rotation = rotation.rotate_cw();
        }
    }

    // --- Bounds ---

    let edge = GridPosition::new(7, 7);
    match index.place(edge, TileKind::Block2x2, Layer::Machine, Rotation::North) {
        Ok(_) => println!("unexpected: 2x2 fits at the corner"),
        Err(err) => println!("2x2 at {edge:?}: {err}"),
    }

    // --- Overlap within a layer, not across layers ---

    index
        .place(GridPosition::new(1, 1), TileKind::Block2x2, Layer::Machine, Rotation::North)
        .expect("empty grid");
    let clash = index.place(GridPosition::new(2, 2), TileKind::Single, Layer::Machine, Rotation::North);
    println!("single on the machine at (2,2): {:?}", clash.map(|o| o.id));
    let belt = index.place(GridPosition::new(2, 2), TileKind::Single, Layer::Belt, Rotation::East);
    println!("belt under the machine at (2,2): ok = {}", belt.is_ok());

    // --- Coordinate mapping ---

    let world = index.config().grid_to_world_center(GridPosition::new(2, 2), 0.0);
    let back = index.config().world_to_grid(WorldPoint::new(world.x + 0.3, 0.0, world.z - 0.4));
    println!("cell (2,2) centre {world:?} maps back to {back:?}");
    let bounds = index.config().world_bounds(0.0);
    println!("grid covers {:?} around {:?}", bounds.size, bounds.center);
}
