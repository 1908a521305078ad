//! Belt loop example: a spawner feeding a closed ring of belts.
//!
//! Lays a 4x4 ring plus a feeder line, lets the periodic spawner fill it,
//! then cuts one belt and shows which items were lost. Item visuals are
//! tracked through a small `ItemPresenter` that just counts handles.
//!
//! Run with: `cargo run -p foundry-examples --example belt_loop`

use foundry_core::config::{FactoryConfig, SimConfig};
use foundry_core::event::{Event, EventKind};
use foundry_core::factory::Factory;
use foundry_core::fixed::{Fixed64, fixed64_to_f64};
use foundry_core::id::{ItemId, ItemTypeId, VisualHandle};
use foundry_core::transport::ItemPresenter;
use foundry_spatial::{GridConfig, GridPosition, Layer, Rotation, TileKind};
use std::cell::Cell;
use std::rc::Rc;

/// Hands out sequential handles and counts how many are alive.
struct CountingPresenter {
    next: u64,
    live: Rc<Cell<u64>>,
}

impl ItemPresenter for CountingPresenter {
    fn create(&mut self, _item: ItemId, _item_type: ItemTypeId) -> Option<VisualHandle> {
        self.next += 1;
        self.live.set(self.live.get() + 1);
        Some(VisualHandle(self.next))
    }

    fn destroy(&mut self, _item: ItemId, _handle: VisualHandle) {
        self.live.set(self.live.get() - 1);
    }
}

fn main() {
    let config = FactoryConfig {
        grid: GridConfig {
            grid_width: 12,
            grid_height: 12,
            ..GridConfig::default()
        },
        sim: SimConfig::default(),
        tiles: Vec::new(),
    };
    let mut factory = Factory::new(config).expect("default config is valid");

    let live_visuals = Rc::new(Cell::new(0));
    factory.sim_mut().set_presenter(Box::new(CountingPresenter {
        next: 0,
        live: Rc::clone(&live_visuals),
    }));

    let transfers = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&transfers);
    factory.sim_mut().on_passive(
        EventKind::ItemTransferred,
        Box::new(move |_| counter.set(counter.get() + 1)),
    );

    // Feeder from the west edge into the ring. The spawner always uses the
    // lowest (x, y) cell, which is the feeder's first belt.
    for x in 0..3 {
        factory
            .place(GridPosition::new(x, 4), TileKind::Single, Layer::Belt, Rotation::East)
            .expect("feeder cell is free");
    }

    // Ring: east along y=4, north up x=7, west along y=7, south down x=3.
    // Each corner takes the rotation of the run it starts.
    let ring = [
        ((3..7).map(|x| GridPosition::new(x, 4)).collect::<Vec<_>>(), Rotation::East),
        ((4..7).map(|y| GridPosition::new(7, y)).collect(), Rotation::North),
        ((4..8).rev().map(|x| GridPosition::new(x, 7)).collect(), Rotation::West),
        ((5..8).rev().map(|y| GridPosition::new(3, y)).collect(), Rotation::South),
    ];
    for (cells, rotation) in &ring {
        for &cell in cells {
            factory
                .place(cell, TileKind::Single, Layer::Belt, *rotation)
                .expect("ring cell is free");
        }
    }
    println!("laid {} belts", factory.network().len());

    // --- Run for five simulated seconds in uneven frames ---

    let frames = [0.016, 0.033, 0.016, 0.021];
    let mut elapsed = 0.0;
    let mut frame = 0;
    while elapsed < 5.0 {
        let dt = frames[frame % frames.len()];
        factory.advance_seconds(dt);
        elapsed += dt;
        frame += 1;
    }
    println!(
        "after {} ticks: {} items, {} visuals, {} transfers",
        factory.sim().tick(),
        factory.items().len(),
        live_visuals.get(),
        transfers.get()
    );

    for item in factory.items().iter().take(5) {
        let t = factory.item_world_transform(item);
        println!(
            "  {:?} on {:?} at {:.2} -> world ({:.2}, {:.2}, {:.2}) yaw {}",
            item.id,
            item.cell,
            fixed64_to_f64(item.position),
            t.position.x,
            t.position.y,
            t.position.z,
            t.yaw_degrees
        );
    }

    // --- Cut the ring ---

    let destroyed = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&destroyed);
    factory.sim_mut().on_passive(
        EventKind::ItemDestroyed,
        Box::new(move |event| {
            if let Event::ItemDestroyed { .. } = event {
                counter.set(counter.get() + 1);
            }
        }),
    );

    let cut = GridPosition::new(7, 6);
    let on_cut = factory.items().iter().filter(|s| s.cell == cut).count();
    factory.remove(cut, Layer::Belt).expect("belt exists");
    factory.sim_mut().deliver_events();
    println!(
        "removed belt at {:?}: {} items were on it, {} destroyed events, {} remain, {} visuals",
        cut,
        on_cut,
        destroyed.get(),
        factory.items().len(),
        live_visuals.get()
    );

    // Items upstream of the gap now park at the dead end.
    for _ in 0..100 {
        factory.step();
    }
    let parked = factory
        .items()
        .iter()
        .filter(|s| s.cell == GridPosition::new(7, 5) && s.position == Fixed64::ONE)
        .count();
    println!("after 100 more ticks, {parked} item parked at the gap");
}
